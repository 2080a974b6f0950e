use std::fmt;

use serde::Deserialize;

/// Error codes the backend returns for a failed password grant.
const INVALID_CREDENTIALS_CODE: &str = "invalid_credentials";
const EMAIL_NOT_CONFIRMED_CODE: &str = "email_not_confirmed";

/// Message fragments used when the backend omits a structured code.
const INVALID_CREDENTIALS_TEXT: &str = "Invalid login credentials";
const EMAIL_NOT_CONFIRMED_TEXT: &str = "Email not confirmed";

/// Structured error from the identity backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    /// Machine-readable code (`error_code`), when provided.
    pub code: Option<String>,
    /// One-line summary suitable for display.
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Builds an error from an HTTP error response.
    ///
    /// Understands both GoTrue shapes (`{code, error_code, msg}` and the
    /// OAuth-style `{error, error_description}`) and PostgREST's
    /// `{code, message}`.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct ErrorBody {
            error_code: Option<String>,
            msg: Option<String>,
            message: Option<String>,
            error: Option<String>,
            error_description: Option<String>,
        }

        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .msg
            .or(parsed.error_description)
            .or(parsed.message)
            .or_else(|| parsed.error.clone())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {}", body.trim())
                }
            });

        // OAuth-style bodies put the code in `error`.
        let code = parsed.error_code.or(match parsed.error.as_deref() {
            Some("invalid_grant") if message.contains(INVALID_CREDENTIALS_TEXT) => {
                Some(INVALID_CREDENTIALS_CODE.to_string())
            }
            _ => None,
        });

        Self {
            status: Some(status),
            code,
            message,
        }
    }

    /// Maps the error onto the sign-in failure categories.
    ///
    /// Structured codes win; message matching is the fallback for backends
    /// that only send text.
    pub fn classify(&self) -> SignInFailure {
        match self.code.as_deref() {
            Some(INVALID_CREDENTIALS_CODE) => return SignInFailure::InvalidCredentials,
            Some(EMAIL_NOT_CONFIRMED_CODE) => return SignInFailure::UnconfirmedEmail,
            _ => {}
        }

        if self.message.contains(INVALID_CREDENTIALS_TEXT) {
            SignInFailure::InvalidCredentials
        } else if self.message.contains(EMAIL_NOT_CONFIRMED_TEXT) {
            SignInFailure::UnconfirmedEmail
        } else {
            SignInFailure::Backend(self.message.clone())
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "Request timed out".to_string()
        } else if err.is_connect() {
            "Could not reach the server".to_string()
        } else {
            err.to_string()
        };
        Self {
            status: err.status().map(|s| s.as_u16()),
            code: None,
            message,
        }
    }
}

/// User-facing category of a failed password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInFailure {
    InvalidCredentials,
    UnconfirmedEmail,
    /// Any other failure; carries the backend message verbatim.
    Backend(String),
}
