//! Events consumed by the reducer.
//!
//! Three sources feed the screen: user intents from the host, results of
//! effects spawned by the runtime, and the backend's auth event stream.

use authgate_core::backend::{AuthEvent, ConsentProfile, RoutingProfile, SignInFailure, User};

use crate::request_id::RequestId;
use crate::state::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// Screen attached. Carries the user of a restored session, if any.
    Mounted { restored: Option<User> },

    // User intents
    EmailChanged(String),
    PasswordChanged(String),
    SubmitLogin,
    SubmitPasswordReset,
    GoToRegister,
    BackToLogin,
    AcceptConsent,
    GuestAccess,

    // Effect results
    LoginFinished {
        request: RequestId,
        diagnostics: Vec<Diagnostic>,
        outcome: LoginOutcome,
    },
    ResetFinished {
        request: RequestId,
        result: Result<(), String>,
    },
    ConsentChecked {
        request: RequestId,
        user: User,
        result: Result<ConsentProfile, String>,
    },
    RedirectFinished {
        request: RequestId,
        user: User,
        result: Result<RoutingProfile, String>,
    },

    /// Pushed by the backend.
    Auth(AuthEvent),
}

/// How the sign-in sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn(User),
    Rejected(SignInFailure),
    /// The sequence panicked or was aborted.
    Unexpected(String),
}
