//! Identity backend data types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

/// Opaque token bundle. Only its presence matters to the screen.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expiry as unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &crate::logging::mask_token(&self.access_token))
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

/// Which sessions a sign-out revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Every session of the user, on every device.
    Global,
    /// Only the session held by this client.
    Local,
}

impl SignOutScope {
    pub fn as_str(self) -> &'static str {
        match self {
            SignOutScope::Global => "global",
            SignOutScope::Local => "local",
        }
    }
}

/// Session lifecycle notifications pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
    TokenRefreshed(User),
    UserUpdated(User),
    PasswordRecovery(User),
}

impl AuthEvent {
    /// Wire name used by the backend's client libraries.
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn(_) => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
            AuthEvent::UserUpdated(_) => "USER_UPDATED",
            AuthEvent::PasswordRecovery(_) => "PASSWORD_RECOVERY",
        }
    }
}

/// Row of the `profiles` table.
///
/// Every column is optional so one type serves both the consent and the
/// routing projections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub privacy_accepted: Option<bool>,
    pub terms_accepted: Option<bool>,
    pub user_type: Option<String>,
    pub admin_role: Option<String>,
    pub verification_status: Option<String>,
}

impl Profile {
    pub fn consent(&self) -> ConsentProfile {
        ConsentProfile {
            privacy_accepted: self.privacy_accepted.unwrap_or(false),
            terms_accepted: self.terms_accepted.unwrap_or(false),
        }
    }

    pub fn routing(&self) -> RoutingProfile {
        RoutingProfile {
            user_type: self.user_type.clone(),
            admin_role: self.admin_role.clone(),
            verification_status: self.verification_status.clone(),
        }
    }
}

/// Legal acceptance flags of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentProfile {
    pub privacy_accepted: bool,
    pub terms_accepted: bool,
}

impl ConsentProfile {
    pub fn is_satisfied(self) -> bool {
        self.privacy_accepted && self.terms_accepted
    }
}

/// Fields reserved for role-based navigation after sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingProfile {
    pub user_type: Option<String>,
    pub admin_role: Option<String>,
    pub verification_status: Option<String>,
}
