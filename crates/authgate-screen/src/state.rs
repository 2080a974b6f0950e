//! Screen state.
//!
//! ```text
//! ScreenState
//! ├── mode: AuthViewMode        (login | register | consent)
//! ├── credentials: Credentials  (form fields)
//! ├── submit: LatestOnly        (sign-in / reset in flight)
//! ├── gate: ConsentGate         (consent check + redirect per user)
//! ├── exit: Option<ScreenExit>  (set once the user is redirected)
//! ├── notices / diagnostics     (shown / recorded only)
//! └── settings: ScreenSettings
//! ```
//!
//! Only the reducer in [`crate::update`] mutates this.

use std::fmt;

use authgate_core::backend::{RoutingProfile, User};
use authgate_core::config::{Config, Locale};

use crate::notice::Notice;
use crate::request_id::LatestOnly;

/// Which auth view is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthViewMode {
    #[default]
    Login,
    Register,
    Consent,
}

/// Form fields. Lives only as long as the screen.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &password)
            .finish()
    }
}

/// Behaviour knobs taken from the `[consent]`, `[screen]` and `[session]`
/// config sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSettings {
    pub fail_open: bool,
    pub reset_on_sign_out: bool,
    pub locale: Locale,
    pub cleanup_markers: Vec<String>,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ScreenSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fail_open: config.consent.fail_open,
            reset_on_sign_out: config.screen.reset_on_sign_out,
            locale: config.screen.locale,
            cleanup_markers: config.session.cleanup_markers.clone(),
        }
    }
}

/// How the screen was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenExit {
    /// Authenticated and past the consent gate. `routing` is `None` when the
    /// routing fields could not be read.
    Redirected {
        user: User,
        routing: Option<RoutingProfile>,
    },
}

/// A failure that was recovered from and never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    CleanupFailed(String),
    SignOutIgnored(String),
    ConsentFetchFailed { user_id: String, message: String },
    RoutingFetchFailed { user_id: String, message: String },
}

/// Where the consent gate stands for a given user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GatePhase {
    #[default]
    Idle,
    Checking(String),
    AwaitingConsent(String),
    Redirecting(String),
    Redirected(String),
}

impl GatePhase {
    /// User the phase refers to, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            GatePhase::Idle => None,
            GatePhase::Checking(id)
            | GatePhase::AwaitingConsent(id)
            | GatePhase::Redirecting(id)
            | GatePhase::Redirected(id) => Some(id),
        }
    }
}

/// Consent check and redirect tracking. One request at a time; a newer
/// request (for another user) makes the older one stale.
#[derive(Debug, Default)]
pub struct ConsentGate {
    pub phase: GatePhase,
    pub request: LatestOnly,
}

impl ConsentGate {
    /// True if a check, a pending consent, a redirect or a finished redirect
    /// already covers `user_id`.
    pub fn covers(&self, user_id: &str) -> bool {
        self.phase.user_id() == Some(user_id)
    }

    pub fn reset(&mut self) {
        self.request.cancel();
        self.phase = GatePhase::Idle;
    }
}

/// Complete screen state.
#[derive(Debug, Default)]
pub struct ScreenState {
    pub mode: AuthViewMode,
    pub credentials: Credentials,
    /// Outstanding sign-in or password reset. Its presence is the in-flight flag.
    pub submit: LatestOnly,
    pub gate: ConsentGate,
    /// Authenticated user, once known.
    pub user: Option<User>,
    pub needs_consent: bool,
    pub exit: Option<ScreenExit>,
    /// Every notice surfaced, oldest first.
    pub notices: Vec<Notice>,
    pub diagnostics: Vec<Diagnostic>,
    pub settings: ScreenSettings,
}

impl ScreenState {
    pub fn new(settings: ScreenSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn request_in_flight(&self) -> bool {
        self.submit.has_active()
    }

    /// True while a submit, consent check or redirect has not reported back.
    pub fn has_pending_work(&self) -> bool {
        self.submit.has_active() || self.gate.request.has_active()
    }

    pub fn locale(&self) -> Locale {
        self.settings.locale
    }
}
