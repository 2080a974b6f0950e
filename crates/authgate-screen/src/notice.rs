//! User-facing notices (title + message) and their wording.

use authgate_core::backend::SignInFailure;
use authgate_core::config::Locale;

/// Category of a notice. Hosts may style or route notices by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    InvalidCredentials,
    UnconfirmedEmail,
    /// Any other backend failure. The message is the backend's, verbatim.
    ConnectionError,
    ResetEmailSent,
    Success,
    Unexpected,
    GuestAccess,
}

/// A modal-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn missing_credentials(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => ("Error", "Please fill in all fields"),
            Locale::Fr => ("Erreur", "Veuillez remplir tous les champs"),
        };
        Self::new(NoticeKind::Validation, title, message)
    }

    pub fn missing_email(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => (
                "Email required",
                "Please enter your email to reset your password",
            ),
            Locale::Fr => (
                "Email requis",
                "Veuillez entrer votre email pour réinitialiser votre mot de passe",
            ),
        };
        Self::new(NoticeKind::Validation, title, message)
    }

    /// Notice for a rejected sign-in.
    pub fn sign_in_failed(locale: Locale, failure: &SignInFailure) -> Self {
        let title = match locale {
            Locale::En => "Login error",
            Locale::Fr => "Erreur de connexion",
        };
        match failure {
            SignInFailure::InvalidCredentials => {
                let message = match locale {
                    Locale::En => "Incorrect email or password",
                    Locale::Fr => "Email ou mot de passe incorrect",
                };
                Self::new(NoticeKind::InvalidCredentials, title, message)
            }
            SignInFailure::UnconfirmedEmail => {
                let (title, message) = match locale {
                    Locale::En => (
                        "Email not confirmed",
                        "Please check your email and click the confirmation link",
                    ),
                    Locale::Fr => (
                        "Email non confirmé",
                        "Veuillez vérifier votre email et cliquer sur le lien de confirmation",
                    ),
                };
                Self::new(NoticeKind::UnconfirmedEmail, title, message)
            }
            SignInFailure::Backend(message) => {
                Self::new(NoticeKind::ConnectionError, title, message.clone())
            }
        }
    }

    pub fn reset_failed(locale: Locale, message: impl Into<String>) -> Self {
        let title = match locale {
            Locale::En => "Error",
            Locale::Fr => "Erreur",
        };
        Self::new(NoticeKind::ConnectionError, title, message)
    }

    pub fn reset_email_sent(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => ("Email sent", "Check your inbox to reset your password"),
            Locale::Fr => (
                "Email envoyé",
                "Vérifiez votre boîte mail pour réinitialiser votre mot de passe",
            ),
        };
        Self::new(NoticeKind::ResetEmailSent, title, message)
    }

    pub fn success(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => ("Success", "Login successful! Welcome!"),
            Locale::Fr => ("Connexion réussie", "Bienvenue !"),
        };
        Self::new(NoticeKind::Success, title, message)
    }

    pub fn unexpected(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => ("Error", "An unexpected error occurred"),
            Locale::Fr => ("Erreur", "Une erreur inattendue s'est produite"),
        };
        Self::new(NoticeKind::Unexpected, title, message)
    }

    pub fn guest_access(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => (
                "Guest mode",
                "Not available yet: choosing a user type without an account is coming soon",
            ),
            Locale::Fr => (
                "Mode Invité",
                "Fonctionnalité à venir : sélection du type d'utilisateur sans compte",
            ),
        };
        Self::new(NoticeKind::GuestAccess, title, message)
    }
}
