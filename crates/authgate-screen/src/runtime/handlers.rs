//! Effect handlers.
//!
//! Pure async functions that talk to the backend and return the
//! [`ScreenEvent`] describing the result. They never touch screen state.

use std::sync::Arc;

use authgate_core::backend::{IdentityBackend, SignOutScope, User};
use authgate_core::cleanup::cleanup_session_artifacts;
use authgate_core::store::SessionStore;
use tracing::{debug, info, warn};

use crate::events::{LoginOutcome, ScreenEvent};
use crate::request_id::RequestId;
use crate::state::Diagnostic;

/// Runs the sign-in sequence on its own task so a panic anywhere inside it
/// comes back as [`LoginOutcome::Unexpected`].
pub async fn sign_in(
    backend: Arc<dyn IdentityBackend>,
    store: Arc<dyn SessionStore>,
    markers: Vec<String>,
    request: RequestId,
    email: String,
    password: String,
) -> ScreenEvent {
    let sequence = tokio::spawn(sign_in_sequence(backend, store, markers, email, password));
    let (diagnostics, outcome) = match sequence.await {
        Ok(done) => done,
        Err(err) => {
            warn!(%request, error = %err, "sign-in sequence aborted");
            (Vec::new(), LoginOutcome::Unexpected(err.to_string()))
        }
    };
    ScreenEvent::LoginFinished {
        request,
        diagnostics,
        outcome,
    }
}

/// Cleanup, then global sign-out, then password sign-in. Strictly in that order.
async fn sign_in_sequence(
    backend: Arc<dyn IdentityBackend>,
    store: Arc<dyn SessionStore>,
    markers: Vec<String>,
    email: String,
    password: String,
) -> (Vec<Diagnostic>, LoginOutcome) {
    let mut diagnostics = Vec::new();

    let report = cleanup_session_artifacts(store.as_ref(), &markers).await;
    if let Some(failure) = report.failure {
        diagnostics.push(Diagnostic::CleanupFailed(failure));
    }

    if let Err(err) = backend.sign_out(SignOutScope::Global).await {
        debug!(error = %err, "pre-sign-in sign-out failed; ignoring");
        diagnostics.push(Diagnostic::SignOutIgnored(err.to_string()));
    }

    let outcome = match backend.sign_in_with_password(&email, &password).await {
        Ok(auth) => LoginOutcome::SignedIn(auth.user),
        Err(err) => {
            info!(email = %email, error = %err, "sign-in rejected");
            LoginOutcome::Rejected(err.classify())
        }
    };
    (diagnostics, outcome)
}

pub async fn reset_password(
    backend: Arc<dyn IdentityBackend>,
    request: RequestId,
    email: String,
) -> ScreenEvent {
    let result = backend
        .reset_password_for_email(&email)
        .await
        .map_err(|err| err.to_string());
    if let Err(message) = &result {
        info!(email = %email, error = %message, "password reset failed");
    }
    ScreenEvent::ResetFinished { request, result }
}

pub async fn check_consent(
    backend: Arc<dyn IdentityBackend>,
    request: RequestId,
    user: User,
) -> ScreenEvent {
    let result = match backend.fetch_profile(&user.id).await {
        Ok(profile) => Ok(profile.consent()),
        Err(err) => {
            warn!(
                %request,
                user_id = %user.id,
                error = %err,
                "consent profile fetch failed"
            );
            Err(err.to_string())
        }
    };
    ScreenEvent::ConsentChecked {
        request,
        user,
        result,
    }
}

pub async fn redirect(
    backend: Arc<dyn IdentityBackend>,
    request: RequestId,
    user: User,
) -> ScreenEvent {
    let result = match backend.fetch_profile(&user.id).await {
        Ok(profile) => Ok(profile.routing()),
        Err(err) => {
            warn!(
                %request,
                user_id = %user.id,
                error = %err,
                "routing profile fetch failed"
            );
            Err(err.to_string())
        }
    };
    ScreenEvent::RedirectFinished {
        request,
        user,
        result,
    }
}
