//! Screen reducer.
//!
//! `update` is the only place state changes. It never awaits: anything that
//! talks to the backend is returned as a [`ScreenEffect`] for the runtime.

use authgate_core::backend::{AuthEvent, User};
use tracing::debug;

use crate::effects::ScreenEffect;
use crate::events::{LoginOutcome, ScreenEvent};
use crate::notice::Notice;
use crate::state::{AuthViewMode, Diagnostic, GatePhase, ScreenExit, ScreenState};

pub fn update(state: &mut ScreenState, event: ScreenEvent) -> Vec<ScreenEffect> {
    let locale = state.locale();
    match event {
        ScreenEvent::Mounted { restored } => match restored {
            Some(user) => start_consent_check(state, user),
            None => vec![],
        },

        ScreenEvent::EmailChanged(email) => {
            if !state.request_in_flight() {
                state.credentials.email = email;
            }
            vec![]
        }
        ScreenEvent::PasswordChanged(password) => {
            if !state.request_in_flight() {
                state.credentials.password = password;
            }
            vec![]
        }

        ScreenEvent::SubmitLogin => submit_login(state),
        ScreenEvent::SubmitPasswordReset => submit_password_reset(state),

        ScreenEvent::GoToRegister => {
            if state.mode == AuthViewMode::Login {
                state.mode = AuthViewMode::Register;
            }
            vec![]
        }
        ScreenEvent::BackToLogin => {
            if state.mode == AuthViewMode::Register {
                state.mode = AuthViewMode::Login;
            }
            vec![]
        }
        ScreenEvent::AcceptConsent => accept_consent(state),
        ScreenEvent::GuestAccess => notify(state, Notice::guest_access(locale)),

        ScreenEvent::LoginFinished {
            request,
            diagnostics,
            outcome,
        } => {
            if !state.submit.finish_if_active(request) {
                debug!(%request, "stale sign-in result ignored");
                return vec![];
            }
            state.diagnostics.extend(diagnostics);
            match outcome {
                LoginOutcome::SignedIn(user) => {
                    state.credentials.password.clear();
                    start_consent_check(state, user)
                }
                LoginOutcome::Rejected(failure) => {
                    notify(state, Notice::sign_in_failed(locale, &failure))
                }
                LoginOutcome::Unexpected(_) => notify(state, Notice::unexpected(locale)),
            }
        }

        ScreenEvent::ResetFinished { request, result } => {
            if !state.submit.finish_if_active(request) {
                debug!(%request, "stale password reset result ignored");
                return vec![];
            }
            let notice = match result {
                Ok(()) => Notice::reset_email_sent(locale),
                Err(message) => Notice::reset_failed(locale, message),
            };
            notify(state, notice)
        }

        ScreenEvent::ConsentChecked {
            request,
            user,
            result,
        } => {
            if !state.gate.request.finish_if_active(request) {
                debug!(%request, user_id = %user.id, "stale consent check ignored");
                return vec![];
            }
            let satisfied = match result {
                Ok(consent) => consent.is_satisfied(),
                Err(message) => {
                    state.diagnostics.push(Diagnostic::ConsentFetchFailed {
                        user_id: user.id.clone(),
                        message,
                    });
                    state.settings.fail_open
                }
            };
            if satisfied {
                start_redirect(state, user)
            } else {
                debug!(user_id = %user.id, "consent required");
                state.gate.phase = GatePhase::AwaitingConsent(user.id);
                state.needs_consent = true;
                state.mode = AuthViewMode::Consent;
                vec![]
            }
        }

        ScreenEvent::RedirectFinished {
            request,
            user,
            result,
        } => {
            if !state.gate.request.finish_if_active(request) {
                debug!(%request, user_id = %user.id, "stale redirect ignored");
                return vec![];
            }
            let routing = match result {
                Ok(routing) => Some(routing),
                Err(message) => {
                    state.diagnostics.push(Diagnostic::RoutingFetchFailed {
                        user_id: user.id.clone(),
                        message,
                    });
                    None
                }
            };
            state.gate.phase = GatePhase::Redirected(user.id.clone());
            state.exit = Some(ScreenExit::Redirected { user, routing });
            notify(state, Notice::success(locale))
        }

        ScreenEvent::Auth(event) => handle_auth_event(state, event),
    }
}

fn submit_login(state: &mut ScreenState) -> Vec<ScreenEffect> {
    if state.mode != AuthViewMode::Login {
        debug!(mode = ?state.mode, "sign-in ignored outside the login view");
        return vec![];
    }
    if state.request_in_flight() {
        debug!("sign-in already in flight");
        return vec![];
    }
    if !state.credentials.is_complete() {
        let notice = Notice::missing_credentials(state.locale());
        return notify(state, notice);
    }
    if matches!(state.gate.phase, GatePhase::Redirected(_)) {
        // A new sign-in goes through the gate again, even for the same user.
        state.gate.reset();
        state.exit = None;
    }
    let request = state.submit.begin();
    vec![ScreenEffect::SignIn {
        request,
        email: state.credentials.email.clone(),
        password: state.credentials.password.clone(),
    }]
}

fn submit_password_reset(state: &mut ScreenState) -> Vec<ScreenEffect> {
    if state.mode != AuthViewMode::Login {
        debug!(mode = ?state.mode, "password reset ignored outside the login view");
        return vec![];
    }
    if state.request_in_flight() {
        debug!("request already in flight");
        return vec![];
    }
    if state.credentials.email.is_empty() {
        let notice = Notice::missing_email(state.locale());
        return notify(state, notice);
    }
    let request = state.submit.begin();
    vec![ScreenEffect::ResetPassword {
        request,
        email: state.credentials.email.clone(),
    }]
}

fn accept_consent(state: &mut ScreenState) -> Vec<ScreenEffect> {
    if state.mode != AuthViewMode::Consent {
        return vec![];
    }
    let Some(user) = state.user.clone() else {
        return vec![];
    };
    if !matches!(state.gate.phase, GatePhase::AwaitingConsent(_)) {
        debug!("consent already accepted");
        return vec![];
    }
    state.needs_consent = false;
    start_redirect(state, user)
}

/// Starts the consent check unless the gate already handles this user.
fn start_consent_check(state: &mut ScreenState, user: User) -> Vec<ScreenEffect> {
    if state.gate.covers(&user.id) {
        debug!(user_id = %user.id, phase = ?state.gate.phase, "consent check coalesced");
        state.user = Some(user);
        return vec![];
    }
    let request = state.gate.request.begin();
    state.gate.phase = GatePhase::Checking(user.id.clone());
    state.user = Some(user.clone());
    vec![ScreenEffect::CheckConsent { request, user }]
}

fn start_redirect(state: &mut ScreenState, user: User) -> Vec<ScreenEffect> {
    let request = state.gate.request.begin();
    state.gate.phase = GatePhase::Redirecting(user.id.clone());
    vec![ScreenEffect::Redirect { request, user }]
}

fn handle_auth_event(state: &mut ScreenState, event: AuthEvent) -> Vec<ScreenEffect> {
    match event {
        AuthEvent::SignedIn(user) => start_consent_check(state, user),
        AuthEvent::SignedOut if state.settings.reset_on_sign_out => {
            debug!("signed out; returning to login");
            state.gate.reset();
            state.mode = AuthViewMode::Login;
            state.user = None;
            state.needs_consent = false;
            state.exit = None;
            vec![]
        }
        other => {
            debug!(event = other.name(), "auth event ignored");
            vec![]
        }
    }
}

fn notify(state: &mut ScreenState, notice: Notice) -> Vec<ScreenEffect> {
    state.notices.push(notice.clone());
    vec![ScreenEffect::ShowNotice(notice)]
}

#[cfg(test)]
mod tests {
    use authgate_core::backend::{ConsentProfile, RoutingProfile, SignInFailure};

    use super::*;
    use crate::notice::NoticeKind;
    use crate::request_id::{LatestOnly, RequestId};
    use crate::state::ScreenSettings;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: Some("user@test.io".to_string()),
            email_confirmed_at: None,
        }
    }

    fn filled_state() -> ScreenState {
        let mut state = ScreenState::new(ScreenSettings::default());
        update(&mut state, ScreenEvent::EmailChanged("user@test.io".into()));
        update(&mut state, ScreenEvent::PasswordChanged("correct".into()));
        state
    }

    fn sign_in_request(effects: &[ScreenEffect]) -> RequestId {
        match effects {
            [ScreenEffect::SignIn { request, .. }] => *request,
            other => panic!("expected SignIn, got {other:?}"),
        }
    }

    fn check_request(effects: &[ScreenEffect]) -> RequestId {
        match effects {
            [ScreenEffect::CheckConsent { request, .. }] => *request,
            other => panic!("expected CheckConsent, got {other:?}"),
        }
    }

    fn redirect_request(effects: &[ScreenEffect]) -> RequestId {
        match effects {
            [ScreenEffect::Redirect { request, .. }] => *request,
            other => panic!("expected Redirect, got {other:?}"),
        }
    }

    const ACCEPTED: ConsentProfile = ConsentProfile {
        privacy_accepted: true,
        terms_accepted: true,
    };

    #[test]
    fn test_submit_login_requires_both_fields() {
        for (email, password) in [("", ""), ("user@test.io", ""), ("", "correct")] {
            let mut state = ScreenState::new(ScreenSettings::default());
            update(&mut state, ScreenEvent::EmailChanged(email.into()));
            update(&mut state, ScreenEvent::PasswordChanged(password.into()));

            let effects = update(&mut state, ScreenEvent::SubmitLogin);

            assert!(matches!(
                effects.as_slice(),
                [ScreenEffect::ShowNotice(n)] if n.kind == NoticeKind::Validation
            ));
            assert!(!state.request_in_flight());
        }
    }

    #[test]
    fn test_submit_is_noop_while_in_flight() {
        let mut state = filled_state();
        let _ = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));

        assert!(update(&mut state, ScreenEvent::SubmitLogin).is_empty());
        assert!(update(&mut state, ScreenEvent::SubmitPasswordReset).is_empty());
        assert!(state.notices.is_empty());
    }

    #[test]
    fn test_submit_ignored_outside_login_view() {
        let mut state = filled_state();
        update(&mut state, ScreenEvent::GoToRegister);
        assert_eq!(state.mode, AuthViewMode::Register);

        assert!(update(&mut state, ScreenEvent::SubmitLogin).is_empty());
        assert!(update(&mut state, ScreenEvent::SubmitPasswordReset).is_empty());
        assert!(!state.request_in_flight());

        state.mode = AuthViewMode::Consent;
        assert!(update(&mut state, ScreenEvent::SubmitLogin).is_empty());
        assert!(!state.request_in_flight());
        assert!(state.notices.is_empty());
    }

    #[test]
    fn test_second_login_after_redirect_runs_gate_again() {
        let mut state = filled_state();
        let request = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));
        let check = check_request(&update(
            &mut state,
            ScreenEvent::LoginFinished {
                request,
                diagnostics: vec![],
                outcome: LoginOutcome::SignedIn(user("u1")),
            },
        ));
        let redirect = redirect_request(&update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request: check,
                user: user("u1"),
                result: Ok(ACCEPTED),
            },
        ));
        update(
            &mut state,
            ScreenEvent::RedirectFinished {
                request: redirect,
                user: user("u1"),
                result: Ok(RoutingProfile::default()),
            },
        );
        assert_eq!(state.gate.phase, GatePhase::Redirected("u1".into()));

        update(&mut state, ScreenEvent::PasswordChanged("correct".into()));
        let request = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));
        assert!(state.exit.is_none());
        let effects = update(
            &mut state,
            ScreenEvent::LoginFinished {
                request,
                diagnostics: vec![],
                outcome: LoginOutcome::SignedIn(user("u1")),
            },
        );

        let _ = check_request(&effects);
        assert_eq!(state.gate.phase, GatePhase::Checking("u1".into()));
    }

    #[test]
    fn test_field_edits_ignored_while_in_flight() {
        let mut state = filled_state();
        update(&mut state, ScreenEvent::SubmitLogin);
        update(&mut state, ScreenEvent::EmailChanged("other@test.io".into()));
        assert_eq!(state.credentials.email, "user@test.io");
    }

    #[test]
    fn test_rejected_login_clears_in_flight_and_keeps_mode() {
        let mut state = filled_state();
        let request = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));

        let effects = update(
            &mut state,
            ScreenEvent::LoginFinished {
                request,
                diagnostics: vec![],
                outcome: LoginOutcome::Rejected(SignInFailure::InvalidCredentials),
            },
        );

        assert!(matches!(
            effects.as_slice(),
            [ScreenEffect::ShowNotice(n)] if n.kind == NoticeKind::InvalidCredentials
        ));
        assert_eq!(state.mode, AuthViewMode::Login);
        assert!(!state.request_in_flight());
        assert_eq!(state.credentials.password, "correct");
    }

    #[test]
    fn test_unexpected_failure_clears_in_flight() {
        let mut state = filled_state();
        let request = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));

        update(
            &mut state,
            ScreenEvent::LoginFinished {
                request,
                diagnostics: vec![Diagnostic::CleanupFailed("disk".into())],
                outcome: LoginOutcome::Unexpected("panicked".into()),
            },
        );

        assert!(!state.request_in_flight());
        assert_eq!(state.notices[0].kind, NoticeKind::Unexpected);
        assert_eq!(state.diagnostics, [Diagnostic::CleanupFailed("disk".into())]);
    }

    #[test]
    fn test_stale_login_result_changes_nothing() {
        let mut state = filled_state();
        let _ = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));
        let mut other = LatestOnly::default();
        other.begin();
        let stale = other.begin();

        let effects = update(
            &mut state,
            ScreenEvent::LoginFinished {
                request: stale,
                diagnostics: vec![],
                outcome: LoginOutcome::SignedIn(user("u1")),
            },
        );

        assert!(effects.is_empty());
        assert!(state.request_in_flight());
        assert!(state.user.is_none());
    }

    #[test]
    fn test_successful_login_checks_consent_and_clears_password() {
        let mut state = filled_state();
        let request = sign_in_request(&update(&mut state, ScreenEvent::SubmitLogin));

        let effects = update(
            &mut state,
            ScreenEvent::LoginFinished {
                request,
                diagnostics: vec![],
                outcome: LoginOutcome::SignedIn(user("u1")),
            },
        );

        let _ = check_request(&effects);
        assert!(!state.request_in_flight());
        assert!(state.credentials.password.is_empty());
        assert_eq!(state.gate.phase, GatePhase::Checking("u1".into()));
    }

    #[test]
    fn test_consent_check_coalesces_for_same_user() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let first = update(&mut state, ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))));
        let request = check_request(&first);

        let second = update(&mut state, ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))));
        assert!(second.is_empty());

        let redirect = redirect_request(&update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Ok(ACCEPTED),
            },
        ));
        update(
            &mut state,
            ScreenEvent::RedirectFinished {
                request: redirect,
                user: user("u1"),
                result: Ok(RoutingProfile::default()),
            },
        );

        // A late SignedIn for the same user does not start over.
        assert!(
            update(&mut state, ScreenEvent::Auth(AuthEvent::SignedIn(user("u1")))).is_empty()
        );
        let successes = state
            .notices
            .iter()
            .filter(|n| n.kind == NoticeKind::Success)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_incomplete_consent_enters_consent_mode() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Mounted {
                restored: Some(user("u1")),
            },
        ));

        let effects = update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Ok(ConsentProfile {
                    privacy_accepted: false,
                    terms_accepted: true,
                }),
            },
        );

        assert!(effects.is_empty());
        assert_eq!(state.mode, AuthViewMode::Consent);
        assert!(state.needs_consent);
        assert!(state.exit.is_none());
    }

    #[test]
    fn test_accept_consent_redirects() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Mounted {
                restored: Some(user("u1")),
            },
        ));
        update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Ok(ConsentProfile::default()),
            },
        );

        let redirect = redirect_request(&update(&mut state, ScreenEvent::AcceptConsent));
        assert!(!state.needs_consent);
        // Double accept is a no-op.
        assert!(update(&mut state, ScreenEvent::AcceptConsent).is_empty());

        update(
            &mut state,
            ScreenEvent::RedirectFinished {
                request: redirect,
                user: user("u1"),
                result: Err("boom".into()),
            },
        );
        assert!(matches!(
            state.exit,
            Some(ScreenExit::Redirected { routing: None, .. })
        ));
        assert_eq!(state.notices.last().map(|n| n.kind), Some(NoticeKind::Success));
    }

    #[test]
    fn test_accept_consent_outside_consent_mode_is_ignored() {
        let mut state = ScreenState::new(ScreenSettings::default());
        assert!(update(&mut state, ScreenEvent::AcceptConsent).is_empty());
    }

    #[test]
    fn test_fetch_failure_fails_open_silently() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))),
        ));

        let effects = update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Err("connection refused".into()),
            },
        );

        let _ = redirect_request(&effects);
        assert!(state.notices.is_empty());
        assert_eq!(
            state.diagnostics,
            [Diagnostic::ConsentFetchFailed {
                user_id: "u1".into(),
                message: "connection refused".into(),
            }]
        );
    }

    #[test]
    fn test_fetch_failure_can_fail_closed() {
        let settings = ScreenSettings {
            fail_open: false,
            ..ScreenSettings::default()
        };
        let mut state = ScreenState::new(settings);
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))),
        ));

        let effects = update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Err("connection refused".into()),
            },
        );

        assert!(effects.is_empty());
        assert_eq!(state.mode, AuthViewMode::Consent);
    }

    #[test]
    fn test_view_navigation() {
        let mut state = ScreenState::new(ScreenSettings::default());
        update(&mut state, ScreenEvent::BackToLogin);
        assert_eq!(state.mode, AuthViewMode::Login);
        update(&mut state, ScreenEvent::GoToRegister);
        assert_eq!(state.mode, AuthViewMode::Register);
        update(&mut state, ScreenEvent::GoToRegister);
        assert_eq!(state.mode, AuthViewMode::Register);
        update(&mut state, ScreenEvent::BackToLogin);
        assert_eq!(state.mode, AuthViewMode::Login);
    }

    #[test]
    fn test_password_reset_flow() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let effects = update(&mut state, ScreenEvent::SubmitPasswordReset);
        assert!(matches!(
            effects.as_slice(),
            [ScreenEffect::ShowNotice(n)] if n.kind == NoticeKind::Validation
        ));

        update(&mut state, ScreenEvent::EmailChanged("user@test.io".into()));
        let request = match update(&mut state, ScreenEvent::SubmitPasswordReset).as_slice() {
            [ScreenEffect::ResetPassword { request, email }] => {
                assert_eq!(email, "user@test.io");
                *request
            }
            other => panic!("expected ResetPassword, got {other:?}"),
        };
        assert!(state.request_in_flight());

        update(
            &mut state,
            ScreenEvent::ResetFinished {
                request,
                result: Err("email rate limit exceeded".into()),
            },
        );
        assert!(!state.request_in_flight());
        let last = state.notices.last().cloned();
        assert_eq!(last.map(|n| n.message).as_deref(), Some("email rate limit exceeded"));
    }

    #[test]
    fn test_signed_out_keeps_mode_by_default() {
        let mut state = ScreenState::new(ScreenSettings::default());
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))),
        ));
        update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Ok(ConsentProfile::default()),
            },
        );

        update(&mut state, ScreenEvent::Auth(AuthEvent::SignedOut));
        assert_eq!(state.mode, AuthViewMode::Consent);
    }

    #[test]
    fn test_signed_out_can_reset_to_login() {
        let settings = ScreenSettings {
            reset_on_sign_out: true,
            ..ScreenSettings::default()
        };
        let mut state = ScreenState::new(settings);
        let request = check_request(&update(
            &mut state,
            ScreenEvent::Auth(AuthEvent::SignedIn(user("u1"))),
        ));

        update(&mut state, ScreenEvent::Auth(AuthEvent::SignedOut));
        assert_eq!(state.mode, AuthViewMode::Login);
        assert!(state.user.is_none());

        // The check that was running is now stale.
        let effects = update(
            &mut state,
            ScreenEvent::ConsentChecked {
                request,
                user: user("u1"),
                result: Ok(ACCEPTED),
            },
        );
        assert!(effects.is_empty());
        assert!(state.exit.is_none());
    }

    #[test]
    fn test_guest_access_shows_notice() {
        let mut state = ScreenState::new(ScreenSettings::default());
        update(&mut state, ScreenEvent::GuestAccess);
        assert_eq!(state.notices[0].kind, NoticeKind::GuestAccess);
    }
}
