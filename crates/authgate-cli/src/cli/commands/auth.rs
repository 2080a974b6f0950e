//! Auth command handlers.
//!
//! `login` and `reset-password` host the auth screen in the terminal: notices
//! are printed, the password and the consent answer are read from stdin.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use authgate_core::backend::{IdentityBackend, SignOutScope, SupabaseBackend};
use authgate_core::config::Config;
use authgate_core::store::{FileSessionStore, SessionStore};
use authgate_screen::{
    AuthScreen, AuthViewMode, Notice, NoticeKind, Presenter, ScreenEvent, ScreenExit,
    ScreenSettings,
};

/// Prints notices as `Title: message` lines.
#[derive(Debug, Default)]
struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn show_notice(&mut self, notice: &Notice) {
        println!("{}: {}", notice.title, notice.message);
    }

    fn mode_changed(&mut self, mode: AuthViewMode) {
        if mode == AuthViewMode::Consent {
            println!("Consent to the privacy policy and terms of use is required.");
        }
    }
}

async fn mount(config: &Config) -> Result<AuthScreen> {
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::open_default());
    let backend = SupabaseBackend::from_config(&config.backend, Arc::clone(&store))
        .context("configure identity backend")?;
    let screen = AuthScreen::mount(
        Arc::new(backend),
        store,
        ScreenSettings::from_config(config),
        Box::new(TerminalPresenter),
    )
    .await;
    Ok(screen)
}

fn read_line(prompt: &str) -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn login(config: &Config, email: &str) -> Result<()> {
    let mut screen = mount(config).await?;
    // A restored session goes through the consent gate on mount.
    screen.settle().await;

    if screen.state().exit.is_none() && screen.state().mode == AuthViewMode::Login {
        let password = read_line("Password: ")?;
        screen.dispatch(ScreenEvent::EmailChanged(email.to_string()));
        screen.dispatch(ScreenEvent::PasswordChanged(password));
        screen.dispatch(ScreenEvent::SubmitLogin);
        screen.settle().await;
    }

    if screen.state().mode == AuthViewMode::Consent && screen.state().exit.is_none() {
        let answer = read_line("Accept and continue? [y/N] ")?;
        if answer.trim().eq_ignore_ascii_case("y") {
            screen.dispatch(ScreenEvent::AcceptConsent);
            screen.settle().await;
        }
    }

    let outcome = match &screen.state().exit {
        Some(ScreenExit::Redirected { user, routing }) => {
            let who = user.email.as_deref().unwrap_or(&user.id);
            println!("Signed in as {who}");
            if let Some(user_type) = routing.as_ref().and_then(|r| r.user_type.as_deref()) {
                println!("  User type: {user_type}");
            }
            Ok(())
        }
        None if screen.state().needs_consent => Err(anyhow::anyhow!("Consent was not given")),
        None => Err(anyhow::anyhow!("Login did not complete")),
    };
    screen.unmount();
    outcome
}

pub async fn reset_password(config: &Config, email: &str) -> Result<()> {
    let mut screen = mount(config).await?;
    screen.dispatch(ScreenEvent::EmailChanged(email.to_string()));
    screen.dispatch(ScreenEvent::SubmitPasswordReset);
    screen.settle().await;

    let sent = screen
        .state()
        .notices
        .iter()
        .any(|n| n.kind == NoticeKind::ResetEmailSent);
    screen.unmount();

    if sent {
        Ok(())
    } else {
        anyhow::bail!("Password reset failed")
    }
}

pub async fn logout(config: &Config, scope: SignOutScope) -> Result<()> {
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::open_default());
    let backend = SupabaseBackend::from_config(&config.backend, store)
        .context("configure identity backend")?;

    let signed_in = backend.current_user().await.is_some();
    backend.sign_out(scope).await.context("sign out")?;

    if signed_in {
        println!("Signed out ({} scope).", scope.as_str());
    } else {
        println!("Not signed in (no session found).");
    }
    Ok(())
}
