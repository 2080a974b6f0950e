//! Screen runtime: owns the state, runs the reducer, executes effects.
//!
//! ## Inbox Pattern
//!
//! - Handlers are spawned with `spawn_effect` and send their result
//!   `ScreenEvent` to `inbox_tx`
//! - The auth event subscription is read alongside the inbox
//! - `step` waits for whichever arrives first and feeds it to the reducer
//!
//! Results are posted only while the screen is mounted: `unmount` (or drop)
//! cancels the liveness token that every spawned handler checks before
//! sending.

mod handlers;
mod inbox;

use std::future::Future;
use std::sync::Arc;

use authgate_core::backend::{IdentityBackend, Subscription};
use authgate_core::store::SessionStore;
use inbox::{ScreenEventReceiver, ScreenEventSender};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::effects::ScreenEffect;
use crate::events::ScreenEvent;
use crate::notice::Notice;
use crate::state::{AuthViewMode, ScreenSettings, ScreenState};
use crate::update;

/// Host side of the screen: how notices and view changes reach the user.
pub trait Presenter: Send {
    fn show_notice(&mut self, notice: &Notice);

    fn mode_changed(&mut self, _mode: AuthViewMode) {}
}

/// A mounted auth screen.
pub struct AuthScreen {
    state: ScreenState,
    backend: Arc<dyn IdentityBackend>,
    store: Arc<dyn SessionStore>,
    presenter: Box<dyn Presenter>,
    inbox_tx: ScreenEventSender,
    inbox_rx: ScreenEventReceiver,
    subscription: Subscription,
    alive: CancellationToken,
}

impl AuthScreen {
    /// Mounts the screen: subscribes to auth events once, then checks for a
    /// restored session.
    pub async fn mount(
        backend: Arc<dyn IdentityBackend>,
        store: Arc<dyn SessionStore>,
        settings: ScreenSettings,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        let subscription = backend.on_auth_state_change();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let mut screen = Self {
            state: ScreenState::new(settings),
            backend,
            store,
            presenter,
            inbox_tx,
            inbox_rx,
            subscription,
            alive: CancellationToken::new(),
        };

        let restored = screen.backend.current_user().await;
        if let Some(user) = &restored {
            debug!(user_id = %user.id, "session restored");
        }
        screen.dispatch(ScreenEvent::Mounted { restored });
        screen
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Feeds one event through the reducer and executes its effects.
    pub fn dispatch(&mut self, event: ScreenEvent) {
        let mode = self.state.mode;
        let effects = update::update(&mut self.state, event);
        if self.state.mode != mode {
            debug!(from = ?mode, to = ?self.state.mode, "view mode changed");
            self.presenter.mode_changed(self.state.mode);
        }
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Waits for the next handler result or auth event and dispatches it.
    ///
    /// Returns false once the auth event stream is closed and no handler
    /// result is queued.
    pub async fn step(&mut self) -> bool {
        let event = tokio::select! {
            Some(event) = self.inbox_rx.recv() => event,
            auth = self.subscription.recv(), if self.subscription.is_active() => match auth {
                Some(auth) => ScreenEvent::Auth(auth),
                None => return self.drain_inbox(),
            },
            else => return false,
        };
        self.dispatch(event);
        true
    }

    /// Runs until no submit, consent check or redirect is outstanding, then
    /// dispatches anything already queued.
    pub async fn settle(&mut self) {
        loop {
            self.drain_ready();
            if !self.state.has_pending_work() {
                break;
            }
            if !self.step().await && !self.state.has_pending_work() {
                break;
            }
        }
    }

    /// Releases the auth event subscription and stops result delivery.
    pub fn unmount(self) {
        debug!("auth screen unmounted");
    }

    fn drain_inbox(&mut self) -> bool {
        let mut any = false;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.dispatch(event);
            any = true;
        }
        any
    }

    fn drain_ready(&mut self) {
        loop {
            let mut any = self.drain_inbox();
            while let Some(auth) = self.subscription.try_recv() {
                self.dispatch(ScreenEvent::Auth(auth));
                any = true;
            }
            if !any {
                break;
            }
        }
    }

    /// Spawns a handler and posts its result to the inbox if the screen is
    /// still mounted when it completes.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ScreenEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let alive = self.alive.clone();
        tokio::spawn(async move {
            let event = f().await;
            if alive.is_cancelled() {
                debug!("screen unmounted; dropping result");
                return;
            }
            let _ = tx.send(event);
        });
    }

    fn execute_effect(&mut self, effect: ScreenEffect) {
        match effect {
            ScreenEffect::SignIn {
                request,
                email,
                password,
            } => {
                let backend = Arc::clone(&self.backend);
                let store = Arc::clone(&self.store);
                let markers = self.state.settings.cleanup_markers.clone();
                self.spawn_effect(move || {
                    handlers::sign_in(backend, store, markers, request, email, password)
                });
            }
            ScreenEffect::ResetPassword { request, email } => {
                let backend = Arc::clone(&self.backend);
                self.spawn_effect(move || handlers::reset_password(backend, request, email));
            }
            ScreenEffect::CheckConsent { request, user } => {
                let backend = Arc::clone(&self.backend);
                self.spawn_effect(move || handlers::check_consent(backend, request, user));
            }
            ScreenEffect::Redirect { request, user } => {
                let backend = Arc::clone(&self.backend);
                self.spawn_effect(move || handlers::redirect(backend, request, user));
            }
            ScreenEffect::ShowNotice(notice) => {
                self.presenter.show_notice(&notice);
            }
        }
    }
}

impl Drop for AuthScreen {
    fn drop(&mut self) {
        self.alive.cancel();
        self.subscription.unsubscribe();
    }
}
