//! Push channel for auth events.
//!
//! A [`Subscription`] is a scoped handle: it receives every event published
//! after it was created and detaches from the hub when dropped or when
//! [`Subscription::unsubscribe`] is called, whichever happens first.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::types::AuthEvent;

const EVENT_BUFFER: usize = 32;

/// Fan-out point for auth events.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<AuthEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Publishes to every live subscription. Without subscribers the event is dropped.
    pub fn publish(&self, event: AuthEvent) {
        debug!(event = event.name(), "auth event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Live registration on an [`EventHub`].
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<AuthEvent>>,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once unsubscribed or when
    /// the hub is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            let rx = self.rx.as_mut()?;
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Returns an already-queued event without waiting.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            let rx = self.rx.as_mut()?;
            match rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth event subscriber lagged");
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }

    /// Detaches from the hub. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if self.rx.take().is_some() {
            debug!("auth event subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
