use tokio::sync::mpsc;

use crate::events::ScreenEvent;

/// Sender for the screen's event inbox.
pub type ScreenEventSender = mpsc::UnboundedSender<ScreenEvent>;

/// Receiver for the screen's event inbox.
pub type ScreenEventReceiver = mpsc::UnboundedReceiver<ScreenEvent>;
