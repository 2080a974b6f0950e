//! Pre-sign-in purge of stale session artifacts.
//!
//! Best effort: failures are logged and reported back, never returned as
//! errors, and never retried. A partial deletion is acceptable.

use tracing::{debug, warn};

use crate::store::SessionStore;

/// Key substrings selected for deletion when nothing else is configured.
pub const DEFAULT_MARKERS: &[&str] = &["supabase", "auth", "session"];

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Keys that were selected and handed to the batch delete.
    pub removed: Vec<String>,
    /// Failure description if listing or deleting failed.
    pub failure: Option<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failure.is_none()
    }
}

/// Returns true if `key` contains any of `markers` (case-sensitive).
pub fn is_session_artifact(key: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| !marker.is_empty() && key.contains(marker.as_str()))
}

/// Removes every key matching `markers` with a single batch delete.
///
/// Never fails: errors end up in [`CleanupReport::failure`].
pub async fn cleanup_session_artifacts(
    store: &dyn SessionStore,
    markers: &[String],
) -> CleanupReport {
    let keys = match store.keys().await {
        Ok(keys) => keys,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "session cleanup: failed to list keys");
            return CleanupReport {
                removed: Vec::new(),
                failure: Some(format!("{err:#}")),
            };
        }
    };

    let stale: Vec<String> = keys
        .into_iter()
        .filter(|key| is_session_artifact(key, markers))
        .collect();

    if stale.is_empty() {
        debug!("session cleanup: nothing to remove");
        return CleanupReport::default();
    }

    match store.remove_many(&stale).await {
        Ok(()) => {
            debug!(count = stale.len(), "session cleanup: removed stale keys");
            CleanupReport {
                removed: stale,
                failure: None,
            }
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "session cleanup: batch delete failed");
            CleanupReport {
                removed: stale,
                failure: Some(format!("{err:#}")),
            }
        }
    }
}
