//! Request ids for matching async completions against the request that
//! issued them.

use std::fmt;

/// Opaque id handed to a spawned operation and echoed back in its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks at most one outstanding request; completions for anything else
/// are stale.
#[derive(Debug, Default)]
pub struct LatestOnly {
    next: u64,
    active: Option<RequestId>,
}

impl LatestOnly {
    /// Issues a fresh id and makes it the outstanding one.
    pub fn begin(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next += 1;
        self.active = Some(id);
        id
    }

    /// Forgets the outstanding request. Its completion will be ignored.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self, id: RequestId) -> bool {
        self.active == Some(id)
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Clears the outstanding request if `id` is it. Returns false for stale ids.
    pub fn finish_if_active(&mut self, id: RequestId) -> bool {
        if self.is_active(id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut tracker = LatestOnly::default();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!tracker.finish_if_active(first));
        assert!(tracker.has_active());
        assert!(tracker.finish_if_active(second));
        assert!(!tracker.has_active());
    }

    #[test]
    fn test_finish_is_single_shot() {
        let mut tracker = LatestOnly::default();
        let id = tracker.begin();
        assert!(tracker.finish_if_active(id));
        assert!(!tracker.finish_if_active(id));
    }

    #[test]
    fn test_display_is_short_tag() {
        let mut tracker = LatestOnly::default();
        tracker.begin();
        assert_eq!(tracker.begin().to_string(), "#1");
    }

    #[test]
    fn test_cancel_makes_result_stale() {
        let mut tracker = LatestOnly::default();
        let id = tracker.begin();
        tracker.cancel();
        assert!(!tracker.is_active(id));
        assert!(!tracker.finish_if_active(id));
    }
}
