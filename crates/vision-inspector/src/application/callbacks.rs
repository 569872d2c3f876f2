//! Observer callbacks registered on a session.

use std::fmt;
use std::sync::Arc;

use vision_core::StatusMessage;

/// Receives status notifications; `None` clears the displayed status.
pub type StatusCallback = Arc<dyn Fn(Option<&StatusMessage>) + Send + Sync>;
/// Receives streaming on/off transitions.
pub type StreamingCallback = Arc<dyn Fn(bool) + Send + Sync>;
/// Receives every raw payload the detector sends, before decoding.
pub type FrameCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// The observer set of a session.
///
/// The same type doubles as a partial update for
/// [`InspectorSession::update_callbacks`](crate::application::InspectorSession::update_callbacks):
/// only the callbacks that are `Some` replace the registered ones.
///
/// ```rust
/// use vision_inspector::application::SessionCallbacks;
///
/// let callbacks = SessionCallbacks::new()
///     .with_status(|status| println!("{status:?}"))
///     .with_streaming(|on| println!("streaming: {on}"));
/// assert!(callbacks.on_frame_received.is_none());
/// ```
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    pub on_status_change: Option<StatusCallback>,
    pub on_streaming_change: Option<StreamingCallback>,
    pub on_frame_received: Option<FrameCallback>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&StatusMessage>) + Send + Sync + 'static,
    {
        self.on_status_change = Some(Arc::new(f));
        self
    }

    pub fn with_streaming<F>(mut self, f: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.on_streaming_change = Some(Arc::new(f));
        self
    }

    pub fn with_frame<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_frame_received = Some(Arc::new(f));
        self
    }

    /// Shallow merge: every `Some` callback in `patch` replaces ours.
    pub fn merge(&mut self, patch: SessionCallbacks) {
        if let Some(cb) = patch.on_status_change {
            self.on_status_change = Some(cb);
        }
        if let Some(cb) = patch.on_streaming_change {
            self.on_streaming_change = Some(cb);
        }
        if let Some(cb) = patch.on_frame_received {
            self.on_frame_received = Some(cb);
        }
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_status_change", &self.on_status_change.is_some())
            .field("on_streaming_change", &self.on_streaming_change.is_some())
            .field("on_frame_received", &self.on_frame_received.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_merge_replaces_only_present_callbacks() {
        // Arrange
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_c = Arc::clone(&first);
        let second_c = Arc::clone(&second);
        let mut callbacks = SessionCallbacks::new()
            .with_streaming(move |_| {
                first_c.fetch_add(1, Ordering::SeqCst);
            })
            .with_frame(|_| {});

        // Act
        callbacks.merge(SessionCallbacks::new().with_streaming(move |_| {
            second_c.fetch_add(1, Ordering::SeqCst);
        }));
        (callbacks.on_streaming_change.as_ref().unwrap())(true);

        // Assert
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(callbacks.on_frame_received.is_some(), "untouched callback must survive");
    }

    #[test]
    fn test_debug_reports_presence_only() {
        let callbacks = SessionCallbacks::new().with_status(|_| {});
        let text = format!("{callbacks:?}");
        assert!(text.contains("on_status_change: true"));
        assert!(text.contains("on_frame_received: false"));
    }
}
