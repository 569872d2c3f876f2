//! Session lifecycle states.

use std::fmt;

/// Lifecycle state of a capture/stream session.
///
/// ```text
/// Idle ──start()──> Starting ──socket open──> Streaming
///  ^                   │                          │
///  └──── failure ──────┘                          │
///  └──────────────── stop() / socket close ───────┘
///
/// any state ──destroy()──> Destroyed (terminal)
/// ```
///
/// `Stopping` is only observable from inside the stop sequence itself (for
/// example from a streaming-change callback).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Streaming,
    Stopping,
    Destroyed,
}

impl SessionState {
    /// Returns `true` once `destroy()` has run; no transition leaves this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Destroyed)
    }

    /// Short lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Streaming => "streaming",
            SessionState::Stopping => "stopping",
            SessionState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_only_destroyed_is_terminal() {
        assert!(SessionState::Destroyed.is_terminal());
        for state in [
            SessionState::Idle,
            SessionState::Starting,
            SessionState::Streaming,
            SessionState::Stopping,
        ] {
            assert!(!state.is_terminal(), "{state} must not be terminal");
        }
    }

    #[test]
    fn test_display_uses_lowercase_name() {
        assert_eq!(SessionState::Streaming.to_string(), "streaming");
    }
}
