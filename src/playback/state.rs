//! Playback state machine.
//!
//! A source starts `Loaded` and moves to `Finished` once its input is
//! exhausted. `Finished` is terminal.

use std::fmt;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Frames may still be decoded
    #[default]
    Loaded,
    /// Input exhausted, no further frames
    Finished,
}

impl PlaybackState {
    pub fn is_finished(&self) -> bool {
        matches!(self, PlaybackState::Finished)
    }

    /// Host-facing name
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Loaded => "loaded",
            PlaybackState::Finished => "finished",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined status query: state plus aspect-corrected size and frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub state: PlaybackState,
    pub width: f64,
    pub height: f64,
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(PlaybackState::default(), PlaybackState::Loaded);
        assert!(!PlaybackState::Loaded.is_finished());
        assert!(PlaybackState::Finished.is_finished());
    }

    #[test]
    fn test_names() {
        assert_eq!(PlaybackState::Loaded.to_string(), "loaded");
        assert_eq!(PlaybackState::Finished.to_string(), "finished");
    }
}
