//! Session state machine with validated transitions.
//!
//! The machine cycles forever; there is no terminal state. Exactly one
//! session exists process-wide, created at startup and reused across
//! recordings:
//! - Loading -> Idle (model ready) or Error (model load failed)
//! - Idle -> Recording (hotkey/button) or Error (device failure)
//! - Recording -> Transcribing (stop with audio), TooShort (stop without),
//!   or Idle (cancel)
//! - Transcribing -> Preview (text), Idle (empty text), or Error
//! - Error / TooShort / Preview -> Idle (display timeout)

use std::fmt;

/// Lifecycle state of the dictation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The transcription model is still loading; hotkeys are not live yet.
    Loading,
    /// Ready to start a recording.
    Idle,
    /// Microphone stream open, frames accumulating.
    Recording,
    /// A worker is transcribing the captured audio.
    Transcribing,
    /// An error display; auto-returns to Idle.
    Error,
    /// The recording was too short to transcribe; auto-returns to Idle.
    TooShort,
    /// Showing the injected text; auto-returns to Idle.
    Preview,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Loading => "Loading",
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Transcribing => "Transcribing",
            SessionState::Error => "Error",
            SessionState::TooShort => "TooShort",
            SessionState::Preview => "Preview",
        };
        write!(f, "{}", name)
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Loading, Idle)
                | (Loading, Error)
                | (Idle, Recording)
                | (Idle, Error)
                | (Recording, Transcribing)
                | (Recording, TooShort)
                | (Recording, Idle)
                | (Transcribing, Preview)
                | (Transcribing, Idle)
                | (Transcribing, Error)
                | (Error, Idle)
                | (TooShort, Idle)
                | (Preview, Idle)
        )
    }

    /// Whether this is a transient display state that auto-dismisses.
    pub fn is_display(&self) -> bool {
        matches!(
            self,
            SessionState::Error | SessionState::TooShort | SessionState::Preview
        )
    }
}
