//! The single typed event stream driving the session.
//!
//! Every callback in the system — hotkey press, overlay button, device
//! callback, timer, worker completion — becomes "enqueue an event"; only the
//! owner context's transition function consumes them.

use std::fmt;
use std::sync::Arc;

use whispertype_core::WhisperTypeError;
use whispertype_stt::TranscriptionService;

use crate::state::SessionState;

/// Events delivered through the dispatcher to the session orchestrator.
pub enum SessionEvent {
    /// The model loader worker finished successfully.
    ModelReady(Arc<dyn TranscriptionService>),
    /// The model loader worker failed.
    ModelLoadFailed(WhisperTypeError),
    /// Primary hotkey or overlay button: start when idle, stop when recording.
    Toggle,
    /// Overlay stop button: stop only.
    Stop,
    /// Escape or overlay cancel button: discard the recording.
    Cancel,
    /// Periodic silence check while recording.
    SilencePoll,
    /// Transcription worker finished. Ignored when `attempt` is stale.
    TranscriptionDone { attempt: u64, text: String },
    /// Transcription worker failed. Ignored when `attempt` is stale.
    TranscriptionFailed {
        attempt: u64,
        error: WhisperTypeError,
    },
    /// Deliver the transcript into the target window. Ignored when stale.
    Deliver { attempt: u64, text: String },
    /// Auto-dismiss a display state back to Idle.
    DisplayTimeout { from: SessionState },
    /// Second half of the cancel double-beep.
    CancelBeep,
    /// Stop the owner loop.
    Shutdown,
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::ModelReady(_) => write!(f, "ModelReady"),
            SessionEvent::ModelLoadFailed(e) => write!(f, "ModelLoadFailed({})", e),
            SessionEvent::Toggle => write!(f, "Toggle"),
            SessionEvent::Stop => write!(f, "Stop"),
            SessionEvent::Cancel => write!(f, "Cancel"),
            SessionEvent::SilencePoll => write!(f, "SilencePoll"),
            SessionEvent::TranscriptionDone { attempt, text } => {
                write!(f, "TranscriptionDone(attempt={}, len={})", attempt, text.len())
            }
            SessionEvent::TranscriptionFailed { attempt, error } => {
                write!(f, "TranscriptionFailed(attempt={}, {})", attempt, error)
            }
            SessionEvent::Deliver { attempt, text } => {
                write!(f, "Deliver(attempt={}, len={})", attempt, text.len())
            }
            SessionEvent::DisplayTimeout { from } => write!(f, "DisplayTimeout({})", from),
            SessionEvent::CancelBeep => write!(f, "CancelBeep"),
            SessionEvent::Shutdown => write!(f, "Shutdown"),
        }
    }
}
