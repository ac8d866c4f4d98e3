use serde::{Deserialize, Serialize};

/// Sample rate every recording and transcription runs at, in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Opaque identity of a foreground window, captured when recording starts.
///
/// The numeric id and the class/title strings come from the platform focus
/// collaborator; the core never interprets the id, it only records and hands
/// it back. The class string drives delivery-method classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRef {
    /// Platform window identifier (HWND, X11 window id, pid, ...).
    pub id: u64,
    /// Window class or application identifier (e.g. "gnome-terminal", "code").
    pub app_class: String,
    /// Window title at capture time, for logging only.
    pub title: String,
}

impl WindowRef {
    pub fn new(id: u64, app_class: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            app_class: app_class.into(),
            title: title.into(),
        }
    }
}
