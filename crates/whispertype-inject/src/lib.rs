//! Text-delivery decision engine and collaborator ports.
//!
//! Classifies the target window, plans the delivery method (direct character
//! synthesis vs. clipboard paste, with clipboard preservation), and executes
//! the plan through platform ports. Ports are trait seams with real adapters
//! (arboard, enigo, rodio, global-hotkey) and mock implementations for tests.

use whispertype_core::types::WindowRef;

pub mod adapters;
pub mod classifier;
pub mod delivery;
pub mod hotkey;
pub mod planner;
pub mod ports;

pub use classifier::WindowClassifier;
pub use delivery::TextDelivery;
pub use hotkey::HotkeyRegistry;
pub use planner::plan;
pub use ports::{ClipboardPort, FocusManager, HotkeyBackend, SoundPort, SyntheticInput};

/// Handle to the window that had focus when recording started.
///
/// Obtained from and handed back to the `FocusManager`; the session never
/// mutates the referenced window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusToken {
    pub window: WindowRef,
}

impl FocusToken {
    pub fn new(window: WindowRef) -> Self {
        Self { window }
    }
}

/// Classification of a delivery target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    /// A terminal emulator; paste shortcuts vary, so text is typed directly.
    Terminal,
    /// An embedded-browser shell (VS Code family); Ctrl+Shift+V pastes
    /// uniformly into editors and embedded terminal panes.
    EmbeddedShell,
    /// Any other GUI window with standard paste semantics.
    PlainGui,
}

/// How the transcript is delivered into the target window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    /// Character-by-character synthetic key events, no modifiers.
    DirectSynthesis,
    /// Standard paste (Ctrl/Cmd+V).
    ClipboardPaste,
    /// Shell paste (Ctrl/Cmd+Shift+V).
    ClipboardPasteAlt,
}

/// The chosen delivery method and clipboard policy for one injection.
///
/// Derived purely from the target-window classification; stateless,
/// recomputed per delivery, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub method: DeliveryMethod,
    pub preserve_clipboard: bool,
}

/// A key in a synthetic combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboKey {
    Control,
    Shift,
    Alt,
    Meta,
    Char(char),
}

/// An ordered synthetic key combination: modifiers pressed first, released
/// in reverse order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo(pub Vec<ComboKey>);

impl KeyCombo {
    /// Standard paste: Ctrl+V (mapped to Cmd+V by the macOS adapter).
    pub fn paste() -> Self {
        Self(vec![ComboKey::Control, ComboKey::Char('v')])
    }

    /// Shell paste: Ctrl+Shift+V.
    pub fn paste_alt() -> Self {
        Self(vec![ComboKey::Control, ComboKey::Shift, ComboKey::Char('v')])
    }
}
