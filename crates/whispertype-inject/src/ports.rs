//! Collaborator ports for platform-specific primitives.
//!
//! Each port is a trait seam; one concrete variant is selected at startup by
//! platform detection, and the planner/orchestrator depend only on the
//! traits. Mock implementations record every call for tests.

use std::sync::{Arc, Mutex};

use whispertype_core::error::Result;
use whispertype_core::types::WindowRef;

use crate::{FocusToken, KeyCombo};

/// The system clipboard: a single global resource. Only one save/restore
/// cycle may be outstanding at a time.
pub trait ClipboardPort: Send {
    /// Current clipboard text, or `None` if unreadable or non-text.
    fn read(&mut self) -> Option<String>;

    fn write(&mut self, text: &str) -> Result<()>;
}

/// Low-level keyboard synthesis.
pub trait SyntheticInput: Send {
    /// Release every modifier currently reported as held, so a stuck
    /// modifier from the hotkey chord cannot corrupt the injected combo.
    fn release_modifiers(&mut self) -> Result<()>;

    fn send_key_combo(&mut self, combo: &KeyCombo) -> Result<()>;

    /// Type text character-by-character as unicode key events.
    fn type_unicode(&mut self, text: &str) -> Result<()>;
}

/// Save and restore the focused window across a recording.
pub trait FocusManager: Send {
    /// Capture the currently focused window, if the platform allows it.
    fn save(&mut self) -> Option<FocusToken>;

    /// Re-activate the saved window. `false` if the token is stale/closed.
    fn restore(&mut self, token: &FocusToken) -> bool;
}

/// Audio feedback tones. Fire-and-forget; failures are ignored by contract.
pub trait SoundPort: Send {
    fn beep(&self, frequency_hz: u32, duration_ms: u64);
}

/// Raw global-hotkey registration. `HotkeyRegistry` layers combo
/// deduplication on top of this.
pub trait HotkeyBackend: Send {
    /// Register a combo; returns an opaque binding id.
    fn register(&mut self, combo: &str, suppress: bool) -> Result<u32>;

    fn unregister(&mut self, id: u32);
}

// =============================================================================
// Mocks
// =============================================================================

/// Mock clipboard sharing its contents across clones, so tests can observe
/// the value after a delivery cycle.
#[derive(Debug, Clone, Default)]
pub struct MockClipboard {
    contents: Arc<Mutex<Option<String>>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(text: &str) -> Self {
        let clipboard = Self::new();
        *clipboard.contents.lock().unwrap() = Some(text.to_string());
        clipboard
    }

    /// Make every subsequent `read` fail, as if the clipboard held non-text.
    pub fn fail_reads(&self) {
        *self.fail_reads.lock().unwrap() = true;
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl ClipboardPort for MockClipboard {
    fn read(&mut self) -> Option<String> {
        if *self.fail_reads.lock().unwrap() {
            return None;
        }
        self.contents.lock().unwrap().clone()
    }

    fn write(&mut self, text: &str) -> Result<()> {
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// One recorded synthetic-input call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    ReleasedModifiers,
    Combo(KeyCombo),
    Typed(String),
}

/// Mock keyboard synthesis recording every call in order.
#[derive(Debug, Clone, Default)]
pub struct MockInput {
    actions: Arc<Mutex<Vec<InputAction>>>,
}

impl MockInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<InputAction> {
        self.actions.lock().unwrap().clone()
    }
}

impl SyntheticInput for MockInput {
    fn release_modifiers(&mut self) -> Result<()> {
        self.actions
            .lock()
            .unwrap()
            .push(InputAction::ReleasedModifiers);
        Ok(())
    }

    fn send_key_combo(&mut self, combo: &KeyCombo) -> Result<()> {
        self.actions
            .lock()
            .unwrap()
            .push(InputAction::Combo(combo.clone()));
        Ok(())
    }

    fn type_unicode(&mut self, text: &str) -> Result<()> {
        self.actions
            .lock()
            .unwrap()
            .push(InputAction::Typed(text.to_string()));
        Ok(())
    }
}

/// Mock focus manager handing out a scripted window and counting restores.
#[derive(Debug, Clone)]
pub struct MockFocus {
    window: Arc<Mutex<Option<WindowRef>>>,
    restored: Arc<Mutex<Vec<FocusToken>>>,
    restore_succeeds: Arc<Mutex<bool>>,
}

impl Default for MockFocus {
    fn default() -> Self {
        Self::focused_on(WindowRef::new(1, "gedit", "untitled"))
    }
}

impl MockFocus {
    /// Focus manager that reports `window` as the foreground window.
    pub fn focused_on(window: WindowRef) -> Self {
        Self {
            window: Arc::new(Mutex::new(Some(window))),
            restored: Arc::new(Mutex::new(Vec::new())),
            restore_succeeds: Arc::new(Mutex::new(true)),
        }
    }

    /// Focus manager with no capturable window.
    pub fn unavailable() -> Self {
        Self {
            window: Arc::new(Mutex::new(None)),
            restored: Arc::new(Mutex::new(Vec::new())),
            restore_succeeds: Arc::new(Mutex::new(true)),
        }
    }

    pub fn set_restore_succeeds(&self, succeeds: bool) {
        *self.restore_succeeds.lock().unwrap() = succeeds;
    }

    pub fn restored_tokens(&self) -> Vec<FocusToken> {
        self.restored.lock().unwrap().clone()
    }
}

impl FocusManager for MockFocus {
    fn save(&mut self) -> Option<FocusToken> {
        self.window.lock().unwrap().clone().map(FocusToken::new)
    }

    fn restore(&mut self, token: &FocusToken) -> bool {
        self.restored.lock().unwrap().push(token.clone());
        *self.restore_succeeds.lock().unwrap()
    }
}

/// Mock sound port recording `(frequency, duration)` pairs.
#[derive(Debug, Clone, Default)]
pub struct MockSound {
    beeps: Arc<Mutex<Vec<(u32, u64)>>>,
}

impl MockSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beeps(&self) -> Vec<(u32, u64)> {
        self.beeps.lock().unwrap().clone()
    }
}

impl SoundPort for MockSound {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) {
        self.beeps.lock().unwrap().push((frequency_hz, duration_ms));
    }
}

/// Mock hotkey backend tracking live bindings.
#[derive(Debug, Clone, Default)]
pub struct MockHotkeyBackend {
    inner: Arc<Mutex<MockHotkeyState>>,
}

#[derive(Debug, Default)]
struct MockHotkeyState {
    next_id: u32,
    active: Vec<(u32, String)>,
}

impl MockHotkeyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combos currently registered, in registration order.
    pub fn active_combos(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .active
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }
}

impl HotkeyBackend for MockHotkeyBackend {
    fn register(&mut self, combo: &str, _suppress: bool) -> Result<u32> {
        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.active.push((id, combo.to_string()));
        Ok(id)
    }

    fn unregister(&mut self, id: u32) {
        let mut state = self.inner.lock().unwrap();
        state.active.retain(|(bound, _)| *bound != id);
    }
}
