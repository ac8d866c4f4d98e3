//! Real port implementations.
//!
//! Clipboard via arboard, keyboard synthesis via enigo, feedback tones via
//! rodio, global hotkeys via global-hotkey. Focus save/restore has no
//! portable implementation, so a null adapter stands in on platforms without
//! one; the orchestrator degrades to plain-GUI delivery when no focus token
//! is available.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use whispertype_core::error::Result;
use whispertype_core::WhisperTypeError;

use crate::ports::{ClipboardPort, FocusManager, HotkeyBackend, SoundPort, SyntheticInput};
use crate::{ComboKey, FocusToken, KeyCombo};

// =============================================================================
// Clipboard (arboard)
// =============================================================================

pub struct ArboardClipboard {
    inner: arboard::Clipboard,
}

impl ArboardClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| WhisperTypeError::Inject(format!("Clipboard unavailable: {}", e)))?;
        Ok(Self { inner })
    }
}

impl ClipboardPort for ArboardClipboard {
    fn read(&mut self) -> Option<String> {
        self.inner.get_text().ok()
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| WhisperTypeError::Inject(format!("Clipboard write failed: {}", e)))
    }
}

// =============================================================================
// Keyboard synthesis (enigo)
// =============================================================================

pub struct EnigoInput {
    enigo: enigo::Enigo,
}

impl EnigoInput {
    pub fn new() -> Result<Self> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| WhisperTypeError::Inject(format!("Input synthesis unavailable: {}", e)))?;
        Ok(Self { enigo })
    }

    fn map_key(key: ComboKey) -> enigo::Key {
        // The primary modifier is Cmd on macOS, Ctrl elsewhere.
        match key {
            #[cfg(target_os = "macos")]
            ComboKey::Control => enigo::Key::Meta,
            #[cfg(not(target_os = "macos"))]
            ComboKey::Control => enigo::Key::Control,
            ComboKey::Shift => enigo::Key::Shift,
            ComboKey::Alt => enigo::Key::Alt,
            ComboKey::Meta => enigo::Key::Meta,
            ComboKey::Char(c) => enigo::Key::Unicode(c),
        }
    }

    fn key(&mut self, key: enigo::Key, direction: enigo::Direction) -> Result<()> {
        use enigo::Keyboard;
        self.enigo
            .key(key, direction)
            .map_err(|e| WhisperTypeError::Inject(format!("Key event failed: {}", e)))
    }
}

impl SyntheticInput for EnigoInput {
    fn release_modifiers(&mut self) -> Result<()> {
        use enigo::Direction;
        for key in [
            enigo::Key::Control,
            enigo::Key::Shift,
            enigo::Key::Alt,
            enigo::Key::Meta,
        ] {
            self.key(key, Direction::Release)?;
        }
        Ok(())
    }

    fn send_key_combo(&mut self, combo: &KeyCombo) -> Result<()> {
        use enigo::Direction;
        let keys: Vec<enigo::Key> = combo.0.iter().map(|&k| Self::map_key(k)).collect();
        for &key in &keys {
            self.key(key, Direction::Press)?;
        }
        for &key in keys.iter().rev() {
            self.key(key, Direction::Release)?;
        }
        Ok(())
    }

    fn type_unicode(&mut self, text: &str) -> Result<()> {
        use enigo::Keyboard;
        self.enigo
            .text(text)
            .map_err(|e| WhisperTypeError::Inject(format!("Text synthesis failed: {}", e)))
    }
}

// =============================================================================
// Feedback tones (rodio)
// =============================================================================

/// Sine-wave beeps on the default output device.
///
/// Each beep plays on a detached thread; playback failures are discarded by
/// contract, not by accident.
#[derive(Debug, Clone, Default)]
pub struct RodioSound;

impl RodioSound {
    pub fn new() -> Self {
        Self
    }
}

impl SoundPort for RodioSound {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) {
        std::thread::spawn(move || {
            use rodio::source::{SineWave, Source};

            let Ok((_stream, handle)) = rodio::OutputStream::try_default() else {
                return;
            };
            let Ok(sink) = rodio::Sink::try_new(&handle) else {
                return;
            };
            let source = SineWave::new(frequency_hz as f32)
                .take_duration(Duration::from_millis(duration_ms))
                .amplify(0.2);
            sink.append(source);
            sink.sleep_until_end();
        });
    }
}

// =============================================================================
// Global hotkeys (global-hotkey)
// =============================================================================

/// Hotkey backend over the `global-hotkey` crate.
///
/// Binding ids are the crate's hotkey ids, so the app's event poll loop can
/// map `GlobalHotKeyEvent::id` back to a combo via the registry.
pub struct GlobalHotkeyBackend {
    manager: global_hotkey::GlobalHotKeyManager,
    hotkeys: HashMap<u32, global_hotkey::hotkey::HotKey>,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self> {
        let manager = global_hotkey::GlobalHotKeyManager::new()
            .map_err(|e| WhisperTypeError::Hotkey(format!("Hotkey manager failed: {}", e)))?;
        Ok(Self {
            manager,
            hotkeys: HashMap::new(),
        })
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&mut self, combo: &str, suppress: bool) -> Result<u32> {
        use std::str::FromStr;

        let hotkey = global_hotkey::hotkey::HotKey::from_str(combo)
            .map_err(|e| WhisperTypeError::Hotkey(format!("Bad combo '{}': {}", combo, e)))?;

        self.manager
            .register(hotkey)
            .map_err(|e| WhisperTypeError::Hotkey(format!("Register '{}' failed: {}", combo, e)))?;

        if !suppress {
            // global-hotkey always consumes the chord; nothing to do either way,
            // but record the intent for debugging.
            debug!(combo, "Suppression off requested; backend suppresses regardless");
        }

        let id = hotkey.id();
        self.hotkeys.insert(id, hotkey);
        Ok(id)
    }

    fn unregister(&mut self, id: u32) {
        if let Some(hotkey) = self.hotkeys.remove(&id) {
            if let Err(e) = self.manager.unregister(hotkey) {
                warn!(error = %e, "Hotkey unregister failed");
            }
        }
    }
}

// =============================================================================
// Focus (null adapter)
// =============================================================================

/// Focus manager for platforms without a save/restore implementation.
///
/// Reports no capturable window, so deliveries fall back to plain-GUI
/// classification of an unknown target.
#[derive(Debug, Default)]
pub struct NullFocusManager {
    warned: bool,
}

impl NullFocusManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FocusManager for NullFocusManager {
    fn save(&mut self) -> Option<FocusToken> {
        if !self.warned {
            warn!("No focus manager on this platform; target windows will not be re-activated");
            self.warned = true;
        }
        None
    }

    fn restore(&mut self, _token: &FocusToken) -> bool {
        false
    }
}
