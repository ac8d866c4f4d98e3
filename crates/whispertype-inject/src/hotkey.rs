//! Global-hotkey registry with per-combo deduplication.
//!
//! The registry is exclusively owned by the session owner context and is
//! always emptied-then-repopulated around a text injection, so the injected
//! paste shortcut can neither re-trigger the dictation hotkey nor be
//! swallowed by the hotkey hook.

use std::collections::HashMap;

use tracing::debug;

use whispertype_core::error::Result;

use crate::ports::HotkeyBackend;

/// Combo-keyed registry over a raw hotkey backend.
///
/// Registering a combo that is already bound replaces the old binding, so a
/// combo never fires twice no matter how often it is re-registered.
pub struct HotkeyRegistry {
    backend: Box<dyn HotkeyBackend>,
    bindings: HashMap<String, u32>,
}

impl HotkeyRegistry {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            bindings: HashMap::new(),
        }
    }

    /// Register `combo`, replacing any existing binding for it.
    pub fn register(&mut self, combo: &str, suppress: bool) -> Result<()> {
        if let Some(old) = self.bindings.remove(combo) {
            self.backend.unregister(old);
        }
        let id = self.backend.register(combo, suppress)?;
        self.bindings.insert(combo.to_string(), id);
        debug!(combo, suppress, "Hotkey registered");
        Ok(())
    }

    /// Remove every registered binding.
    pub fn unregister_all(&mut self) {
        for (combo, id) in self.bindings.drain() {
            self.backend.unregister(id);
            debug!(combo = %combo, "Hotkey unregistered");
        }
    }

    /// The combo bound to a backend binding id, if any.
    pub fn combo_for(&self, id: u32) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, bound)| **bound == id)
            .map(|(combo, _)| combo.as_str())
    }

    pub fn is_registered(&self, combo: &str) -> bool {
        self.bindings.contains_key(combo)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Drop for HotkeyRegistry {
    fn drop(&mut self) {
        self.unregister_all();
    }
}
