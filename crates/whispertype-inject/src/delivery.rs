//! Delivery-plan execution.
//!
//! Runs one injection: release held modifiers, then either type the text
//! directly or paste it via the clipboard, preserving the previous clipboard
//! contents when asked. Injection is best-effort by contract; every failure
//! is logged and swallowed at this boundary because the session has already
//! delivered the text as far as it is concerned.

use std::time::Duration;

use tracing::{debug, warn};

use whispertype_core::error::Result;

use crate::ports::{ClipboardPort, SyntheticInput};
use crate::{DeliveryMethod, DeliveryPlan, KeyCombo};

/// Delay between clipboard writes and key events, letting the target app
/// observe the new contents.
const SETTLE: Duration = Duration::from_millis(50);

/// Delay before restoring the saved clipboard, so the paste has landed.
const RESTORE_DELAY: Duration = Duration::from_millis(200);

/// Executes delivery plans through the clipboard and synthetic-input ports.
pub struct TextDelivery {
    clipboard: Box<dyn ClipboardPort>,
    input: Box<dyn SyntheticInput>,
    settle: Duration,
    restore_delay: Duration,
}

impl TextDelivery {
    pub fn new(clipboard: Box<dyn ClipboardPort>, input: Box<dyn SyntheticInput>) -> Self {
        Self {
            clipboard,
            input,
            settle: SETTLE,
            restore_delay: RESTORE_DELAY,
        }
    }

    /// Remove the settle delays; tests only.
    pub fn without_delays(mut self) -> Self {
        self.settle = Duration::ZERO;
        self.restore_delay = Duration::ZERO;
        self
    }

    /// Execute `plan` for `text`. Failures are logged, never propagated.
    pub fn deliver(&mut self, plan: DeliveryPlan, text: &str) {
        if let Err(e) = self.execute(plan, text) {
            warn!(error = %e, method = ?plan.method, "Text delivery failed");
        }
    }

    fn execute(&mut self, plan: DeliveryPlan, text: &str) -> Result<()> {
        debug!(method = ?plan.method, chars = text.chars().count(), "Delivering text");

        // A modifier still held from the hotkey chord would corrupt the
        // synthetic combo or the typed characters.
        self.input.release_modifiers()?;

        match plan.method {
            DeliveryMethod::DirectSynthesis => {
                self.input.type_unicode(text)?;
            }
            DeliveryMethod::ClipboardPaste | DeliveryMethod::ClipboardPasteAlt => {
                // A failed read leaves nothing meaningful to restore.
                let saved = if plan.preserve_clipboard {
                    self.clipboard.read()
                } else {
                    None
                };

                self.clipboard.write(text)?;
                sleep(self.settle);

                let combo = match plan.method {
                    DeliveryMethod::ClipboardPasteAlt => KeyCombo::paste_alt(),
                    _ => KeyCombo::paste(),
                };
                self.input.send_key_combo(&combo)?;
                sleep(self.settle);

                if let Some(previous) = saved {
                    sleep(self.restore_delay);
                    self.clipboard.write(&previous)?;
                }
            }
        }
        Ok(())
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

// =============================================================================
// Tests
// =============================================================================
