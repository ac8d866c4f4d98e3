//! Delivery-method decision table.

use crate::{DeliveryMethod, DeliveryPlan, WindowClass};

/// Choose how to deliver text into a window of the given class.
///
/// Terminals get direct character synthesis: paste shortcuts vary per
/// terminal and a Ctrl combination can be swallowed by a global keyboard
/// hook. Embedded-browser shells get Ctrl+Shift+V, which pastes into both
/// editor regions and embedded terminal panes. Everything else gets a
/// standard paste. Direct synthesis never touches the clipboard, so the
/// preserve policy only applies to the clipboard methods.
pub fn plan(class: WindowClass, preserve_clipboard: bool) -> DeliveryPlan {
    match class {
        WindowClass::Terminal => DeliveryPlan {
            method: DeliveryMethod::DirectSynthesis,
            preserve_clipboard: false,
        },
        WindowClass::EmbeddedShell => DeliveryPlan {
            method: DeliveryMethod::ClipboardPasteAlt,
            preserve_clipboard,
        },
        WindowClass::PlainGui => DeliveryPlan {
            method: DeliveryMethod::ClipboardPaste,
            preserve_clipboard,
        },
    }
}
