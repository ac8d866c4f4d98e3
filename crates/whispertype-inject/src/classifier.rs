//! Window classification by class-name heuristics.
//!
//! The allow-lists are product tuning, not structure: they come from
//! configuration, seeded with the well-known terminal emulators and VS
//! Code-family shells.

use whispertype_core::config::InjectionConfig;
use whispertype_core::types::WindowRef;

use crate::WindowClass;

/// Classifies a delivery target into terminal / embedded shell / plain GUI
/// by substring match on the window class.
#[derive(Debug, Clone)]
pub struct WindowClassifier {
    terminal_classes: Vec<String>,
    shell_classes: Vec<String>,
}

impl Default for WindowClassifier {
    fn default() -> Self {
        Self::from_config(&InjectionConfig::default())
    }
}

impl WindowClassifier {
    pub fn from_config(config: &InjectionConfig) -> Self {
        Self {
            terminal_classes: config
                .terminal_classes
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            shell_classes: config
                .shell_classes
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, window: &WindowRef) -> WindowClass {
        let class = window.app_class.to_lowercase();
        if class.is_empty() {
            return WindowClass::PlainGui;
        }
        if self.terminal_classes.iter().any(|h| class.contains(h)) {
            return WindowClass::Terminal;
        }
        if self.shell_classes.iter().any(|h| class.contains(h)) {
            return WindowClass::EmbeddedShell;
        }
        WindowClass::PlainGui
    }
}
