use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for WhisperType.
///
/// Loaded from `<config dir>/whispertype/config.toml` by default. Each
/// section corresponds to one subsystem. Unknown keys are ignored and missing
/// keys fall back to defaults, so old config files keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhisperTypeConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub injection: InjectionConfig,
    #[serde(default)]
    pub hotkey: HotkeyConfig,
}

impl WhisperTypeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WhisperTypeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Default config file location: `<config dir>/whispertype/config.toml`.
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}

/// Per-user configuration directory for WhisperType.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("whispertype")
}

/// Transcription model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name (e.g. "base", "small").
    pub model: String,
    /// Explicit model file path. Overrides `model` when set.
    pub model_path: Option<String>,
    /// Compute profile hint for the backend (e.g. "int8").
    pub compute_type: String,
    /// Transcription language code; empty means auto-detect.
    pub language: String,
    /// Optional prompt fed to the model before the audio.
    pub initial_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            model_path: None,
            compute_type: "int8".to_string(),
            language: "en".to_string(),
            initial_prompt: None,
        }
    }
}

/// Recording and silence-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Seconds of continuous silence after which recording auto-stops.
    /// Zero disables the auto-stop.
    pub silence_timeout_secs: f32,
    /// Play start/stop/cancel beeps.
    pub sound_feedback: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            silence_timeout_secs: 1.0,
            sound_feedback: true,
        }
    }
}

/// Text-delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Prepend a space to the transcript before injecting it.
    pub prepend_space: bool,
    /// Save and restore the clipboard around clipboard-based delivery.
    pub preserve_clipboard: bool,
    /// Window-class substrings classified as terminals.
    pub terminal_classes: Vec<String>,
    /// Window-class substrings classified as embedded-browser shells.
    pub shell_classes: Vec<String>,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            prepend_space: true,
            preserve_clipboard: true,
            terminal_classes: vec![
                "gnome-terminal".to_string(),
                "konsole".to_string(),
                "xterm".to_string(),
                "urxvt".to_string(),
                "alacritty".to_string(),
                "kitty".to_string(),
                "terminator".to_string(),
                "tilix".to_string(),
                "sakura".to_string(),
                "xfce4-terminal".to_string(),
                "mate-terminal".to_string(),
                "lxterminal".to_string(),
                "wezterm".to_string(),
                "foot".to_string(),
            ],
            shell_classes: vec![
                "code".to_string(),
                "vscodium".to_string(),
                "cursor".to_string(),
            ],
        }
    }
}

/// Global-hotkey settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Key combo that toggles recording (e.g. "ctrl+shift+space").
    pub combo: String,
    /// Suppress the combo so it does not reach the focused application.
    pub suppress: bool,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            combo: "ctrl+shift+space".to_string(),
            suppress: true,
        }
    }
}

/// Last-known overlay window position, persisted in a sidecar file so config
/// edits and window drags never clobber each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPosition {
    pub x: i32,
    pub y: i32,
}

impl OverlayPosition {
    /// Default sidecar location: `<config dir>/whispertype/overlay_position.toml`.
    pub fn default_path() -> PathBuf {
        config_dir().join("overlay_position.toml")
    }

    /// Load the saved position, if any.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    /// Persist the position.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }
}
