use thiserror::Error;

/// Top-level error type for WhisperType.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates return
/// this type directly so the `?` operator works seamlessly across crate
/// boundaries. Worker-context failures are never allowed to cross into shared
/// state as errors; they are converted to session events carrying one of
/// these variants.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WhisperTypeError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Microphone unavailable or busy. Surfaced immediately, never retried.
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// A recording finished but no transcription model is loaded.
    #[error("No transcription model is loaded")]
    ModelNotReady,

    #[error("Transcription error: {0}")]
    Transcribe(String),

    #[error("Injection error: {0}")]
    Inject(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for WhisperTypeError {
    fn from(err: toml::de::Error) -> Self {
        WhisperTypeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for WhisperTypeError {
    fn from(err: toml::ser::Error) -> Self {
        WhisperTypeError::Config(err.to_string())
    }
}

/// A specialized `Result` type for WhisperType operations.
pub type Result<T> = std::result::Result<T, WhisperTypeError>;
