//! Speech-to-text model loading and transcription.
//!
//! Provides a blocking, object-safe transcription trait so the session
//! orchestrator can hand work to a dedicated worker context, plus a mock
//! implementation for testing and for builds without the `whisper` feature.

use std::sync::Arc;

use whispertype_core::config::ModelConfig;
use whispertype_core::error::Result;
use whispertype_core::WhisperTypeError;
use whispertype_audio::AudioClip;

#[cfg(feature = "whisper")]
mod whisper_backend;

#[cfg(feature = "whisper")]
pub use whisper_backend::WhisperTranscriber;

/// What to load: a named model or an explicit file path, plus a compute hint.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub model: String,
    pub model_path: Option<String>,
    pub compute_type: String,
}

impl ModelSpec {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            model: config.model.clone(),
            model_path: config.model_path.clone(),
            compute_type: config.compute_type.clone(),
        }
    }

    /// The identifier handed to the backend: explicit path wins over name.
    pub fn model_id(&self) -> &str {
        self.model_path.as_deref().unwrap_or(&self.model)
    }
}

/// Service for transcribing a finished recording to text.
///
/// Calls are blocking and may take seconds; they must run on a worker
/// context, never on the session owner context. An empty transcript is a
/// normal `Ok` outcome, not an error.
pub trait TranscriptionService: Send + Sync {
    fn transcribe(
        &self,
        clip: &AudioClip,
        language: Option<&str>,
        initial_prompt: Option<&str>,
    ) -> Result<String>;
}

/// Load the transcription model described by `spec`.
///
/// Blocking (model files are large); run on a worker context. Without the
/// `whisper` feature this returns a mock so the rest of the system stays
/// exercisable.
pub fn load_model(spec: &ModelSpec) -> Result<Arc<dyn TranscriptionService>> {
    #[cfg(feature = "whisper")]
    {
        let service = WhisperTranscriber::load(spec)?;
        Ok(Arc::new(service))
    }
    #[cfg(not(feature = "whisper"))]
    {
        tracing::warn!(
            model = %spec.model_id(),
            "Built without the 'whisper' feature; using mock transcription"
        );
        Ok(Arc::new(MockTranscriber::fixed("[mock transcription]")))
    }
}

/// Mock transcription service driven by a closure.
///
/// Covers the success, empty-transcript, and failure paths in tests.
pub struct MockTranscriber {
    respond: Box<dyn Fn(&AudioClip) -> Result<String> + Send + Sync>,
}

impl MockTranscriber {
    pub fn new(respond: impl Fn(&AudioClip) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
        }
    }

    /// Always returns the given text.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fails with a transcription error.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(WhisperTypeError::Transcribe(message.clone())))
    }
}

impl TranscriptionService for MockTranscriber {
    fn transcribe(
        &self,
        clip: &AudioClip,
        _language: Option<&str>,
        _initial_prompt: Option<&str>,
    ) -> Result<String> {
        if clip.samples.is_empty() {
            return Err(WhisperTypeError::Transcribe(
                "Cannot transcribe empty audio".to_string(),
            ));
        }
        (self.respond)(clip)
    }
}

// =============================================================================
// Tests
// =============================================================================
