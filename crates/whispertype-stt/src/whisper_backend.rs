//! Real transcription via whisper-rs (whisper.cpp bindings).
//!
//! Compiled only with the `whisper` feature. Loads a GGML model file and runs
//! CPU inference; calls are blocking and must stay on a worker context.

use std::path::Path;

use whispertype_audio::AudioClip;
use whispertype_core::error::Result;
use whispertype_core::WhisperTypeError;

use crate::{ModelSpec, TranscriptionService};

/// Transcription service backed by whisper.cpp.
///
/// Holds a loaded model context reused across transcription calls.
pub struct WhisperTranscriber {
    ctx: whisper_rs::WhisperContext,
}

impl WhisperTranscriber {
    /// Load the GGML model named by `spec`.
    pub fn load(spec: &ModelSpec) -> Result<Self> {
        use whisper_rs::{WhisperContext, WhisperContextParameters};

        let model_id = spec.model_id();
        if !Path::new(model_id).exists() {
            return Err(WhisperTypeError::ModelLoad(format!(
                "Model file not found: {}",
                model_id
            )));
        }

        tracing::info!(model = %model_id, compute_type = %spec.compute_type, "Loading Whisper model");

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_id, params)
            .map_err(|e| WhisperTypeError::ModelLoad(format!("Failed to load model: {}", e)))?;

        tracing::info!("Whisper model loaded");
        Ok(Self { ctx })
    }
}

impl TranscriptionService for WhisperTranscriber {
    fn transcribe(
        &self,
        clip: &AudioClip,
        language: Option<&str>,
        initial_prompt: Option<&str>,
    ) -> Result<String> {
        use whisper_rs::{FullParams, SamplingStrategy};

        if clip.samples.is_empty() {
            return Err(WhisperTypeError::Transcribe(
                "Cannot transcribe empty audio".into(),
            ));
        }

        let samples = clip.to_f32();
        tracing::debug!(
            samples = samples.len(),
            duration_secs = clip.duration_secs(),
            "Starting transcription"
        );

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| WhisperTypeError::Transcribe(format!("Failed to create state: {}", e)))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(language);
        if let Some(prompt) = initial_prompt {
            params.set_initial_prompt(prompt);
        }
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| WhisperTypeError::Transcribe(format!("Inference failed: {}", e)))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| WhisperTypeError::Transcribe(format!("Segment query failed: {}", e)))?;

        let mut parts = Vec::with_capacity(n_segments as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| WhisperTypeError::Transcribe(format!("Segment read failed: {}", e)))?;
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }

        Ok(parts.join(" "))
    }
}
