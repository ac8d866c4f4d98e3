//! Real microphone capture via cpal.
//!
//! Opens the default input device with its preferred configuration, then
//! downmixes/resamples in the callback to mono int16 at 16 kHz. The callback
//! runs on a device-driven thread; it only appends to the shared buffer and
//! refreshes the silence clock.

use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info};

use whispertype_core::error::Result;
use whispertype_core::types::SAMPLE_RATE;
use whispertype_core::WhisperTypeError;

use crate::{AudioCaptureService, AudioClip, CaptureShared};

/// Wrapper to make `cpal::Stream` storable in a `Send` service.
///
/// The stream handle is only ever stored (to keep capture alive) or dropped
/// (to stop it); the audio callbacks run on a separate OS thread managed by
/// cpal and share no mutable state with the handle.
struct SendStream(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for SendStream {}

/// Microphone capture backed by cpal.
pub struct CpalCapture {
    shared: CaptureShared,
    stream: Option<SendStream>,
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalCapture {
    pub fn new() -> Self {
        Self {
            shared: CaptureShared::new(SAMPLE_RATE),
            stream: None,
        }
    }

    fn open_stream(shared: CaptureShared) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| WhisperTypeError::Device("No input device available".into()))?;

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        // Use the device's preferred config; many devices reject arbitrary
        // sample rates, so conversion happens in the callback instead.
        let supported = device
            .default_input_config()
            .map_err(|e| WhisperTypeError::Device(format!("Failed to query device: {}", e)))?;

        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let device_rate = stream_config.sample_rate.0;
        let device_channels = stream_config.channels;
        info!(
            device = %device_name,
            sample_rate = device_rate,
            channels = device_channels,
            "Opening input stream"
        );

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let frame = convert_frame(data, device_channels, device_rate);
                    shared.ingest(&frame);
                },
                |err| {
                    tracing::error!(error = %err, "Input stream error");
                },
                None,
            )
            .map_err(|e| WhisperTypeError::Device(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| WhisperTypeError::Device(format!("Failed to start stream: {}", e)))?;

        Ok(stream)
    }
}

/// Downmix to mono, resample to 16 kHz, convert to int16.
fn convert_frame(data: &[f32], channels: u16, rate: u32) -> Vec<i16> {
    let mono: Vec<f32> = if channels > 1 {
        let ch = channels as usize;
        data.chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    } else {
        data.to_vec()
    };

    let resampled: Vec<f32> = if rate != SAMPLE_RATE && !mono.is_empty() {
        let ratio = rate as f64 / SAMPLE_RATE as f64;
        let out_len = (mono.len() as f64 / ratio).ceil() as usize;
        let mut out = Vec::with_capacity(out_len);
        for i in 0..out_len {
            let src = i as f64 * ratio;
            let idx0 = src.floor() as usize;
            let idx1 = (idx0 + 1).min(mono.len() - 1);
            let frac = (src - idx0 as f64) as f32;
            out.push(mono[idx0.min(mono.len() - 1)] * (1.0 - frac) + mono[idx1] * frac);
        }
        out
    } else {
        mono
    };

    resampled
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

impl AudioCaptureService for CpalCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(WhisperTypeError::Device("Capture already active".into()));
        }
        // Fresh buffer and clock for every recording.
        self.shared.begin();
        let stream = Self::open_stream(self.shared.clone())?;
        self.stream = Some(SendStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Option<AudioClip> {
        // Dropping the stream stops the device callbacks.
        if self.stream.take().is_none() {
            debug!("Stop requested but capture was not active");
        }
        self.shared.clock().reset();
        self.shared.take_clip()
    }

    fn silence_duration(&self) -> Duration {
        if self.stream.is_none() {
            return Duration::ZERO;
        }
        self.shared.clock().silence_duration()
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
