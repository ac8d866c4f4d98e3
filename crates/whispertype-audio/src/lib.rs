//! Microphone capture, recording buffer, and RMS silence detection.
//!
//! The capture service owns the input stream and buffers int16 mono frames at
//! 16 kHz. A rolling silence clock tracks the last frame whose RMS amplitude
//! reached the voice threshold; the orchestrator polls it at a fixed cadence
//! instead of being woken on every audio frame. Includes a mock
//! implementation for testing without real audio hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use whispertype_core::error::Result;
use whispertype_core::types::SAMPLE_RATE;

mod cpal_capture;

pub use cpal_capture::CpalCapture;

/// RMS amplitude (int16 scale) below which a frame counts as silence.
pub const SILENCE_RMS_THRESHOLD: f32 = 300.0;

/// Recordings shorter than this are discarded as accidental taps.
pub const MIN_RECORDING_SECS: f32 = 0.3;

/// Root-mean-square amplitude of an int16 frame.
pub fn rms(frame: &[i16]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / frame.len() as f64).sqrt() as f32
}

/// Monotonic clock tracking the last frame that contained voice.
///
/// Cloning shares the underlying clock, so the audio callback thread and the
/// polling side observe the same value. Only meaningful while a stream is
/// active; `silence_duration` is zero when inactive.
#[derive(Debug, Clone, Default)]
pub struct SilenceClock {
    last_voice: Arc<Mutex<Option<Instant>>>,
}

impl SilenceClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the clock at the start of a recording.
    pub fn start(&self) {
        *self.last_voice.lock().expect("silence clock poisoned") = Some(Instant::now());
    }

    /// Refresh the clock; called on every frame at or above the threshold.
    pub fn mark_voice(&self) {
        let mut guard = self.last_voice.lock().expect("silence clock poisoned");
        if guard.is_some() {
            *guard = Some(Instant::now());
        }
    }

    /// Disarm the clock when the stream stops.
    pub fn reset(&self) {
        *self.last_voice.lock().expect("silence clock poisoned") = None;
    }

    /// Elapsed time since the last voice frame, or zero while inactive.
    pub fn silence_duration(&self) -> Duration {
        self.last_voice
            .lock()
            .expect("silence clock poisoned")
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

/// A finished recording: int16 mono samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Normalize to f32 in [-1.0, 1.0] for the transcription model.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}

/// Append-only frame buffer for one recording.
///
/// Recreated on every `start`, never reused across recordings. `finish`
/// concatenates all frames once; recordings below `MIN_RECORDING_SECS` are
/// discarded so the model is never invoked on sub-frame audio.
#[derive(Debug)]
pub struct RecordingBuffer {
    frames: Vec<Vec<i16>>,
    sample_rate: u32,
}

impl RecordingBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: Vec::new(),
            sample_rate,
        }
    }

    pub fn push_frame(&mut self, frame: &[i16]) {
        self.frames.push(frame.to_vec());
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Concatenate all frames into a clip, or `None` if the recording was
    /// empty or too short to be meaningful.
    pub fn finish(self) -> Option<AudioClip> {
        if self.frames.is_empty() {
            return None;
        }
        let total: usize = self.frames.iter().map(|f| f.len()).sum();
        let duration = total as f32 / self.sample_rate as f32;
        if duration < MIN_RECORDING_SECS {
            tracing::debug!(duration_secs = duration, "Recording too short, discarding");
            return None;
        }
        let mut samples = Vec::with_capacity(total);
        for frame in &self.frames {
            samples.extend_from_slice(frame);
        }
        Some(AudioClip {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

/// Service that records microphone audio and reports silence.
///
/// `start` fails with a `Device` error when no input device is available or
/// the device is busy; the caller surfaces that as an error state and never
/// retries silently. `stop` returns `None` for empty or sub-minimum
/// recordings.
pub trait AudioCaptureService: Send {
    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Option<AudioClip>;

    fn silence_duration(&self) -> Duration;

    fn is_active(&self) -> bool;
}

/// Shared state fed by the device callback thread.
///
/// The buffer lock is held only for the duration of one append so the audio
/// thread never blocks on anything slower.
#[derive(Debug, Clone)]
pub(crate) struct CaptureShared {
    buffer: Arc<Mutex<RecordingBuffer>>,
    clock: SilenceClock,
    sample_rate: u32,
}

impl CaptureShared {
    pub(crate) fn new(sample_rate: u32) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(RecordingBuffer::new(sample_rate))),
            clock: SilenceClock::new(),
            sample_rate,
        }
    }

    pub(crate) fn clock(&self) -> &SilenceClock {
        &self.clock
    }

    /// Discard any previous recording and arm the clock for a new one.
    pub(crate) fn begin(&self) {
        let mut guard = self.buffer.lock().expect("recording buffer poisoned");
        *guard = RecordingBuffer::new(self.sample_rate);
        drop(guard);
        self.clock.start();
    }

    /// Append one frame and refresh the silence clock if it contains voice.
    pub(crate) fn ingest(&self, frame: &[i16]) {
        {
            let mut buffer = self.buffer.lock().expect("recording buffer poisoned");
            buffer.push_frame(frame);
        }
        if rms(frame) >= SILENCE_RMS_THRESHOLD {
            self.clock.mark_voice();
        }
    }

    /// Swap the buffer out and concatenate it into a clip.
    pub(crate) fn take_clip(&self) -> Option<AudioClip> {
        let mut guard = self.buffer.lock().expect("recording buffer poisoned");
        std::mem::replace(&mut *guard, RecordingBuffer::new(self.sample_rate)).finish()
    }
}

/// Mock capture service for tests: frames are pushed manually.
///
/// Clones share state, so a test can keep a handle while the orchestrator
/// owns the service.
#[derive(Clone)]
pub struct MockCapture {
    shared: CaptureShared,
    active: Arc<AtomicBool>,
    fail_on_start: Arc<AtomicBool>,
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            shared: CaptureShared::new(SAMPLE_RATE),
            active: Arc::new(AtomicBool::new(false)),
            fail_on_start: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make the next `start` fail with a `Device` error.
    pub fn set_fail_on_start(&self, fail: bool) {
        self.fail_on_start.store(fail, Ordering::Relaxed);
    }

    /// Simulate one device callback delivering a frame.
    pub fn push_frame(&self, frame: &[i16]) {
        self.shared.ingest(frame);
    }

    /// Push `secs` worth of a constant-amplitude signal.
    pub fn push_secs(&self, secs: f32, amplitude: i16) {
        let n = (secs * SAMPLE_RATE as f32) as usize;
        self.push_frame(&vec![amplitude; n]);
    }
}

impl AudioCaptureService for MockCapture {
    fn start(&mut self) -> Result<()> {
        if self.fail_on_start.load(Ordering::Relaxed) {
            return Err(whispertype_core::WhisperTypeError::Device(
                "no input device available".to_string(),
            ));
        }
        self.shared.begin();
        self.active.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Option<AudioClip> {
        self.active.store(false, Ordering::Relaxed);
        self.shared.clock().reset();
        self.shared.take_clip()
    }

    fn silence_duration(&self) -> Duration {
        if !self.active.load(Ordering::Relaxed) {
            return Duration::ZERO;
        }
        self.shared.clock().silence_duration()
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_silence() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0; 160]), 0.0);
    }

    #[test]
    fn test_rms_constant_signal() {
        let frame = vec![1000i16; 160];
        assert!((rms(&frame) - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_rms_negative_samples_count_as_voice() {
        let frame = vec![-1000i16; 160];
        assert!(rms(&frame) >= SILENCE_RMS_THRESHOLD);
    }

    #[test]
    fn test_silence_clock_inactive_is_zero() {
        let clock = SilenceClock::new();
        assert_eq!(clock.silence_duration(), Duration::ZERO);
    }

    #[test]
    fn test_silence_clock_monotone_while_silent() {
        let clock = SilenceClock::new();
        clock.start();
        let a = clock.silence_duration();
        std::thread::sleep(Duration::from_millis(10));
        let b = clock.silence_duration();
        assert!(b >= a);
    }

    #[test]
    fn test_silence_clock_voice_resets() {
        let clock = SilenceClock::new();
        clock.start();
        std::thread::sleep(Duration::from_millis(20));
        let before = clock.silence_duration();
        clock.mark_voice();
        let after = clock.silence_duration();
        assert!(after < before);
    }

    #[test]
    fn test_silence_clock_reset_disarms() {
        let clock = SilenceClock::new();
        clock.start();
        clock.reset();
        assert_eq!(clock.silence_duration(), Duration::ZERO);
        // mark_voice on a disarmed clock stays disarmed.
        clock.mark_voice();
        assert_eq!(clock.silence_duration(), Duration::ZERO);
    }

    #[test]
    fn test_buffer_empty_returns_none() {
        let buffer = RecordingBuffer::new(SAMPLE_RATE);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_buffer_below_minimum_discarded() {
        let mut buffer = RecordingBuffer::new(SAMPLE_RATE);
        // 0.2 s at 16 kHz.
        buffer.push_frame(&vec![100i16; 3200]);
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_buffer_at_minimum_kept() {
        let mut buffer = RecordingBuffer::new(SAMPLE_RATE);
        // 0.5 s at 16 kHz, split across frames.
        buffer.push_frame(&vec![100i16; 4000]);
        buffer.push_frame(&vec![200i16; 4000]);
        let clip = buffer.finish().unwrap();
        assert_eq!(clip.samples.len(), 8000);
        assert!((clip.duration_secs() - 0.5).abs() < 0.001);
        // Frame order preserved.
        assert_eq!(clip.samples[0], 100);
        assert_eq!(clip.samples[4000], 200);
    }

    #[test]
    fn test_clip_to_f32_normalization() {
        let clip = AudioClip {
            samples: vec![0, 16384, -32768],
            sample_rate: SAMPLE_RATE,
        };
        let f = clip.to_f32();
        assert!((f[0] - 0.0).abs() < f32::EPSILON);
        assert!((f[1] - 0.5).abs() < 0.001);
        assert!((f[2] + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mock_capture_lifecycle() {
        let mut capture = MockCapture::new();
        assert!(!capture.is_active());

        capture.start().unwrap();
        assert!(capture.is_active());
        capture.push_secs(0.5, 1000);

        let clip = capture.stop().unwrap();
        assert!(!capture.is_active());
        assert!(clip.duration_secs() >= 0.5);
    }

    #[test]
    fn test_mock_capture_short_recording_discarded() {
        let mut capture = MockCapture::new();
        capture.start().unwrap();
        capture.push_secs(0.2, 1000);
        assert!(capture.stop().is_none());
    }

    #[test]
    fn test_mock_capture_device_error() {
        let mut capture = MockCapture::new();
        capture.set_fail_on_start(true);
        let err = capture.start().unwrap_err();
        assert!(matches!(
            err,
            whispertype_core::WhisperTypeError::Device(_)
        ));
    }

    #[test]
    fn test_mock_capture_silence_zero_when_inactive() {
        let capture = MockCapture::new();
        assert_eq!(capture.silence_duration(), Duration::ZERO);
    }

    #[test]
    fn test_voice_frame_refreshes_clock() {
        let mut capture = MockCapture::new();
        capture.start().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let before = capture.silence_duration();
        // Above the RMS threshold.
        capture.push_frame(&vec![5000i16; 1600]);
        assert!(capture.silence_duration() < before);
    }

    #[test]
    fn test_quiet_frame_does_not_refresh_clock() {
        let mut capture = MockCapture::new();
        capture.start().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let before = capture.silence_duration();
        // Below the RMS threshold.
        capture.push_frame(&vec![50i16; 1600]);
        assert!(capture.silence_duration() >= before);
    }

    #[test]
    fn test_buffer_recreated_between_recordings() {
        let mut capture = MockCapture::new();
        capture.start().unwrap();
        capture.push_secs(0.5, 1000);
        let first = capture.stop().unwrap();

        capture.start().unwrap();
        capture.push_secs(0.4, 2000);
        let second = capture.stop().unwrap();

        assert!((first.duration_secs() - 0.5).abs() < 0.001);
        assert!((second.duration_secs() - 0.4).abs() < 0.001);
        assert_eq!(second.samples[0], 2000);
    }
}
