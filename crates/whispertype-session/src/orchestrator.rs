//! The session orchestrator: owns all mutable session state and applies
//! events one at a time.
//!
//! Everything here runs on the owner context. Long-running work (model
//! loading, transcription) happens on blocking worker threads that report
//! back through the dispatcher; timers are delayed events. The orchestrator
//! itself never blocks on anything slower than a clipboard write.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use whispertype_audio::AudioCaptureService;
use whispertype_core::config::WhisperTypeConfig;
use whispertype_core::WhisperTypeError;
use whispertype_inject::delivery::TextDelivery;
use whispertype_inject::hotkey::HotkeyRegistry;
use whispertype_inject::planner::plan;
use whispertype_inject::ports::{FocusManager, SoundPort};
use whispertype_inject::{FocusToken, WindowClass, WindowClassifier};
use whispertype_stt::{ModelSpec, TranscriptionService};

use crate::dispatcher::Dispatcher;
use crate::event::SessionEvent;
use crate::state::SessionState;

/// How often the silence clock is checked while recording.
const SILENCE_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Gap between restoring focus and sending input, so the window manager can
/// finish activating the target before keys arrive.
const RESTORE_TO_DELIVER: Duration = Duration::from_millis(300);
/// Gap between the two halves of the cancel beep.
const CANCEL_BEEP_GAP: Duration = Duration::from_millis(130);

const ERROR_DISPLAY: Duration = Duration::from_secs(3);
const TOO_SHORT_DISPLAY: Duration = Duration::from_millis(1500);
const PREVIEW_DISPLAY: Duration = Duration::from_secs(4);

/// Combo registered alongside the toggle hotkey to cancel a recording.
pub const CANCEL_COMBO: &str = "escape";

/// Platform collaborators handed to the orchestrator at startup.
///
/// The composition root picks concrete adapters; tests hand in mocks.
pub struct SessionPorts {
    pub capture: Box<dyn AudioCaptureService>,
    pub focus: Box<dyn FocusManager>,
    pub hotkeys: HotkeyRegistry,
    pub delivery: TextDelivery,
    pub classifier: WindowClassifier,
    pub sound: Box<dyn SoundPort>,
}

/// Single-instance session state machine.
///
/// Created once at startup in `Loading` and reused for every recording until
/// shutdown. All methods assume they are called from the owner context.
pub struct SessionOrchestrator {
    config: WhisperTypeConfig,
    dispatcher: Dispatcher,
    ports: SessionPorts,
    state: SessionState,
    /// Bumped at the start of every recording; results tagged with an older
    /// attempt are discarded on arrival.
    attempt: u64,
    model: Option<Arc<dyn TranscriptionService>>,
    /// Window that was focused when the current recording started.
    focus_token: Option<FocusToken>,
    /// Last successfully injected text, shown while in `Preview`.
    preview_text: Option<String>,
    recording_id: Option<Uuid>,
    recording_started: Option<DateTime<Utc>>,
}

impl SessionOrchestrator {
    pub fn new(config: WhisperTypeConfig, dispatcher: Dispatcher, ports: SessionPorts) -> Self {
        Self {
            config,
            dispatcher,
            ports,
            state: SessionState::Loading,
            attempt: 0,
            model: None,
            focus_token: None,
            preview_text: None,
            recording_id: None,
            recording_started: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preview_text(&self) -> Option<&str> {
        self.preview_text.as_deref()
    }

    /// Drain the mailbox until `Shutdown` arrives.
    pub async fn run(&mut self, rx: &mut mpsc::UnboundedReceiver<SessionEvent>) {
        while let Some(event) = rx.recv().await {
            if matches!(event, SessionEvent::Shutdown) {
                info!("Session shutting down");
                if self.ports.capture.is_active() {
                    let _ = self.ports.capture.stop();
                }
                self.ports.hotkeys.unregister_all();
                break;
            }
            self.handle(event);
        }
    }

    /// Apply one event. Synchronous so that every state change is complete
    /// before the next event is examined.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ModelReady(service) => self.on_model_ready(service),
            SessionEvent::ModelLoadFailed(err) => self.on_model_load_failed(err),
            SessionEvent::Toggle => match self.state {
                SessionState::Idle => self.start_recording(),
                SessionState::Recording => self.stop_recording(),
                other => debug!(state = %other, "Toggle ignored"),
            },
            SessionEvent::Stop => {
                if self.state == SessionState::Recording {
                    self.stop_recording();
                }
            }
            SessionEvent::Cancel => {
                if self.state == SessionState::Recording {
                    self.cancel_recording();
                }
            }
            SessionEvent::SilencePoll => self.on_silence_poll(),
            SessionEvent::TranscriptionDone { attempt, text } => {
                self.on_transcription_done(attempt, text)
            }
            SessionEvent::TranscriptionFailed { attempt, error } => {
                self.on_transcription_failed(attempt, error)
            }
            SessionEvent::Deliver { attempt, text } => self.on_deliver(attempt, text),
            SessionEvent::DisplayTimeout { from } => self.on_display_timeout(from),
            SessionEvent::CancelBeep => {
                if self.config.recording.sound_feedback {
                    self.ports.sound.beep(300, 80);
                }
            }
            SessionEvent::Shutdown => {}
        }
    }

    fn on_model_ready(&mut self, service: Arc<dyn TranscriptionService>) {
        self.model = Some(service);
        if self.state == SessionState::Loading {
            info!("Transcription model ready");
            self.transition(SessionState::Idle);
            self.register_hotkeys();
        } else {
            debug!(state = %self.state, "Model arrived outside Loading");
        }
    }

    fn on_model_load_failed(&mut self, err: WhisperTypeError) {
        if self.state != SessionState::Loading {
            return;
        }
        error!(error = %err, "Model load failed");
        // Hotkeys go live anyway so a later Toggle gets a visible error
        // instead of a dead key.
        self.show(SessionState::Error);
        self.register_hotkeys();
    }

    fn register_hotkeys(&mut self) {
        let combo = self.config.hotkey.combo.clone();
        let suppress = self.config.hotkey.suppress;
        if let Err(err) = self.ports.hotkeys.register(&combo, suppress) {
            warn!(combo = %combo, error = %err, "Hotkey registration failed");
        }
        if let Err(err) = self.ports.hotkeys.register(CANCEL_COMBO, false) {
            warn!(error = %err, "Cancel hotkey registration failed");
        }
    }

    fn start_recording(&mut self) {
        self.attempt += 1;
        let session_id = Uuid::new_v4();
        self.recording_id = Some(session_id);
        self.recording_started = Some(Utc::now());
        self.focus_token = self.ports.focus.save();

        if let Err(err) = self.ports.capture.start() {
            error!(error = %err, "Failed to open microphone");
            self.focus_token = None;
            self.show(SessionState::Error);
            return;
        }

        self.transition(SessionState::Recording);
        info!(
            session_id = %session_id,
            attempt = self.attempt,
            "Recording started"
        );
        if self.config.recording.sound_feedback {
            self.ports.sound.beep(800, 100);
        }
        self.dispatcher
            .send_after(SILENCE_POLL_INTERVAL, SessionEvent::SilencePoll);
    }

    fn on_silence_poll(&mut self) {
        if self.state != SessionState::Recording {
            return;
        }
        let timeout = self.config.recording.silence_timeout_secs;
        if timeout > 0.0
            && self.ports.capture.silence_duration() >= Duration::from_secs_f32(timeout)
        {
            info!("Silence timeout reached, stopping");
            self.stop_recording();
        } else {
            self.dispatcher
                .send_after(SILENCE_POLL_INTERVAL, SessionEvent::SilencePoll);
        }
    }

    fn stop_recording(&mut self) {
        let clip = self.ports.capture.stop();
        if self.config.recording.sound_feedback {
            self.ports.sound.beep(400, 150);
        }
        match clip {
            None => {
                debug!("Recording too short, discarding");
                self.focus_token = None;
                self.show(SessionState::TooShort);
            }
            Some(clip) => {
                self.transition(SessionState::Transcribing);
                let wall_ms = self
                    .recording_started
                    .map(|started| (Utc::now() - started).num_milliseconds());
                info!(
                    session_id = ?self.recording_id,
                    duration_secs = clip.duration_secs(),
                    wall_ms = ?wall_ms,
                    "Recording stopped, transcribing"
                );
                self.spawn_transcription(clip);
            }
        }
    }

    fn spawn_transcription(&self, clip: whispertype_audio::AudioClip) {
        let attempt = self.attempt;
        let dispatcher = self.dispatcher.clone();
        let Some(model) = self.model.clone() else {
            dispatcher.send(SessionEvent::TranscriptionFailed {
                attempt,
                error: WhisperTypeError::ModelNotReady,
            });
            return;
        };
        let language = self.config.model.language.clone();
        let prompt = self.config.model.initial_prompt.clone();
        tokio::task::spawn_blocking(move || {
            let lang = if language.is_empty() {
                None
            } else {
                Some(language.as_str())
            };
            match model.transcribe(&clip, lang, prompt.as_deref()) {
                Ok(text) => dispatcher.send(SessionEvent::TranscriptionDone { attempt, text }),
                Err(error) => {
                    dispatcher.send(SessionEvent::TranscriptionFailed { attempt, error })
                }
            }
        });
    }

    fn cancel_recording(&mut self) {
        let _ = self.ports.capture.stop();
        self.focus_token = None;
        self.transition(SessionState::Idle);
        info!(session_id = ?self.recording_id, "Recording cancelled");
        if self.config.recording.sound_feedback {
            self.ports.sound.beep(300, 80);
            self.dispatcher
                .send_after(CANCEL_BEEP_GAP, SessionEvent::CancelBeep);
        }
    }

    fn on_transcription_done(&mut self, attempt: u64, text: String) {
        if attempt != self.attempt || self.state != SessionState::Transcribing {
            debug!(attempt, current = self.attempt, "Stale transcription result");
            return;
        }
        if text.trim().is_empty() {
            debug!("Empty transcript, nothing to inject");
            self.focus_token = None;
            self.transition(SessionState::Idle);
            return;
        }
        if let Some(token) = &self.focus_token {
            if !self.ports.focus.restore(token) {
                warn!(window = %token.window.app_class, "Could not restore focus");
            }
        }
        self.transition(SessionState::Preview);
        self.dispatcher
            .send_after(RESTORE_TO_DELIVER, SessionEvent::Deliver { attempt, text });
        self.dispatcher.send_after(
            PREVIEW_DISPLAY,
            SessionEvent::DisplayTimeout {
                from: SessionState::Preview,
            },
        );
    }

    fn on_transcription_failed(&mut self, attempt: u64, error: WhisperTypeError) {
        if attempt != self.attempt || self.state != SessionState::Transcribing {
            debug!(attempt, current = self.attempt, "Stale transcription failure");
            return;
        }
        error!(error = %error, "Transcription failed");
        self.focus_token = None;
        self.show(SessionState::Error);
    }

    fn on_deliver(&mut self, attempt: u64, text: String) {
        if attempt != self.attempt || self.state != SessionState::Preview {
            debug!(attempt, current = self.attempt, "Stale delivery request");
            return;
        }
        let mut text = text;
        if self.config.injection.prepend_space {
            text.insert(0, ' ');
        }
        let class = self
            .focus_token
            .take()
            .map(|token| self.ports.classifier.classify(&token.window))
            .unwrap_or(WindowClass::PlainGui);
        let delivery_plan = plan(class, self.config.injection.preserve_clipboard);
        debug!(class = ?class, plan = ?delivery_plan, "Delivering transcript");

        // The hotkey chord must not be live while synthetic keys are in
        // flight, or the injected combo could re-trigger a recording.
        self.ports.hotkeys.unregister_all();
        self.ports.delivery.deliver(delivery_plan, &text);
        self.register_hotkeys();

        self.preview_text = Some(text);
    }

    fn on_display_timeout(&mut self, from: SessionState) {
        if self.state != from {
            return;
        }
        if from == SessionState::Preview {
            self.preview_text = None;
        }
        self.transition(SessionState::Idle);
    }

    /// Enter a transient display state and schedule its auto-dismiss.
    fn show(&mut self, display: SessionState) {
        debug_assert!(display.is_display());
        self.transition(display);
        let delay = match display {
            SessionState::Error => ERROR_DISPLAY,
            SessionState::TooShort => TOO_SHORT_DISPLAY,
            _ => PREVIEW_DISPLAY,
        };
        self.dispatcher
            .send_after(delay, SessionEvent::DisplayTimeout { from: display });
    }

    fn transition(&mut self, to: SessionState) {
        if self.state.can_transition_to(to) {
            debug!(from = %self.state, to = %to, "State transition");
            self.state = to;
        } else {
            warn!(from = %self.state, to = %to, "Rejected invalid transition");
        }
    }
}

/// Load the transcription model on a blocking worker and report back through
/// the dispatcher.
pub fn spawn_model_load(dispatcher: Dispatcher, spec: ModelSpec) {
    tokio::task::spawn_blocking(move || {
        info!(model = %spec.model_id(), "Loading transcription model");
        match whispertype_stt::load_model(&spec) {
            Ok(service) => dispatcher.send(SessionEvent::ModelReady(service)),
            Err(error) => dispatcher.send(SessionEvent::ModelLoadFailed(error)),
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use whispertype_audio::MockCapture;
    use whispertype_core::types::WindowRef;
    use whispertype_inject::ports::{
        InputAction, MockClipboard, MockFocus, MockHotkeyBackend, MockInput, MockSound,
    };
    use whispertype_inject::KeyCombo;
    use whispertype_stt::MockTranscriber;

    struct Harness {
        orchestrator: SessionOrchestrator,
        rx: mpsc::UnboundedReceiver<SessionEvent>,
        capture: MockCapture,
        clipboard: MockClipboard,
        input: MockInput,
        focus: MockFocus,
        sound: MockSound,
        hotkeys: MockHotkeyBackend,
    }

    impl Harness {
        fn new(model: Option<Arc<dyn TranscriptionService>>, window: Option<WindowRef>) -> Self {
            let mut config = WhisperTypeConfig::default();
            // Short enough that tests can cross it with a real sleep.
            config.recording.silence_timeout_secs = 0.05;

            let capture = MockCapture::new();
            let clipboard = MockClipboard::with_contents("before");
            let input = MockInput::new();
            let focus = match window {
                Some(window) => MockFocus::focused_on(window),
                None => MockFocus::unavailable(),
            };
            let sound = MockSound::new();
            let hotkeys = MockHotkeyBackend::new();

            let ports = SessionPorts {
                capture: Box::new(capture.clone()),
                focus: Box::new(focus.clone()),
                hotkeys: HotkeyRegistry::new(Box::new(hotkeys.clone())),
                delivery: TextDelivery::new(Box::new(clipboard.clone()), Box::new(input.clone()))
                    .without_delays(),
                classifier: WindowClassifier::from_config(&config.injection),
                sound: Box::new(sound.clone()),
            };

            let (dispatcher, rx) = Dispatcher::channel();
            let mut orchestrator = SessionOrchestrator::new(config, dispatcher, ports);
            match model {
                Some(model) => orchestrator.handle(SessionEvent::ModelReady(model)),
                None => {
                    // Force a usable session without a model.
                    orchestrator.state = SessionState::Idle;
                }
            }

            Self {
                orchestrator,
                rx,
                capture,
                clipboard,
                input,
                focus,
                sound,
                hotkeys,
            }
        }

        fn with_model(text: &str, window: Option<WindowRef>) -> Self {
            Self::new(Some(Arc::new(MockTranscriber::fixed(text))), window)
        }

        /// Receive the next event matching `want`, skipping timer noise.
        async fn recv_matching(
            &mut self,
            want: impl Fn(&SessionEvent) -> bool,
        ) -> SessionEvent {
            loop {
                let event = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
                    .await
                    .expect("timed out waiting for event")
                    .expect("mailbox closed");
                if want(&event) {
                    return event;
                }
            }
        }
    }

    fn gui_window() -> WindowRef {
        WindowRef::new(1, "gedit", "notes.txt")
    }

    fn terminal_window() -> WindowRef {
        WindowRef::new(2, "Alacritty", "~")
    }

    // -------------------------------------------------------------------------
    // Startup and model loading
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_model_ready_arms_session() {
        let h = Harness::with_model("hi", Some(gui_window()));
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
        let combos = h.hotkeys.active_combos();
        assert!(combos.iter().any(|c| c == "ctrl+shift+space"));
        assert!(combos.iter().any(|c| c == CANCEL_COMBO));
    }

    #[tokio::test]
    async fn test_model_load_failure_still_arms_hotkeys() {
        let mut h = Harness::new(None, Some(gui_window()));
        h.orchestrator.state = SessionState::Loading;
        h.orchestrator.handle(SessionEvent::ModelLoadFailed(
            WhisperTypeError::ModelLoad("file not found".to_string()),
        ));
        assert_eq!(h.orchestrator.state(), SessionState::Error);
        assert_eq!(h.hotkeys.active_combos().len(), 2);

        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::Error,
        });
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_toggle_before_model_ready_is_ignored() {
        let mut h = Harness::new(None, Some(gui_window()));
        h.orchestrator.state = SessionState::Loading;
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Loading);
    }

    // -------------------------------------------------------------------------
    // Recording lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_toggle_starts_recording_with_start_beep() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Recording);
        assert!(h.capture.is_active());
        assert_eq!(h.sound.beeps(), vec![(800, 100)]);
    }

    #[tokio::test]
    async fn test_device_error_shows_error_state() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.capture.set_fail_on_start(true);
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Error);
        assert!(h.sound.beeps().is_empty());

        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::Error,
        });
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_short_recording_shows_too_short_and_keeps_hotkeys() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(0.1, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);

        assert_eq!(h.orchestrator.state(), SessionState::TooShort);
        assert_eq!(h.sound.beeps(), vec![(800, 100), (400, 150)]);
        assert_eq!(h.hotkeys.active_combos().len(), 2);

        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::TooShort,
        });
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_discards_recording_with_double_beep() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Cancel);

        assert_eq!(h.orchestrator.state(), SessionState::Idle);
        assert!(!h.capture.is_active());
        assert_eq!(h.sound.beeps(), vec![(800, 100), (300, 80)]);

        // The second half of the double beep arrives as a delayed event.
        let beep = h
            .recv_matching(|e| matches!(e, SessionEvent::CancelBeep))
            .await;
        h.orchestrator.handle(beep);
        assert_eq!(h.sound.beeps(), vec![(800, 100), (300, 80), (300, 80)]);
    }

    #[tokio::test]
    async fn test_sound_feedback_disabled_silences_beeps() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.config.recording.sound_feedback = false;
        h.orchestrator.handle(SessionEvent::Toggle);
        h.orchestrator.handle(SessionEvent::Cancel);
        assert!(h.sound.beeps().is_empty());
    }

    #[tokio::test]
    async fn test_silence_poll_reschedules_until_timeout() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(0.5, 5000);

        // Voice was just heard, so the poll keeps recording.
        h.orchestrator.handle(SessionEvent::SilencePoll);
        assert_eq!(h.orchestrator.state(), SessionState::Recording);

        // After the silence window elapses, the poll stops the recording.
        tokio::time::sleep(Duration::from_millis(80)).await;
        h.orchestrator.handle(SessionEvent::SilencePoll);
        assert_eq!(h.orchestrator.state(), SessionState::Transcribing);
    }

    #[tokio::test]
    async fn test_zero_silence_timeout_disables_auto_stop() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.config.recording.silence_timeout_secs = 0.0;
        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(0.5, 5000);
        tokio::time::sleep(Duration::from_millis(80)).await;
        h.orchestrator.handle(SessionEvent::SilencePoll);
        assert_eq!(h.orchestrator.state(), SessionState::Recording);
    }

    // -------------------------------------------------------------------------
    // Transcription and delivery
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_full_cycle_into_gui_window() {
        let mut h = Harness::with_model("hello world", Some(gui_window()));

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Transcribing);

        let done = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionDone { .. }))
            .await;
        h.orchestrator.handle(done);
        assert_eq!(h.orchestrator.state(), SessionState::Preview);
        assert_eq!(h.focus.restored_tokens().len(), 1);

        let deliver = h
            .recv_matching(|e| matches!(e, SessionEvent::Deliver { .. }))
            .await;
        h.orchestrator.handle(deliver);

        assert_eq!(h.orchestrator.preview_text(), Some(" hello world"));
        let actions = h.input.actions();
        assert_eq!(actions[0], InputAction::ReleasedModifiers);
        assert!(actions.contains(&InputAction::Combo(KeyCombo::paste())));
        // Clipboard restored to its pre-injection contents.
        assert_eq!(h.clipboard.contents().as_deref(), Some("before"));
        // Hotkeys live again after injection.
        assert_eq!(h.hotkeys.active_combos().len(), 2);

        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::Preview,
        });
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
        assert_eq!(h.orchestrator.preview_text(), None);
    }

    #[tokio::test]
    async fn test_full_cycle_into_terminal_types_directly() {
        let mut h = Harness::with_model("ls -la", Some(terminal_window()));

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);

        let done = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionDone { .. }))
            .await;
        h.orchestrator.handle(done);
        let deliver = h
            .recv_matching(|e| matches!(e, SessionEvent::Deliver { .. }))
            .await;
        h.orchestrator.handle(deliver);

        let actions = h.input.actions();
        assert!(actions.contains(&InputAction::Typed(" ls -la".to_string())));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, InputAction::Combo(_))));
        // Direct synthesis never touches the clipboard.
        assert_eq!(h.clipboard.contents().as_deref(), Some("before"));
    }

    #[tokio::test]
    async fn test_unavailable_focus_falls_back_to_paste() {
        let mut h = Harness::with_model("hi there", None);

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);

        let done = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionDone { .. }))
            .await;
        h.orchestrator.handle(done);
        assert!(h.focus.restored_tokens().is_empty());

        let deliver = h
            .recv_matching(|e| matches!(e, SessionEvent::Deliver { .. }))
            .await;
        h.orchestrator.handle(deliver);
        assert!(h
            .input
            .actions()
            .contains(&InputAction::Combo(KeyCombo::paste())));
    }

    #[tokio::test]
    async fn test_empty_transcript_returns_to_idle() {
        let mut h = Harness::with_model("   ", Some(gui_window()));

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);

        let done = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionDone { .. }))
            .await;
        h.orchestrator.handle(done);
        assert_eq!(h.orchestrator.state(), SessionState::Idle);
        assert!(h.input.actions().is_empty());
    }

    #[tokio::test]
    async fn test_transcription_failure_shows_error() {
        let mut h = Harness::new(
            Some(Arc::new(MockTranscriber::failing("decoder exploded"))),
            Some(gui_window()),
        );

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);

        let failed = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionFailed { .. }))
            .await;
        h.orchestrator.handle(failed);
        assert_eq!(h.orchestrator.state(), SessionState::Error);
    }

    #[tokio::test]
    async fn test_missing_model_fails_transcription() {
        let mut h = Harness::new(None, Some(gui_window()));

        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Transcribing);

        let failed = h
            .recv_matching(|e| matches!(e, SessionEvent::TranscriptionFailed { .. }))
            .await;
        assert!(matches!(
            failed,
            SessionEvent::TranscriptionFailed {
                error: WhisperTypeError::ModelNotReady,
                ..
            }
        ));
        h.orchestrator.handle(failed);
        assert_eq!(h.orchestrator.state(), SessionState::Error);
    }

    // -------------------------------------------------------------------------
    // Late and stale results
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_late_result_from_previous_attempt_is_dropped() {
        let mut h = Harness::with_model("fresh", Some(gui_window()));

        // First attempt fails and is dismissed.
        h.orchestrator.handle(SessionEvent::Toggle);
        h.capture.push_secs(1.0, 5000);
        h.orchestrator.handle(SessionEvent::Toggle);
        h.orchestrator.handle(SessionEvent::TranscriptionFailed {
            attempt: 1,
            error: WhisperTypeError::Transcribe("gpu fell over".to_string()),
        });
        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::Error,
        });

        // Second attempt is recording when the first worker's result lands.
        h.orchestrator.handle(SessionEvent::Toggle);
        assert_eq!(h.orchestrator.state(), SessionState::Recording);
        h.orchestrator.handle(SessionEvent::TranscriptionDone {
            attempt: 1,
            text: "stale".to_string(),
        });
        assert_eq!(h.orchestrator.state(), SessionState::Recording);
        assert!(h.input.actions().is_empty());
    }

    #[tokio::test]
    async fn test_stale_deliver_is_dropped() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.state = SessionState::Preview;
        h.orchestrator.attempt = 2;
        h.orchestrator.handle(SessionEvent::Deliver {
            attempt: 1,
            text: "old".to_string(),
        });
        assert!(h.input.actions().is_empty());
        assert_eq!(h.orchestrator.preview_text(), None);
    }

    #[tokio::test]
    async fn test_display_timeout_for_other_state_is_ignored() {
        let mut h = Harness::with_model("hi", Some(gui_window()));
        h.orchestrator.handle(SessionEvent::Toggle);
        // A leftover Preview timeout must not kick a live recording to Idle.
        h.orchestrator.handle(SessionEvent::DisplayTimeout {
            from: SessionState::Preview,
        });
        assert_eq!(h.orchestrator.state(), SessionState::Recording);
    }

    // -------------------------------------------------------------------------
    // Transition safety across the whole event surface
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_no_event_produces_an_invalid_transition() {
        use SessionState::*;
        let states = [Loading, Idle, Recording, Transcribing, Error, TooShort, Preview];

        let events: Vec<fn() -> SessionEvent> = vec![
            || SessionEvent::ModelReady(Arc::new(MockTranscriber::fixed("x"))),
            || SessionEvent::ModelLoadFailed(WhisperTypeError::ModelLoad("x".to_string())),
            || SessionEvent::Toggle,
            || SessionEvent::Stop,
            || SessionEvent::Cancel,
            || SessionEvent::SilencePoll,
            || SessionEvent::TranscriptionDone {
                attempt: 0,
                text: "x".to_string(),
            },
            || SessionEvent::TranscriptionDone {
                attempt: 0,
                text: String::new(),
            },
            || SessionEvent::TranscriptionFailed {
                attempt: 0,
                error: WhisperTypeError::Transcribe("x".to_string()),
            },
            || SessionEvent::Deliver {
                attempt: 0,
                text: "x".to_string(),
            },
            || SessionEvent::DisplayTimeout { from: Error },
            || SessionEvent::DisplayTimeout { from: TooShort },
            || SessionEvent::DisplayTimeout { from: Preview },
            || SessionEvent::CancelBeep,
        ];

        for state in states {
            for make_event in &events {
                let mut h = Harness::with_model("x", Some(gui_window()));
                h.orchestrator.state = state;
                h.orchestrator.handle(make_event());
                let after = h.orchestrator.state();
                assert!(
                    after == state || state.can_transition_to(after),
                    "{} -> {} via {:?}",
                    state,
                    after,
                    make_event()
                );
            }
        }
    }
}
