//! WhisperType binary - composition root.
//!
//! Wires the crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Start the transcription model loading on a worker thread
//! 3. Build the platform adapters (microphone, clipboard, keyboard, sound,
//!    global hotkeys)
//! 4. Forward hotkey presses and Ctrl+C into the session mailbox
//! 5. Run the session orchestrator until shutdown

mod cli;

use clap::Parser;

use whispertype_audio::CpalCapture;
use whispertype_core::config::WhisperTypeConfig;
use whispertype_inject::adapters::{
    ArboardClipboard, EnigoInput, GlobalHotkeyBackend, NullFocusManager, RodioSound,
};
use whispertype_inject::delivery::TextDelivery;
use whispertype_inject::hotkey::HotkeyRegistry;
use whispertype_inject::WindowClassifier;
use whispertype_session::{
    spawn_model_load, Dispatcher, SessionEvent, SessionOrchestrator, SessionPorts, CANCEL_COMBO,
};
use whispertype_stt::ModelSpec;

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

/// Id the `global-hotkey` crate will assign to `combo`, for matching
/// incoming events without holding the registry.
fn hotkey_id(combo: &str) -> Option<u32> {
    use std::str::FromStr;
    global_hotkey::hotkey::HotKey::from_str(combo)
        .ok()
        .map(|hotkey| hotkey.id())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);

    tracing::info!("Starting WhisperType v{}", env!("CARGO_PKG_VERSION"));

    let config_file = args
        .config
        .unwrap_or_else(WhisperTypeConfig::default_path);
    let mut config = WhisperTypeConfig::load_or_default(&config_file);
    if let Some(model) = args.model {
        tracing::info!(model = %model, "Model overridden from command line");
        config.model.model = model;
    }

    let (dispatcher, mut rx) = Dispatcher::channel();

    // The session sits in Loading until the worker reports back.
    spawn_model_load(dispatcher.clone(), ModelSpec::from_config(&config.model));

    let ports = SessionPorts {
        capture: Box::new(CpalCapture::new()),
        focus: Box::new(NullFocusManager::new()),
        hotkeys: HotkeyRegistry::new(Box::new(GlobalHotkeyBackend::new()?)),
        delivery: TextDelivery::new(
            Box::new(ArboardClipboard::new()?),
            Box::new(EnigoInput::new()?),
        ),
        classifier: WindowClassifier::from_config(&config.injection),
        sound: Box::new(RodioSound::new()),
    };

    // Hotkey events arrive on the crate's own channel; map ids back to the
    // two combos the session registers and forward them to the mailbox.
    let toggle_id = hotkey_id(&config.hotkey.combo);
    let cancel_id = hotkey_id(CANCEL_COMBO);
    if toggle_id.is_none() {
        tracing::error!(combo = %config.hotkey.combo, "Configured hotkey combo does not parse");
    }
    let hotkey_tx = dispatcher.clone();
    std::thread::spawn(move || {
        let receiver = global_hotkey::GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.recv() {
            if event.state != global_hotkey::HotKeyState::Pressed {
                continue;
            }
            if Some(event.id) == toggle_id {
                hotkey_tx.send(SessionEvent::Toggle);
            } else if Some(event.id) == cancel_id {
                hotkey_tx.send(SessionEvent::Cancel);
            }
        }
    });

    // Ctrl+C drains through the mailbox so shutdown cleanup still runs.
    let shutdown_tx = dispatcher.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            shutdown_tx.send(SessionEvent::Shutdown);
        }
    });

    let mut orchestrator = SessionOrchestrator::new(config, dispatcher, ports);
    orchestrator.run(&mut rx).await;

    Ok(())
}
