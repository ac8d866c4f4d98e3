//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "whispertype",
    version,
    about = "Push-to-talk dictation into whatever window has focus"
)]
pub struct Cli {
    /// Whisper model to load (tiny, base, small, medium, large-v3),
    /// overriding the configured model.
    pub model: Option<String>,

    /// Config file path. Defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
