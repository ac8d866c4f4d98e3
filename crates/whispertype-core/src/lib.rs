pub mod config;
pub mod error;
pub mod types;

pub use config::{OverlayPosition, WhisperTypeConfig};
pub use error::{Result, WhisperTypeError};
pub use types::*;
