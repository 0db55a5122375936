//! Error types for the fan control daemon

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the fan control daemon
pub type Result<T> = std::result::Result<T, FanControlError>;

/// Main error type for the fan control daemon
#[derive(Error, Debug)]
pub enum FanControlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no PWM fan device found under {0}")]
    DeviceNotFound(String),

    #[error("failed to read {}: {}", path.display(), source)]
    DeviceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write state {} to {}: {}", state, path.display(), source)]
    DeviceWrite {
        path: PathBuf,
        state: u32,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("desired state {desired} exceeds the maximum allowed state {max}")]
    StateExceedsMax { desired: u32, max: u32 },
}
