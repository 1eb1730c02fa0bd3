//! Error types for Linux SPI operations

use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to {mode}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Transfer does not fit the kernel buffer
    #[error("Transfer of {len} bytes exceeds the spidev buffer ({max} bytes)")]
    TransferTooLarge { len: usize, max: usize },

    /// Device lock could not be taken
    #[error("Failed to lock device: {0}")]
    LockFailed(#[source] std::io::Error),

    /// Device lock held elsewhere for too long
    #[error("Device still locked after {0} ms")]
    LockTimeout(u32),

    /// Invalid programmer option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;

impl From<LinuxSpiError> for spif_core::Error {
    fn from(err: LinuxSpiError) -> Self {
        match err {
            LinuxSpiError::LockTimeout(_) => spif_core::Error::LockTimeout,
            LinuxSpiError::TransferTooLarge { .. } => spif_core::Error::FrameTooLarge,
            _ => spif_core::Error::Transport,
        }
    }
}
