//! Error types for spif-core
//!
//! A single no_std compatible error type is used by every layer of the
//! driver, from the transports up to the driver state.

use core::fmt;

use crate::geometry::JedecId;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// The underlying bus exchange failed
    Transport,
    /// The transport lock could not be acquired in time
    LockTimeout,
    /// The command does not fit the transport's frame buffer
    FrameTooLarge,
    /// The transport cannot express this command
    InvalidCommand,
    /// Opcode is not recognised by the device
    OpcodeNotSupported,

    // Device errors
    /// The busy bit was still set after the last status poll
    Timeout,
    /// The JEDEC ID read at initialization matches no known geometry
    UnsupportedChip(JedecId),
    /// The selected geometry has unusable page, sector or block sizes
    InvalidGeometry,

    // Address/size errors
    /// Address range extends beyond the end of the device
    AddressOutOfBounds,
    /// Page program request is larger than a page or crosses a page boundary
    PageBoundary,
    /// Operation requires an aligned address or length
    InvalidAlignment,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "bus transfer failed"),
            Self::LockTimeout => write!(f, "timed out waiting for the bus lock"),
            Self::FrameTooLarge => write!(f, "command does not fit in the transport frame"),
            Self::InvalidCommand => write!(f, "command cannot be expressed on this transport"),
            Self::OpcodeNotSupported => write!(f, "opcode not supported by the device"),
            Self::Timeout => write!(f, "flash still busy after the last status poll"),
            Self::UnsupportedChip(id) => write!(f, "unsupported flash chip (JEDEC ID {})", id),
            Self::InvalidGeometry => write!(f, "invalid flash geometry"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::PageBoundary => write!(f, "page program crosses a page boundary"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
