//! spif-core - Serial NOR flash driver core
//!
//! This crate implements the command protocol of common 25-series serial NOR
//! flash chips on top of two structurally different transports:
//!
//! - a plain SPI bus, where every flash command is framed as one byte stream
//!   (opcode, 24-bit address, optional dummy bytes, data), and
//! - a QSPI peripheral with a hardware command/address/data phase generator.
//!
//! The chip is identified by its JEDEC ID at initialization and matched
//! against a compiled-in geometry table.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable boxed transports
//! - `is_sync` - Compile the transport traits and the protocol engine as
//!   blocking code instead of `async`
//!
//! # Example
//!
//! ```ignore
//! use spif_core::{DriverConfig, FlashDriver};
//! use spif_core::platform::HalDelay;
//! use spif_core::transport::{EhSpi, SpiBus};
//!
//! let bus = SpiBus::new(EhSpi::new(spi_device));
//! let mut flash = FlashDriver::init(bus, HalDelay::new(delay), DriverConfig::default())?;
//!
//! flash.sector_erase(0x1000)?;
//! flash.page_program(0x1000, &[0x11; 256])?;
//!
//! let mut buf = [0u8; 256];
//! flash.read(0x1000, &mut buf)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
#[cfg(feature = "is_sync")]
mod nor_flash;
pub mod platform;
pub mod protocol;
#[cfg(all(feature = "std", feature = "is_sync"))]
pub mod shared;
pub mod spi;
pub mod transport;

pub use config::{DriverConfig, PollConfig, UnknownChipPolicy};
pub use driver::FlashDriver;
pub use error::{Error, Result};
pub use geometry::{FlashGeometry, JedecId};
