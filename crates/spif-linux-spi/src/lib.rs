//! spif-linux-spi - Linux spidev transport
//!
//! This crate provides a byte-stream [`SpiTransport`](spif_core::transport::SpiTransport)
//! over the Linux `/dev/spidevX.Y` character devices.
//!
//! # Example
//!
//! ```no_run
//! use spif_core::platform::StdPlatform;
//! use spif_core::transport::SpiBus;
//! use spif_core::{DriverConfig, FlashDriver};
//! use spif_linux_spi::{LinuxSpi, LinuxSpiConfig};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0")
//!     .with_speed(4_000_000)  // 4 MHz
//!     .with_mode(0);
//! let spi = LinuxSpi::open(&config)?;
//!
//! let mut flash = FlashDriver::init(SpiBus::new(spi), StdPlatform, DriverConfig::default())?;
//! println!("JEDEC ID: {}", flash.jedec_id());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the spif CLI
//!
//! ```bash
//! spif probe -p linux_spi:dev=/dev/spidev0.0,spispeed=4000
//! spif read -p linux_spi:dev=/dev/spidev0.0,mode=3 -o flash.bin
//! ```
//!
//! The bus lock hook takes an advisory `flock(2)` on the device node, so
//! several processes driving the same flash serialize their write sequences.

pub mod device;
pub mod error;

pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
