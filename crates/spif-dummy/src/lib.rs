//! spif-dummy - In-memory serial NOR flash emulator
//!
//! This crate emulates a 25-series NOR flash chip in memory and exposes it
//! through both transport variants of `spif-core`:
//!
//! - [`DummySpi`], a byte-stream SPI transport that decodes each frame, and
//! - [`DummyQspi`], a QSPI peripheral that receives the phases separately.
//!
//! The chip records every command it receives, which makes it useful for
//! checking command sequences as well as data.

mod chip;
mod transport;

pub use chip::{opcode_dummy_bytes, opcode_has_address, DummyChip, DummyConfig, Transaction};
pub use transport::{BusStats, DummyQspi, DummySpi};

use spif_core::platform::Platform;
use spif_core::transport::{QspiBus, SpiBus};
use spif_core::FlashDriver;

/// Platform that records delays instead of sleeping
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyPlatform {
    /// Number of delay calls
    pub delays: usize,
    /// Total requested delay in microseconds
    pub total_us: u64,
}

impl Platform for DummyPlatform {
    fn delay_us(&mut self, us: u32) {
        self.delays += 1;
        self.total_us += us as u64;
    }
}

/// Driver over the emulated SPI bus
pub type DummySpiFlash = FlashDriver<SpiBus<DummySpi>, DummyPlatform>;

/// Driver over the emulated QSPI peripheral
pub type DummyQspiFlash = FlashDriver<QspiBus<DummyQspi>, DummyPlatform>;

#[cfg(test)]
mod tests;
