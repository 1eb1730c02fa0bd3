//! Transport abstraction
//!
//! The command protocol engine talks to the flash through a single
//! capability, [`FlashBus::execute`], which turns one [`FlashCommand`] into
//! one bus transaction. Two adapters implement it:
//!
//! - [`SpiBus`] wraps a byte-oriented [`SpiTransport`] and concatenates the
//!   opcode, address, dummy bytes and write data into one outbound frame.
//! - [`QspiBus`] wraps a phase-generating [`QspiTransport`] and hands it the
//!   opcode, optional address, dummy cycles and data phase unchanged.
//!
//! Uses `maybe_async` to support both sync and async modes.

mod hal;
mod qspi;
mod spi;

pub use hal::EhSpi;
pub use qspi::{QspiBus, QspiCommand, QspiData, QspiTransport};
pub use spi::{SpiBus, SpiTransport, DEFAULT_FRAME_LEN};

use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::spi::FlashCommand;
use maybe_async::maybe_async;

/// Which transport variant a bus is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusMode {
    /// Byte-stream SPI (host-side framing)
    Spi,
    /// QSPI peripheral with hardware phase generator
    Qspi,
}

impl fmt::Display for BusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi => write!(f, "SPI"),
            Self::Qspi => write!(f, "QSPI"),
        }
    }
}

/// Flash bus trait (sync or async depending on `is_sync` feature)
///
/// One call to `execute()` is one chip-select framing and carries exactly
/// one flash command. Failures of the underlying exchange are returned
/// unchanged; implementations must not retry.
///
/// `lock()`/`unlock()` bracket every multi-phase write sequence issued by
/// the driver. Transports that share their bus with other users implement
/// them with a real mutual exclusion primitive; the defaults do nothing.
#[maybe_async(AFIT)]
pub trait FlashBus {
    /// The transport variant behind this bus
    fn mode(&self) -> BusMode;

    /// Maximum number of bytes that can be read by a single command
    fn max_read_len(&self) -> usize {
        usize::MAX
    }

    /// Bring up the transport
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Shut down the transport
    fn deinit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Acquire exclusive use of the bus, waiting at most `timeout_ms`
    fn lock(&mut self, _timeout_ms: u32) -> Result<()> {
        Ok(())
    }

    /// Release the bus acquired by `lock()`
    fn unlock(&mut self) {}

    /// Execute a single flash command
    async fn execute(&mut self, cmd: &mut FlashCommand<'_>) -> Result<()>;
}

// Blanket impl for boxed buses to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl FlashBus for alloc::boxed::Box<dyn FlashBus + Send> {
    fn mode(&self) -> BusMode {
        (**self).mode()
    }

    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn deinit(&mut self) -> Result<()> {
        (**self).deinit()
    }

    fn lock(&mut self, timeout_ms: u32) -> Result<()> {
        (**self).lock(timeout_ms)
    }

    fn unlock(&mut self) {
        (**self).unlock()
    }

    fn execute(&mut self, cmd: &mut FlashCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }
}

/// Scoped bus lock
///
/// Acquires the bus lock on creation and releases it when dropped, so the
/// lock is released on every exit path of a write sequence.
pub struct BusLock<'a, B: FlashBus + ?Sized> {
    bus: &'a mut B,
}

impl<'a, B: FlashBus + ?Sized> BusLock<'a, B> {
    /// Lock `bus`, waiting at most `timeout_ms`
    pub fn acquire(bus: &'a mut B, timeout_ms: u32) -> Result<Self> {
        bus.lock(timeout_ms)?;
        Ok(Self { bus })
    }
}

impl<B: FlashBus + ?Sized> Deref for BusLock<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bus
    }
}

impl<B: FlashBus + ?Sized> DerefMut for BusLock<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bus
    }
}

impl<B: FlashBus + ?Sized> Drop for BusLock<'_, B> {
    fn drop(&mut self) {
        self.bus.unlock();
    }
}
