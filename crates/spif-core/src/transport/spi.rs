//! Byte-stream SPI transport

use heapless::Vec;
use maybe_async::maybe_async;

use super::{BusMode, FlashBus};
use crate::error::{Error, Result};
use crate::spi::{FlashCommand, ADDRESS_LEN};

/// Default outbound frame capacity: opcode, address, one dummy byte and a
/// 256-byte page
pub const DEFAULT_FRAME_LEN: usize = 1 + ADDRESS_LEN + 1 + 256;

/// Raw SPI transport supplied by the host (sync or async depending on
/// `is_sync` feature)
///
/// Every call is one chip-select framing: CS is asserted before the first
/// byte and released after the last one.
#[maybe_async(AFIT)]
pub trait SpiTransport {
    /// Bring up the peripheral
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Shut down the peripheral
    fn deinit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Acquire exclusive use of the bus, waiting at most `timeout_ms`
    fn lock(&mut self, _timeout_ms: u32) -> Result<()> {
        Ok(())
    }

    /// Release the bus
    fn unlock(&mut self) {}

    /// Maximum number of bytes in the receive phase of one `transfer()`
    fn max_read_len(&self) -> usize {
        usize::MAX
    }

    /// Clock out `tx`, discarding what is received
    async fn send(&mut self, tx: &[u8]) -> Result<()>;

    /// Clock in `rx.len()` bytes
    async fn recv(&mut self, rx: &mut [u8]) -> Result<()>;

    /// Clock out `tx`, then clock in `rx.len()` bytes, under one chip select
    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;
}

/// `FlashBus` adapter for byte-stream SPI transports
///
/// Builds each command into one outbound frame of at most `N` bytes. Commands
/// with a read phase go through `transfer()`, all others through `send()`.
pub struct SpiBus<T, const N: usize = DEFAULT_FRAME_LEN> {
    transport: T,
}

impl<T> SpiBus<T> {
    /// Wrap an SPI transport with the default frame capacity
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T, const N: usize> SpiBus<T, N> {
    /// Wrap an SPI transport with a frame capacity of `N` bytes
    pub fn with_frame_capacity(transport: T) -> Self {
        Self { transport }
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Return the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }
}

/// Build the outbound frame for `cmd`
fn build_frame<const N: usize>(cmd: &FlashCommand<'_>) -> Result<Vec<u8, N>> {
    let mut frame = Vec::new();
    frame
        .resize(cmd.header_len(), 0)
        .map_err(|_| Error::FrameTooLarge)?;
    cmd.encode_header(&mut frame);
    frame
        .extend_from_slice(cmd.write_data)
        .map_err(|_| Error::FrameTooLarge)?;
    Ok(frame)
}

#[maybe_async(AFIT)]
impl<T: SpiTransport, const N: usize> FlashBus for SpiBus<T, N> {
    fn mode(&self) -> BusMode {
        BusMode::Spi
    }

    fn max_read_len(&self) -> usize {
        self.transport.max_read_len()
    }

    fn init(&mut self) -> Result<()> {
        self.transport.init()
    }

    fn deinit(&mut self) -> Result<()> {
        self.transport.deinit()
    }

    fn lock(&mut self, timeout_ms: u32) -> Result<()> {
        self.transport.lock(timeout_ms)
    }

    fn unlock(&mut self) {
        self.transport.unlock()
    }

    async fn execute(&mut self, cmd: &mut FlashCommand<'_>) -> Result<()> {
        let frame = build_frame::<N>(cmd)?;
        if cmd.has_read() {
            self.transport.transfer(&frame, cmd.read_buf).await
        } else {
            self.transport.send(&frame).await
        }
    }
}
