//! `embedded-hal` SPI binding
//!
//! With `is_sync`, [`EhSpi`] implements [`SpiTransport`] for any blocking
//! `embedded_hal::spi::SpiDevice`; otherwise for any
//! `embedded_hal_async::spi::SpiDevice`. The device owns chip select, so each
//! call maps onto one `SpiDevice` transaction.

use embedded_hal::spi::Operation;
use maybe_async::maybe_async;

use super::SpiTransport;
use crate::error::{Error, Result};

/// SPI transport over an `embedded-hal` `SpiDevice`
pub struct EhSpi<D> {
    device: D,
}

impl<D> EhSpi<D> {
    /// Wrap an SPI device
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Return the wrapped device
    pub fn into_inner(self) -> D {
        self.device
    }
}

fn bus_error<E: embedded_hal::spi::Error>(e: E) -> Error {
    log::error!("spi transaction failed: {:?}", e.kind());
    Error::Transport
}

#[cfg(feature = "is_sync")]
#[maybe_async(AFIT)]
impl<D: embedded_hal::spi::SpiDevice> SpiTransport for EhSpi<D> {
    async fn send(&mut self, tx: &[u8]) -> Result<()> {
        self.device.write(tx).map_err(bus_error)
    }

    async fn recv(&mut self, rx: &mut [u8]) -> Result<()> {
        self.device.read(rx).map_err(bus_error)
    }

    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.device
            .transaction(&mut [Operation::Write(tx), Operation::Read(rx)])
            .map_err(bus_error)
    }
}

#[cfg(not(feature = "is_sync"))]
#[maybe_async(AFIT)]
impl<D: embedded_hal_async::spi::SpiDevice> SpiTransport for EhSpi<D> {
    async fn send(&mut self, tx: &[u8]) -> Result<()> {
        self.device.write(tx).await.map_err(bus_error)
    }

    async fn recv(&mut self, rx: &mut [u8]) -> Result<()> {
        self.device.read(rx).await.map_err(bus_error)
    }

    async fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.device
            .transaction(&mut [Operation::Write(tx), Operation::Read(rx)])
            .await
            .map_err(bus_error)
    }
}
