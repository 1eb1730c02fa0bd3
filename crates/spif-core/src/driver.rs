//! Driver state
//!
//! [`FlashDriver`] owns the bus and the platform services for exactly one
//! flash device. It is created by [`FlashDriver::init`], which probes the
//! chip and selects its geometry, and is used for every later operation.
//! Bindings are fixed for the lifetime of the driver.

use crate::config::{DriverConfig, PollConfig, UnknownChipPolicy};
use crate::error::{Error, Result};
use crate::geometry::{find_geometry, FlashGeometry, JedecId};
use crate::platform::Platform;
use crate::protocol;
use crate::spi::{opcodes, StatusRegister1};
use crate::transport::{BusLock, BusMode, FlashBus};
use maybe_async::maybe_async;

/// Handle to one initialized flash device
pub struct FlashDriver<B, P> {
    bus: B,
    platform: P,
    config: DriverConfig,
    jedec_id: JedecId,
    geometry_index: usize,
    geometry: FlashGeometry,
}

impl<B: FlashBus, P: Platform> FlashDriver<B, P> {
    /// Bring up the bus, identify the chip and select its geometry
    ///
    /// An unrecognised JEDEC ID is handled according to
    /// `config.unknown_chip`. A selected entry that fails
    /// [`FlashGeometry::is_valid`] is rejected with `Error::InvalidGeometry`.
    #[maybe_async]
    pub async fn init(mut bus: B, platform: P, config: DriverConfig) -> Result<Self> {
        bus.init()?;

        let jedec_id = protocol::read_jedec_id(&mut bus).await?;
        log::debug!("JEDEC ID: {}", jedec_id);

        let geometry_index = match find_geometry(config.chips, jedec_id) {
            Some(index) => index,
            None => match config.unknown_chip {
                UnknownChipPolicy::FallbackToFirst if !config.chips.is_empty() => {
                    log::warn!(
                        "unknown flash (JEDEC ID {}), assuming {}",
                        jedec_id,
                        config.chips[0].name
                    );
                    0
                }
                _ => {
                    log::error!("unsupported flash (JEDEC ID {})", jedec_id);
                    return Err(Error::UnsupportedChip(jedec_id));
                }
            },
        };

        let geometry = config.chips[geometry_index];
        if !geometry.is_valid() {
            log::error!(
                "geometry of {} is unusable (page {} B, sector {} B, block {} B)",
                geometry.name,
                geometry.page_size,
                geometry.sector_size,
                geometry.block_size
            );
            return Err(Error::InvalidGeometry);
        }

        log::info!(
            "flash {} over {}: {} KiB, block {} B, sector {} B, page {} B",
            geometry.name,
            bus.mode(),
            geometry.chip_size / 1024,
            geometry.block_size,
            geometry.sector_size,
            geometry.page_size
        );

        Ok(Self {
            bus,
            platform,
            config,
            jedec_id,
            geometry_index,
            geometry,
        })
    }

    /// Geometry of the detected chip
    pub fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    /// Index of the detected chip in the geometry table
    pub fn geometry_index(&self) -> usize {
        self.geometry_index
    }

    /// JEDEC ID read at initialization
    pub fn jedec_id(&self) -> JedecId {
        self.jedec_id
    }

    /// The active driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Transport variant of the bus
    pub fn mode(&self) -> BusMode {
        self.bus.mode()
    }

    /// Get a reference to the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the bus
    ///
    /// Commands issued directly on the bus bypass the bus lock.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        if self.geometry.contains_range(addr, len) {
            Ok(())
        } else {
            Err(Error::AddressOutOfBounds)
        }
    }

    /// Read `buf.len()` bytes starting at `addr`
    #[maybe_async]
    pub async fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        protocol::read(&mut self.bus, addr, buf).await
    }

    /// Read `buf.len()` bytes starting at `addr` using FAST_READ
    #[maybe_async]
    pub async fn fast_read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        protocol::fast_read(&mut self.bus, addr, buf).await
    }

    /// Read from the SFDP address space
    #[maybe_async]
    pub async fn read_sfdp(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        protocol::read_sfdp(&mut self.bus, addr, buf).await
    }

    /// Program up to one page at `addr`
    ///
    /// Fails with `Error::PageBoundary` before any bus activity if the data
    /// is larger than a page or crosses a page boundary.
    #[maybe_async]
    pub async fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        protocol::check_page_bounds(addr, data.len(), self.geometry.page_size)?;
        if data.is_empty() {
            return Ok(());
        }

        let mut bus = BusLock::acquire(&mut self.bus, self.config.lock_timeout_ms)?;
        protocol::page_program(
            &mut *bus,
            &mut self.platform,
            self.config.program_poll,
            self.geometry.page_size,
            addr,
            data,
        )
        .await
    }

    /// Program an arbitrary range, split at page boundaries
    ///
    /// The target range must already be erased.
    #[maybe_async]
    pub async fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;

        let page_size = self.geometry.page_size;
        let mut bus = BusLock::acquire(&mut self.bus, self.config.lock_timeout_ms)?;
        let mut offset = 0usize;

        while offset < data.len() {
            let current = addr + offset as u32;
            let to_page_end = (page_size - (current & (page_size - 1))) as usize;
            let chunk_len = core::cmp::min(to_page_end, data.len() - offset);

            protocol::page_program(
                &mut *bus,
                &mut self.platform,
                self.config.program_poll,
                page_size,
                current,
                &data[offset..offset + chunk_len],
            )
            .await?;
            offset += chunk_len;
        }

        Ok(())
    }

    #[maybe_async]
    async fn erase_at(&mut self, opcode: u8, addr: u32, poll: PollConfig) -> Result<()> {
        self.check_range(addr, 1)?;
        log::debug!("erase 0x{:02X} at 0x{:06X}", opcode, addr);

        let mut bus = BusLock::acquire(&mut self.bus, self.config.lock_timeout_ms)?;
        protocol::erase(&mut *bus, &mut self.platform, poll, opcode, addr).await
    }

    /// Erase the 4 KiB sector containing `addr`
    #[maybe_async]
    pub async fn sector_erase(&mut self, addr: u32) -> Result<()> {
        let poll = self.config.erase_poll;
        self.erase_at(opcodes::SE_20, addr, poll).await
    }

    /// Erase the 32 KiB block containing `addr`
    #[maybe_async]
    pub async fn block_erase_32(&mut self, addr: u32) -> Result<()> {
        let poll = self.config.erase_poll;
        self.erase_at(opcodes::BE_52, addr, poll).await
    }

    /// Erase the 64 KiB block containing `addr`
    #[maybe_async]
    pub async fn block_erase_64(&mut self, addr: u32) -> Result<()> {
        let poll = self.config.erase_poll;
        self.erase_at(opcodes::BE_D8, addr, poll).await
    }

    /// Erase the entire chip
    #[maybe_async]
    pub async fn chip_erase(&mut self) -> Result<()> {
        log::debug!("chip erase ({})", self.geometry.name);
        let mut bus = BusLock::acquire(&mut self.bus, self.config.lock_timeout_ms)?;
        protocol::chip_erase(&mut *bus, &mut self.platform, self.config.chip_erase_poll).await
    }

    /// Read status register 1
    #[maybe_async]
    pub async fn read_status(&mut self) -> Result<StatusRegister1> {
        protocol::read_status1(&mut self.bus).await
    }

    /// Read status registers 1, 2 and 3
    #[maybe_async]
    pub async fn read_status_registers(&mut self) -> Result<[u8; 3]> {
        let sr1 = protocol::read_status1(&mut self.bus).await?;
        let sr2 = protocol::read_status2(&mut self.bus).await?;
        let sr3 = protocol::read_status3(&mut self.bus).await?;
        Ok([sr1.bits(), sr2, sr3])
    }

    /// Shut down the bus and hand back the bus and platform
    pub fn release(mut self) -> Result<(B, P)> {
        self.bus.deinit()?;
        Ok((self.bus, self.platform))
    }
}
