//! Shared flash handle for multi-threaded hosts
//!
//! [`SharedFlash`] serializes whole operations across threads: the mutex is
//! held from the first command of a sequence to the last, so no other caller
//! can interpose a command between write enable and write disable.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use crate::driver::FlashDriver;
use crate::error::{Error, Result};
use crate::geometry::{FlashGeometry, JedecId};
use crate::platform::Platform;
use crate::spi::StatusRegister1;
use crate::transport::FlashBus;

const LOCK_RETRY: Duration = Duration::from_micros(200);

/// Cloneable, thread-safe handle to one flash device
pub struct SharedFlash<B, P> {
    inner: Arc<Mutex<FlashDriver<B, P>>>,
    lock_timeout: Duration,
}

impl<B, P> Clone for SharedFlash<B, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<B: FlashBus, P: Platform> SharedFlash<B, P> {
    /// Share an initialized driver
    ///
    /// Callers wait at most `config().lock_timeout_ms` for their turn.
    pub fn new(driver: FlashDriver<B, P>) -> Self {
        let lock_timeout = Duration::from_millis(driver.config().lock_timeout_ms as u64);
        Self {
            inner: Arc::new(Mutex::new(driver)),
            lock_timeout,
        }
    }

    fn acquire(&self) -> Result<MutexGuard<'_, FlashDriver<B, P>>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    log::warn!("flash lock poisoned by a panicked holder, recovering");
                    return Ok(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockTimeout);
                    }
                    thread::sleep(LOCK_RETRY);
                }
            }
        }
    }

    /// Run `f` with exclusive access to the driver
    pub fn with<R>(&self, f: impl FnOnce(&mut FlashDriver<B, P>) -> Result<R>) -> Result<R> {
        let mut driver = self.acquire()?;
        f(&mut driver)
    }

    /// See [`FlashDriver::read`]
    pub fn read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.with(|d| d.read(addr, buf))
    }

    /// See [`FlashDriver::fast_read`]
    pub fn fast_read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.with(|d| d.fast_read(addr, buf))
    }

    /// See [`FlashDriver::page_program`]
    pub fn page_program(&self, addr: u32, data: &[u8]) -> Result<()> {
        self.with(|d| d.page_program(addr, data))
    }

    /// See [`FlashDriver::write`]
    pub fn write(&self, addr: u32, data: &[u8]) -> Result<()> {
        self.with(|d| d.write(addr, data))
    }

    /// See [`FlashDriver::sector_erase`]
    pub fn sector_erase(&self, addr: u32) -> Result<()> {
        self.with(|d| d.sector_erase(addr))
    }

    /// See [`FlashDriver::block_erase_32`]
    pub fn block_erase_32(&self, addr: u32) -> Result<()> {
        self.with(|d| d.block_erase_32(addr))
    }

    /// See [`FlashDriver::block_erase_64`]
    pub fn block_erase_64(&self, addr: u32) -> Result<()> {
        self.with(|d| d.block_erase_64(addr))
    }

    /// See [`FlashDriver::chip_erase`]
    pub fn chip_erase(&self) -> Result<()> {
        self.with(|d| d.chip_erase())
    }

    /// See [`FlashDriver::read_status`]
    pub fn read_status(&self) -> Result<StatusRegister1> {
        self.with(|d| d.read_status())
    }

    /// JEDEC ID of the shared device
    pub fn jedec_id(&self) -> Result<JedecId> {
        self.with(|d| Ok(d.jedec_id()))
    }

    /// Geometry of the shared device
    pub fn geometry(&self) -> Result<FlashGeometry> {
        self.with(|d| Ok(*d.geometry()))
    }
}
