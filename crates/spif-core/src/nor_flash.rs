//! `embedded-storage` NOR flash traits for [`FlashDriver`]

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

use crate::driver::FlashDriver;
use crate::error::Error;
use crate::platform::Platform;
use crate::spi::opcodes::{BLOCK_32K, BLOCK_64K, SECTOR_4K};
use crate::transport::FlashBus;

impl NorFlashError for Error {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::AddressOutOfBounds => NorFlashErrorKind::OutOfBounds,
            Error::PageBoundary | Error::InvalidAlignment => NorFlashErrorKind::NotAligned,
            _ => NorFlashErrorKind::Other,
        }
    }
}

impl<B: FlashBus, P: Platform> ErrorType for FlashDriver<B, P> {
    type Error = Error;
}

impl<B: FlashBus, P: Platform> ReadNorFlash for FlashDriver<B, P> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Error> {
        FlashDriver::read(self, offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.geometry().chip_size as usize
    }
}

impl<B: FlashBus, P: Platform> NorFlash for FlashDriver<B, P> {
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = SECTOR_4K as usize;

    /// Erase `[from, to)` with the largest block erases the range allows
    ///
    /// 64 KiB block erase is only used on parts whose erase block is at
    /// least 64 KiB.
    fn erase(&mut self, from: u32, to: u32) -> Result<(), Error> {
        if from > to || from % SECTOR_4K != 0 || to % SECTOR_4K != 0 {
            return Err(Error::InvalidAlignment);
        }
        if to > self.geometry().chip_size {
            return Err(Error::AddressOutOfBounds);
        }

        let use_64k = self.geometry().block_size >= BLOCK_64K;
        let mut addr = from;
        while addr < to {
            let remaining = to - addr;
            if use_64k && addr % BLOCK_64K == 0 && remaining >= BLOCK_64K {
                self.block_erase_64(addr)?;
                addr += BLOCK_64K;
            } else if addr % BLOCK_32K == 0 && remaining >= BLOCK_32K {
                self.block_erase_32(addr)?;
                addr += BLOCK_32K;
            } else {
                self.sector_erase(addr)?;
                addr += SECTOR_4K;
            }
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Error> {
        FlashDriver::write(self, offset, bytes)
    }
}
