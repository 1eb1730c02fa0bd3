//! Status register definitions

use bitflags::bitflags;

bitflags! {
    /// Status Register 1 (read with RDSR, 0x05)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister1: u8 {
        /// Erase or program in progress
        const BUSY = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Top/Bottom Protect
        const TB   = 1 << 5;
        /// Sector/Block Protect
        const SEC  = 1 << 6;
        /// Status Register Protect 0
        const SRP0 = 1 << 7;
    }
}

impl StatusRegister1 {
    /// Returns true while an erase or program operation is running
    pub const fn is_busy(&self) -> bool {
        self.contains(Self::BUSY)
    }

    /// Returns true if the write enable latch is set
    pub const fn write_enabled(&self) -> bool {
        self.contains(Self::WEL)
    }
}
