//! Standard JEDEC SPI NOR flash opcodes
//!
//! Only the single-I/O, 3-byte address command set is used by the driver.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears the WEL bit in status register 1
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status registers
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, capacity)
pub const RDID: u8 = 0x9F;
/// Read SFDP (JEDEC JESD216)
pub const RDSFDP: u8 = 0x5A;

// ============================================================================
// Read
// ============================================================================

/// Read Data (up to ~33 MHz, no dummy cycles)
pub const READ: u8 = 0x03;
/// Fast Read (8 dummy cycles, up to max frequency)
pub const FAST_READ: u8 = 0x0B;

/// Dummy cycles required by FAST_READ and RDSFDP
pub const FAST_READ_DUMMY_CYCLES: u8 = 8;

/// Value clocked out on MOSI during dummy bytes
pub const DUMMY_BYTE: u8 = 0xFF;

// ============================================================================
// Program / erase
// ============================================================================

/// Page Program
pub const PP: u8 = 0x02;
/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase
pub const CE_C7: u8 = 0xC7;
/// Chip Erase (alternate opcode)
pub const CE_60: u8 = 0x60;

/// Size erased by SE_20
pub const SECTOR_4K: u32 = 4 * 1024;
/// Size erased by BE_52
pub const BLOCK_32K: u32 = 32 * 1024;
/// Size erased by BE_D8
pub const BLOCK_64K: u32 = 64 * 1024;
