//! Flash command structure

use super::address::{encode_address, ADDRESS_LEN};
use super::opcodes::DUMMY_BYTE;

/// A single flash command: one chip-select framing on the bus
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct FlashCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 24-bit address, if the command has an address phase
    pub address: Option<u32>,

    /// Number of dummy cycles after the address
    pub dummy_cycles: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into
    pub read_buf: &'a mut [u8],
}

impl<'a> FlashCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI, CE)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a register read command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed read command (e.g., READ)
    pub fn read(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_cycles: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed write command (e.g., PP)
    pub fn write(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_cycles: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with an address and no data
    pub fn erase(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Number of dummy bytes on a single-line bus (8 cycles per byte)
    pub fn dummy_bytes(&self) -> usize {
        (self.dummy_cycles as usize).div_ceil(8)
    }

    /// Length of the opcode + address + dummy header on a single-line bus
    pub fn header_len(&self) -> usize {
        let address_len = if self.has_address() { ADDRESS_LEN } else { 0 };
        1 + address_len + self.dummy_bytes()
    }

    /// Encode opcode, address and dummy bytes into `buf`
    ///
    /// `buf` must be at least `header_len()` bytes long. Returns the number
    /// of bytes written.
    pub fn encode_header(&self, buf: &mut [u8]) -> usize {
        buf[0] = self.opcode;
        let mut len = 1;
        if let Some(addr) = self.address {
            buf[len..len + ADDRESS_LEN].copy_from_slice(&encode_address(addr));
            len += ADDRESS_LEN;
        }
        let dummy = self.dummy_bytes();
        buf[len..len + dummy].fill(DUMMY_BYTE);
        len + dummy
    }
}
