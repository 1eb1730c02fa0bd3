//! Emulated flash device

use spif_core::geometry::{FlashGeometry, JedecId};
use spif_core::spi::{opcodes, StatusRegister1};
use spif_core::{Error, Result};

/// SFDP header returned at SFDP address 0
const SFDP_HEADER: [u8; 8] = [b'S', b'F', b'D', b'P', 0x06, 0x01, 0x00, 0xFF];

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC ID reported by RDID
    pub jedec_id: JedecId,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Status reads that report BUSY after each program or erase
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        // W25Q128JV
        Self {
            jedec_id: JedecId::new(0xEF, 0x40, 0x18),
            size: 16 * 1024 * 1024,
            page_size: 256,
            busy_polls: 1,
        }
    }
}

impl DummyConfig {
    /// Emulate the device described by a geometry table entry
    pub fn from_geometry(geometry: &FlashGeometry) -> Self {
        Self {
            jedec_id: geometry.jedec_id(),
            size: geometry.chip_size as usize,
            page_size: geometry.page_size as usize,
            ..Self::default()
        }
    }

    /// Set the number of BUSY status reads after each program or erase
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }
}

/// One command as seen by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Opcode byte
    pub opcode: u8,
    /// Address phase, if any
    pub address: Option<u32>,
    /// Bytes written after the address/dummy phases
    pub write_len: usize,
    /// Bytes read after the address/dummy phases
    pub read_len: usize,
}

/// Returns true if `opcode` carries a 24-bit address phase
pub fn opcode_has_address(opcode: u8) -> bool {
    matches!(
        opcode,
        opcodes::READ
            | opcodes::FAST_READ
            | opcodes::RDSFDP
            | opcodes::PP
            | opcodes::SE_20
            | opcodes::BE_52
            | opcodes::BE_D8
    )
}

/// Number of dummy bytes following the address of `opcode`
pub fn opcode_dummy_bytes(opcode: u8) -> usize {
    match opcode {
        opcodes::FAST_READ | opcodes::RDSFDP => 1,
        _ => 0,
    }
}

/// In-memory serial NOR flash
///
/// Programming can only clear bits, erase sets them, and page program wraps
/// inside its page like real parts do. Every command that reaches the chip
/// is recorded.
pub struct DummyChip {
    config: DummyConfig,
    data: Vec<u8>,
    status_reg1: StatusRegister1,
    status_reg2: u8,
    status_reg3: u8,
    busy_remaining: u32,
    stuck_busy: bool,
    fail_opcode: Option<u8>,
    log: Vec<Transaction>,
}

impl DummyChip {
    /// Create an erased chip
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            status_reg1: StatusRegister1::empty(),
            status_reg2: 0x02,
            status_reg3: 0x60,
            busy_remaining: 0,
            stuck_busy: false,
            fail_opcode: None,
            log: Vec::new(),
        }
    }

    /// Create a chip with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut chip = Self::new(config);
        let len = core::cmp::min(initial_data.len(), chip.data.len());
        chip.data[..len].copy_from_slice(&initial_data[..len]);
        chip
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Commands received so far
    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    /// Opcodes received so far
    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(|t| t.opcode).collect()
    }

    /// Forget all recorded commands
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Keep the BUSY bit set forever after the next program or erase
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Fail every command with this opcode at the bus level
    pub fn fail_on(&mut self, opcode: Option<u8>) {
        self.fail_opcode = opcode;
    }

    fn start_busy(&mut self) {
        self.status_reg1.remove(StatusRegister1::WEL);
        if self.stuck_busy || self.config.busy_polls > 0 {
            self.status_reg1.insert(StatusRegister1::BUSY);
            self.busy_remaining = self.config.busy_polls;
        }
    }

    fn read_status1(&mut self) -> u8 {
        let status = self.status_reg1.bits();
        if self.status_reg1.is_busy() && !self.stuck_busy {
            self.busy_remaining = self.busy_remaining.saturating_sub(1);
            if self.busy_remaining == 0 {
                self.status_reg1.remove(StatusRegister1::BUSY);
            }
        }
        status
    }

    fn handle_read(&self, addr: u32, buf: &mut [u8]) {
        // The internal address counter wraps at the end of the array
        let size = self.data.len();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.data[(addr as usize + i) % size];
        }
    }

    fn handle_page_program(&mut self, addr: u32, data: &[u8]) {
        let page_size = self.config.page_size;
        let page_base = (addr as usize & !(page_size - 1)) % self.data.len();
        let mut offset = addr as usize & (page_size - 1);
        for &byte in data {
            self.data[page_base + offset] &= byte;
            offset = (offset + 1) % page_size;
        }
    }

    fn handle_erase(&mut self, addr: u32, erase_size: usize) {
        let aligned = (addr as usize & !(erase_size - 1)) % self.data.len();
        let end = core::cmp::min(aligned + erase_size, self.data.len());
        self.data[aligned..end].fill(0xFF);
    }

    /// Execute one command
    ///
    /// While BUSY is set every command except the status reads is ignored.
    /// Program and erase commands without a preceding WREN are ignored.
    pub fn execute(
        &mut self,
        opcode: u8,
        address: Option<u32>,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<()> {
        self.log.push(Transaction {
            opcode,
            address,
            write_len: write.len(),
            read_len: read.len(),
        });

        if self.fail_opcode == Some(opcode) {
            return Err(Error::Transport);
        }
        if opcode_has_address(opcode) != address.is_some() {
            return Err(Error::InvalidCommand);
        }

        let busy = self.status_reg1.is_busy();
        if busy && !matches!(opcode, opcodes::RDSR | opcodes::RDSR2 | opcodes::RDSR3) {
            log::warn!("dummy: opcode 0x{:02X} ignored while busy", opcode);
            return Ok(());
        }

        let addr = address.unwrap_or(0);
        let is_write_class = matches!(
            opcode,
            opcodes::PP
                | opcodes::SE_20
                | opcodes::BE_52
                | opcodes::BE_D8
                | opcodes::CE_C7
                | opcodes::CE_60
        );
        if is_write_class && !self.status_reg1.write_enabled() {
            log::warn!("dummy: opcode 0x{:02X} ignored, write enable latch clear", opcode);
            return Ok(());
        }

        match opcode {
            opcodes::RDID => {
                let id = self.config.jedec_id.to_bytes();
                for (i, byte) in read.iter_mut().enumerate() {
                    *byte = id.get(i).copied().unwrap_or(0xFF);
                }
            }
            opcodes::RDSR => {
                if let Some(first) = read.first_mut() {
                    *first = self.read_status1();
                }
            }
            opcodes::RDSR2 => read.fill(self.status_reg2),
            opcodes::RDSR3 => read.fill(self.status_reg3),
            opcodes::RDSFDP => {
                for (i, byte) in read.iter_mut().enumerate() {
                    *byte = SFDP_HEADER.get(addr as usize + i).copied().unwrap_or(0xFF);
                }
            }
            opcodes::WREN => self.status_reg1.insert(StatusRegister1::WEL),
            opcodes::WRDI => self.status_reg1.remove(StatusRegister1::WEL),
            opcodes::READ | opcodes::FAST_READ => self.handle_read(addr, read),
            opcodes::PP => {
                self.handle_page_program(addr, write);
                self.start_busy();
            }
            opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8 => {
                let erase_size = match opcode {
                    opcodes::SE_20 => opcodes::SECTOR_4K,
                    opcodes::BE_52 => opcodes::BLOCK_32K,
                    _ => opcodes::BLOCK_64K,
                };
                self.handle_erase(addr, erase_size as usize);
                self.start_busy();
            }
            opcodes::CE_C7 | opcodes::CE_60 => {
                self.data.fill(0xFF);
                self.start_busy();
            }
            _ => return Err(Error::OpcodeNotSupported),
        }

        Ok(())
    }
}
