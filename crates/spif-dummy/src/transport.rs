//! SPI and QSPI front ends for the emulated chip

use spif_core::spi::ADDRESS_LEN;
use spif_core::transport::{QspiCommand, QspiData, QspiTransport, SpiTransport};
use spif_core::{Error, Result};

use crate::chip::{opcode_dummy_bytes, opcode_has_address, DummyChip};

/// Bus-level counters shared by both front ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Number of bus framings (one per transport call)
    pub frames: usize,
    /// Number of successful `lock()` calls
    pub locks: usize,
    /// Number of `unlock()` calls
    pub unlocks: usize,
    /// `init()` calls
    pub inits: usize,
    /// `deinit()` calls
    pub deinits: usize,
}

#[derive(Debug, Default)]
struct BusState {
    stats: BusStats,
    locked: bool,
}

impl BusState {
    fn lock(&mut self) -> Result<()> {
        // A second lock without unlock means a sequence leaked its guard
        if self.locked {
            return Err(Error::LockTimeout);
        }
        self.locked = true;
        self.stats.locks += 1;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
        self.stats.unlocks += 1;
    }
}

/// Byte-stream SPI front end
///
/// Decodes each outbound frame (opcode, address, dummy bytes, data) the way
/// the chip's shift register would.
pub struct DummySpi {
    chip: DummyChip,
    state: BusState,
    max_read_len: usize,
}

impl DummySpi {
    /// Attach a chip
    pub fn new(chip: DummyChip) -> Self {
        Self {
            chip,
            state: BusState::default(),
            max_read_len: usize::MAX,
        }
    }

    /// Limit the receive phase of one transfer
    pub fn with_max_read_len(mut self, len: usize) -> Self {
        self.max_read_len = len;
        self
    }

    /// Get a reference to the chip
    pub fn chip(&self) -> &DummyChip {
        &self.chip
    }

    /// Get a mutable reference to the chip
    pub fn chip_mut(&mut self) -> &mut DummyChip {
        &mut self.chip
    }

    /// Return the chip
    pub fn into_chip(self) -> DummyChip {
        self.chip
    }

    /// Bus-level counters
    pub fn stats(&self) -> BusStats {
        self.state.stats
    }

    fn frame(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.state.stats.frames += 1;

        let Some((&opcode, rest)) = tx.split_first() else {
            // Nothing shifted in: the data line floats high
            rx.fill(0xFF);
            return Ok(());
        };

        let (address, rest) = if opcode_has_address(opcode) {
            if rest.len() < ADDRESS_LEN {
                return Err(Error::InvalidCommand);
            }
            let addr = u32::from_be_bytes([0, rest[0], rest[1], rest[2]]);
            (Some(addr), &rest[ADDRESS_LEN..])
        } else {
            (None, rest)
        };

        let dummy = opcode_dummy_bytes(opcode);
        if rest.len() < dummy {
            return Err(Error::InvalidCommand);
        }
        self.chip.execute(opcode, address, &rest[dummy..], rx)
    }
}

impl SpiTransport for DummySpi {
    fn init(&mut self) -> Result<()> {
        self.state.stats.inits += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        self.state.stats.deinits += 1;
        Ok(())
    }

    fn lock(&mut self, _timeout_ms: u32) -> Result<()> {
        self.state.lock()
    }

    fn unlock(&mut self) {
        self.state.unlock()
    }

    fn max_read_len(&self) -> usize {
        self.max_read_len
    }

    fn send(&mut self, tx: &[u8]) -> Result<()> {
        self.frame(tx, &mut [])
    }

    fn recv(&mut self, rx: &mut [u8]) -> Result<()> {
        self.frame(&[], rx)
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.frame(tx, rx)
    }
}

/// QSPI front end
///
/// Receives the instruction, address and data phases separately, like a
/// QSPI peripheral's phase generator.
pub struct DummyQspi {
    chip: DummyChip,
    state: BusState,
    last_address: Option<Option<u32>>,
}

impl DummyQspi {
    /// Attach a chip
    pub fn new(chip: DummyChip) -> Self {
        Self {
            chip,
            state: BusState::default(),
            last_address: None,
        }
    }

    /// Get a reference to the chip
    pub fn chip(&self) -> &DummyChip {
        &self.chip
    }

    /// Get a mutable reference to the chip
    pub fn chip_mut(&mut self) -> &mut DummyChip {
        &mut self.chip
    }

    /// Return the chip
    pub fn into_chip(self) -> DummyChip {
        self.chip
    }

    /// Bus-level counters
    pub fn stats(&self) -> BusStats {
        self.state.stats
    }

    /// Address phase of the last command (`Some(None)` for no address)
    pub fn last_address(&self) -> Option<Option<u32>> {
        self.last_address
    }
}

impl QspiTransport for DummyQspi {
    fn init(&mut self) -> Result<()> {
        self.state.stats.inits += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        self.state.stats.deinits += 1;
        Ok(())
    }

    fn lock(&mut self, _timeout_ms: u32) -> Result<()> {
        self.state.lock()
    }

    fn unlock(&mut self) {
        self.state.unlock()
    }

    fn transfer(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        self.state.stats.frames += 1;
        self.last_address = Some(cmd.address);

        if cmd.dummy_cycles as usize != opcode_dummy_bytes(cmd.opcode) * 8 {
            return Err(Error::InvalidCommand);
        }

        match &mut cmd.data {
            QspiData::None => self.chip.execute(cmd.opcode, cmd.address, &[], &mut []),
            QspiData::Write(data) => self.chip.execute(cmd.opcode, cmd.address, data, &mut []),
            QspiData::Read(buf) => self.chip.execute(cmd.opcode, cmd.address, &[], buf),
        }
    }
}
