//! QSPI transport with a hardware phase generator

use maybe_async::maybe_async;

use super::{BusMode, FlashBus};
use crate::error::{Error, Result};
use crate::spi::FlashCommand;

/// Data phase of a QSPI command
#[derive(Debug)]
pub enum QspiData<'a> {
    /// No data phase
    None,
    /// Transmit these bytes after the address/dummy phases
    Write(&'a [u8]),
    /// Receive into this buffer after the address/dummy phases
    Read(&'a mut [u8]),
}

/// A command as handed to the QSPI peripheral
///
/// The instruction, address and data phases are single-line; the 24-bit
/// address phase is skipped when `address` is `None`.
#[derive(Debug)]
pub struct QspiCommand<'a> {
    /// Instruction byte
    pub opcode: u8,
    /// 24-bit address, or no address phase
    pub address: Option<u32>,
    /// Dummy cycles between address and data
    pub dummy_cycles: u8,
    /// Data phase
    pub data: QspiData<'a>,
}

/// QSPI peripheral supplied by the host (sync or async depending on
/// `is_sync` feature)
#[maybe_async(AFIT)]
pub trait QspiTransport {
    /// Bring up the peripheral
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Shut down the peripheral
    fn deinit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Acquire exclusive use of the peripheral, waiting at most `timeout_ms`
    fn lock(&mut self, _timeout_ms: u32) -> Result<()> {
        Ok(())
    }

    /// Release the peripheral
    fn unlock(&mut self) {}

    /// Maximum number of bytes in one receive phase
    fn max_read_len(&self) -> usize {
        usize::MAX
    }

    /// Issue one command: instruction, optional address, dummy cycles and
    /// the data phase
    async fn transfer(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()>;
}

/// `FlashBus` adapter for QSPI peripherals
///
/// The opcode and address are handed to the peripheral's phase generator;
/// they are never placed in the data phase.
pub struct QspiBus<T> {
    transport: T,
}

impl<T> QspiBus<T> {
    /// Wrap a QSPI transport
    pub fn new(transport: T) -> Self {
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

/// Translate a flash command into the peripheral's phase description
///
/// A command with both a write and a read phase has no QSPI equivalent.
fn to_qspi<'b>(cmd: &'b mut FlashCommand<'_>) -> Result<QspiCommand<'b>> {
    let data = match (cmd.has_write(), cmd.has_read()) {
        (false, false) => QspiData::None,
        (true, false) => QspiData::Write(cmd.write_data),
        (false, true) => QspiData::Read(&mut *cmd.read_buf),
        (true, true) => return Err(Error::InvalidCommand),
    };
    Ok(QspiCommand {
        opcode: cmd.opcode,
        address: cmd.address,
        dummy_cycles: cmd.dummy_cycles,
        data,
    })
}

#[maybe_async(AFIT)]
impl<T: QspiTransport> FlashBus for QspiBus<T> {
    fn mode(&self) -> BusMode {
        BusMode::Qspi
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
        let mut qcmd = to_qspi(cmd)?;
        self.transport.transfer(&mut qcmd).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_register_read_has_no_address_phase() {
        let mut id = [0u8; 3];
        let mut cmd = FlashCommand::read_reg(opcodes::RDID, &mut id);
        let qcmd = to_qspi(&mut cmd).unwrap();
        assert_eq!(qcmd.opcode, opcodes::RDID);
        assert_eq!(qcmd.address, None);
        assert!(matches!(qcmd.data, QspiData::Read(buf) if buf.len() == 3));
    }

    #[test]
    fn test_program_keeps_address_out_of_data() {
        let data = [0x5A; 4];
        let mut cmd = FlashCommand::write(opcodes::PP, 0x1000, &data);
        let qcmd = to_qspi(&mut cmd).unwrap();
        assert_eq!(qcmd.address, Some(0x1000));
        assert!(matches!(qcmd.data, QspiData::Write(d) if d == &[0x5A; 4]));
    }

    #[test]
    fn test_erase_has_no_data_phase() {
        let mut cmd = FlashCommand::erase(opcodes::SE_20, 0x2000);
        let qcmd = to_qspi(&mut cmd).unwrap();
        assert!(matches!(qcmd.data, QspiData::None));
    }

    #[test]
    fn test_write_then_read_rejected() {
        let tx = [1u8];
        let mut rx = [0u8; 1];
        let mut cmd = FlashCommand {
            opcode: 0x42,
            address: None,
            dummy_cycles: 0,
            write_data: &tx,
            read_buf: &mut rx,
        };
        assert_eq!(to_qspi(&mut cmd).unwrap_err(), Error::InvalidCommand);
    }
}
