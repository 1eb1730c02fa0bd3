//! Serial NOR command sequences
//!
//! Every write-class operation (program, erase) runs the same sequence:
//!
//! ```text
//! WREN -> wait idle -> command -> wait idle -> WRDI
//! ```
//!
//! Read-class operations issue a single command and never touch the write
//! enable latch.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy and other executors)

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::geometry::JedecId;
use crate::platform::Platform;
use crate::spi::{opcodes, FlashCommand, StatusRegister1};
use crate::transport::FlashBus;
use maybe_async::maybe_async;

/// Read the 3-byte JEDEC ID (manufacturer, memory type, capacity)
#[maybe_async]
pub async fn read_jedec_id<B: FlashBus + ?Sized>(bus: &mut B) -> Result<JedecId> {
    let mut buf = [0u8; 3];
    let mut cmd = FlashCommand::read_reg(opcodes::RDID, &mut buf);
    bus.execute(&mut cmd).await?;
    Ok(JedecId::from_bytes(buf))
}

/// Read the status register 1
#[maybe_async]
pub async fn read_status1<B: FlashBus + ?Sized>(bus: &mut B) -> Result<StatusRegister1> {
    let mut buf = [0u8; 1];
    let mut cmd = FlashCommand::read_reg(opcodes::RDSR, &mut buf);
    bus.execute(&mut cmd).await?;
    Ok(StatusRegister1::from_bits_retain(buf[0]))
}

/// Read the status register 2
#[maybe_async]
pub async fn read_status2<B: FlashBus + ?Sized>(bus: &mut B) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = FlashCommand::read_reg(opcodes::RDSR2, &mut buf);
    bus.execute(&mut cmd).await?;
    Ok(buf[0])
}

/// Read the status register 3
#[maybe_async]
pub async fn read_status3<B: FlashBus + ?Sized>(bus: &mut B) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = FlashCommand::read_reg(opcodes::RDSR3, &mut buf);
    bus.execute(&mut cmd).await?;
    Ok(buf[0])
}

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<B: FlashBus + ?Sized>(bus: &mut B) -> Result<()> {
    let mut cmd = FlashCommand::simple(opcodes::WREN);
    bus.execute(&mut cmd).await
}

/// Send the Write Disable command
#[maybe_async]
pub async fn write_disable<B: FlashBus + ?Sized>(bus: &mut B) -> Result<()> {
    let mut cmd = FlashCommand::simple(opcodes::WRDI);
    bus.execute(&mut cmd).await
}

/// Wait for the BUSY bit to clear
///
/// Reads status register 1 up to `poll.max_attempts` times, sleeping
/// `poll.delay_us` between reads. Returns the first status with BUSY clear,
/// or `Error::Timeout` once every attempt has observed BUSY.
#[maybe_async]
pub async fn wait_idle<B: FlashBus + ?Sized, P: Platform + ?Sized>(
    bus: &mut B,
    platform: &mut P,
    poll: PollConfig,
) -> Result<StatusRegister1> {
    for attempt in 0..poll.max_attempts {
        let status = read_status1(bus).await?;
        if !status.is_busy() {
            return Ok(status);
        }
        if attempt + 1 < poll.max_attempts && poll.delay_us > 0 {
            platform.delay_us(poll.delay_us).await;
        }
    }

    log::warn!(
        "flash still busy after {} status polls ({} us)",
        poll.max_attempts,
        poll.budget_us()
    );
    Err(Error::Timeout)
}

/// Check that `len` bytes at `addr` lie within a single page
///
/// Fails with `Error::InvalidGeometry` if `page_size` is not a power of two.
pub fn check_page_bounds(addr: u32, len: usize, page_size: u32) -> Result<()> {
    if !page_size.is_power_of_two() {
        return Err(Error::InvalidGeometry);
    }
    let offset = (addr & (page_size - 1)) as usize;
    if len > page_size as usize || offset + len > page_size as usize {
        return Err(Error::PageBoundary);
    }
    Ok(())
}

/// Run one write-class command inside the enable/idle/disable bracket
#[maybe_async]
async fn bracketed<B: FlashBus + ?Sized, P: Platform + ?Sized>(
    bus: &mut B,
    platform: &mut P,
    poll: PollConfig,
    cmd: &mut FlashCommand<'_>,
) -> Result<()> {
    write_enable(bus).await?;
    wait_idle(bus, platform, poll).await?;
    bus.execute(cmd).await?;
    wait_idle(bus, platform, poll).await?;
    write_disable(bus).await
}

/// Program up to one page
///
/// The data must not cross a page boundary; violations are rejected before
/// any bus activity. Programming zero bytes is a no-op.
#[maybe_async]
pub async fn page_program<B: FlashBus + ?Sized, P: Platform + ?Sized>(
    bus: &mut B,
    platform: &mut P,
    poll: PollConfig,
    page_size: u32,
    addr: u32,
    data: &[u8],
) -> Result<()> {
    check_page_bounds(addr, data.len(), page_size)?;
    if data.is_empty() {
        return Ok(());
    }

    let mut cmd = FlashCommand::write(opcodes::PP, addr, data);
    bracketed(bus, platform, poll, &mut cmd).await
}

/// Erase the sector or block containing `addr`
///
/// `opcode` selects the granularity: `SE_20` (4 KiB), `BE_52` (32 KiB) or
/// `BE_D8` (64 KiB).
#[maybe_async]
pub async fn erase<B: FlashBus + ?Sized, P: Platform + ?Sized>(
    bus: &mut B,
    platform: &mut P,
    poll: PollConfig,
    opcode: u8,
    addr: u32,
) -> Result<()> {
    let mut cmd = FlashCommand::erase(opcode, addr);
    bracketed(bus, platform, poll, &mut cmd).await
}

/// Erase the entire chip
#[maybe_async]
pub async fn chip_erase<B: FlashBus + ?Sized, P: Platform + ?Sized>(
    bus: &mut B,
    platform: &mut P,
    poll: PollConfig,
) -> Result<()> {
    let mut cmd = FlashCommand::simple(opcodes::CE_C7);
    bracketed(bus, platform, poll, &mut cmd).await
}

/// Read `buf.len()` bytes starting at `addr` with an addressed read opcode
///
/// Split into chunks of at most `max_read_len()` bytes.
#[maybe_async]
async fn read_with<B: FlashBus + ?Sized>(
    bus: &mut B,
    opcode: u8,
    dummy_cycles: u8,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    let max_len = bus.max_read_len().max(1);
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd =
            FlashCommand::read(opcode, addr + offset as u32, chunk).with_dummy_cycles(dummy_cycles);
        bus.execute(&mut cmd).await?;
        offset += chunk_len;
    }

    Ok(())
}

/// Read data (opcode 0x03)
#[maybe_async]
pub async fn read<B: FlashBus + ?Sized>(bus: &mut B, addr: u32, buf: &mut [u8]) -> Result<()> {
    read_with(bus, opcodes::READ, 0, addr, buf).await
}

/// Fast read (opcode 0x0B, 8 dummy cycles)
#[maybe_async]
pub async fn fast_read<B: FlashBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    read_with(
        bus,
        opcodes::FAST_READ,
        opcodes::FAST_READ_DUMMY_CYCLES,
        addr,
        buf,
    )
    .await
}

/// Read the SFDP table (opcode 0x5A, 8 dummy cycles)
#[maybe_async]
pub async fn read_sfdp<B: FlashBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    read_with(
        bus,
        opcodes::RDSFDP,
        opcodes::FAST_READ_DUMMY_CYCLES,
        addr,
        buf,
    )
    .await
}
