//! Status command

use crate::programmers::Flash;
use spif_core::spi::StatusRegister1;

/// Print status registers 1-3
pub fn run_status(flash: &mut Flash) -> Result<(), Box<dyn std::error::Error>> {
    let [sr1, sr2, sr3] = flash.read_status_registers()?;
    let flags = StatusRegister1::from_bits_retain(sr1);

    println!("SR1: 0x{:02X}  {:?}", sr1, flags);
    println!("SR2: 0x{:02X}", sr2);
    println!("SR3: 0x{:02X}", sr3);
    println!();
    println!("Busy:            {}", flags.is_busy());
    println!("Write enabled:   {}", flags.write_enabled());
    Ok(())
}
