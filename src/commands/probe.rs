//! Probe and info commands

use crate::programmers::Flash;

/// Print the detected chip
pub fn run_probe(flash: &Flash) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = flash.geometry();
    println!("Found flash chip:");
    println!("  Name:     {}", geometry.name);
    println!(
        "  Size:     {} bytes ({} KiB)",
        geometry.chip_size,
        geometry.chip_size / 1024
    );
    println!("  JEDEC ID: {}", flash.jedec_id());
    Ok(())
}

/// Print geometry, bus and SFDP details of the detected chip
pub fn run_info(flash: &mut Flash) -> Result<(), Box<dyn std::error::Error>> {
    let geometry = *flash.geometry();

    println!("Flash Chip Information");
    println!("======================");
    println!();
    println!("Name:            {}", geometry.name);
    println!("JEDEC ID:        {}", flash.jedec_id());
    println!(
        "Table entry:     {}{}",
        flash.geometry_index(),
        if geometry.matches(flash.jedec_id()) {
            ""
        } else {
            " (assumed, JEDEC ID not recognised)"
        }
    );
    println!("Bus:             {}", flash.mode());
    println!(
        "Size:            {} bytes ({} KiB / {} MiB)",
        geometry.chip_size,
        geometry.chip_size / 1024,
        geometry.chip_size / (1024 * 1024)
    );
    println!("Page size:       {} bytes", geometry.page_size);
    println!("Sector size:     {} bytes", geometry.sector_size);
    println!("Block size:      {} bytes", geometry.block_size);

    let mut header = [0u8; 8];
    match flash.read_sfdp(0, &mut header) {
        Ok(()) if &header[..4] == b"SFDP" => {
            println!(
                "SFDP:            Revision {}.{}, {} parameter header(s)",
                header[5],
                header[4],
                header[6] as usize + 1
            );
        }
        Ok(()) => println!("SFDP:            Not detected"),
        Err(e) => {
            log::debug!("SFDP read failed: {}", e);
            println!("SFDP:            Not detected");
        }
    }

    Ok(())
}
