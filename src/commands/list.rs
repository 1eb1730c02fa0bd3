//! List commands implementation

use crate::programmers;
use spif_core::geometry::KNOWN_CHIPS;

/// List all supported programmers
pub fn list_programmers() {
    print!("{}", programmers::programmer_help());
}

/// List all chips of the geometry table
pub fn list_chips() {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<20} {:>10} {:>10} {:>10} {:>10}",
        "Name", "Size", "Block", "Sector", "JEDEC ID"
    );
    println!("{}", "-".repeat(64));

    for chip in KNOWN_CHIPS {
        println!(
            "{:<20} {:>10} {:>10} {:>10} {:>10}",
            chip.name,
            format_size(chip.chip_size),
            format_size(chip.block_size),
            format_size(chip.sector_size),
            chip.jedec_id().to_string()
        );
    }
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
