//! Read command implementation

use crate::programmers::Flash;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Default chunk size for reading (4 KiB)
const READ_CHUNK_SIZE: usize = 4096;

/// Run the read command
pub fn run_read(
    flash: &mut Flash,
    output: &Path,
    start: u32,
    length: Option<u32>,
    fast: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let chip_size = flash.geometry().chip_size;
    if start >= chip_size {
        return Err(format!("Start 0x{:08X} is beyond the chip (0x{:08X})", start, chip_size).into());
    }
    let length = length.unwrap_or(chip_size - start);

    let data = read_with_progress(flash, start, length as usize, fast)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read `len` bytes starting at `start` with progress bar
pub fn read_with_progress(
    flash: &mut Flash,
    start: u32,
    len: usize,
    fast: bool,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; len];

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    for (i, chunk) in data.chunks_mut(READ_CHUNK_SIZE).enumerate() {
        let addr = start + (i * READ_CHUNK_SIZE) as u32;
        if fast {
            flash.fast_read(addr, chunk)?;
        } else {
            flash.read(addr, chunk)?;
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
