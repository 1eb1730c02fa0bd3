//! Write command implementation

use super::erase::{erase_region_with_progress, sector_span};
use super::read::read_with_progress;
use crate::programmers::Flash;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

/// Bytes handed to one driver write call
const WRITE_CHUNK_SIZE: usize = 4096;

/// Run the write command
pub fn run_write(
    flash: &mut Flash,
    input: &Path,
    start: u32,
    erase: bool,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    write_with_progress(flash, start, &data, erase, verify)?;

    println!("Write complete");
    Ok(())
}

/// Program `data` at `start`, then verify it (optionally)
///
/// With `erase`, the sectors covering the range are read first. They are
/// erased only if some target byte cannot be programmed in place, and the
/// bytes of those sectors outside the range are written back afterwards.
pub fn write_with_progress(
    flash: &mut Flash,
    start: u32,
    data: &[u8],
    erase: bool,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !flash.geometry().contains_range(start, data.len()) {
        return Err(format!(
            "{} bytes at 0x{:08X} do not fit the chip (0x{:08X} bytes)",
            data.len(),
            start,
            flash.geometry().chip_size
        )
        .into());
    }
    if data.is_empty() {
        return Ok(());
    }

    if erase {
        let (span_start, span_len) = sector_span(start, data.len() as u32);
        let mut image = read_with_progress(flash, span_start, span_len as usize, false)?;
        let offset = (start - span_start) as usize;
        let target = &mut image[offset..offset + data.len()];

        if needs_erase(target, data) {
            target.copy_from_slice(data);
            erase_region_with_progress(flash, span_start, span_len)?;
            program_with_progress(flash, span_start, &image)?;
        } else {
            log::info!("Target range is programmable in place, skipping erase");
            program_with_progress(flash, start, data)?;
        }
    } else {
        program_with_progress(flash, start, data)?;
    }

    if verify {
        let readback = read_with_progress(flash, start, data.len(), false)?;
        if let Some(offset) = readback.iter().zip(data).position(|(a, b)| a != b) {
            return Err(format!(
                "Verification failed at 0x{:08X}: expected 0x{:02X}, read 0x{:02X}",
                start as usize + offset,
                data[offset],
                readback[offset]
            )
            .into());
        }
        println!("Verified {} bytes", data.len());
    }

    Ok(())
}

/// Programming can only clear bits, so any bit going 0 -> 1 needs an erase
fn needs_erase(have: &[u8], want: &[u8]) -> bool {
    have.iter().zip(want).any(|(&h, &w)| h & w != w)
}

fn program_with_progress(
    flash: &mut Flash,
    start: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) Writing")?
            .progress_chars("#>-"),
    );

    for (i, chunk) in data.chunks(WRITE_CHUNK_SIZE).enumerate() {
        flash.write(start + (i * WRITE_CHUNK_SIZE) as u32, chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("Write complete");
    Ok(())
}
