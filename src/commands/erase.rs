//! Erase command implementation

use crate::programmers::Flash;
use indicatif::{ProgressBar, ProgressStyle};
use spif_core::geometry::FlashGeometry;
use spif_core::spi::opcodes::{BLOCK_32K, BLOCK_64K, SECTOR_4K};
use std::time::Duration;

/// One erase command of an erase plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseStep {
    /// 4 KiB sector erase (0x20)
    Sector(u32),
    /// 32 KiB block erase (0x52)
    Block32(u32),
    /// 64 KiB block erase (0xD8)
    Block64(u32),
}

impl EraseStep {
    /// Number of bytes erased by this step
    pub fn size(&self) -> u32 {
        match self {
            EraseStep::Sector(_) => SECTOR_4K,
            EraseStep::Block32(_) => BLOCK_32K,
            EraseStep::Block64(_) => BLOCK_64K,
        }
    }

    fn run(&self, flash: &mut Flash) -> spif_core::Result<()> {
        match *self {
            EraseStep::Sector(addr) => flash.sector_erase(addr),
            EraseStep::Block32(addr) => flash.block_erase_32(addr),
            EraseStep::Block64(addr) => flash.block_erase_64(addr),
        }
    }
}

/// Round `[start, start + len)` outward to sector boundaries
pub fn sector_span(start: u32, len: u32) -> (u32, u32) {
    let aligned_start = start & !(SECTOR_4K - 1);
    let end = (start as u64 + len as u64).div_ceil(SECTOR_4K as u64) * SECTOR_4K as u64;
    (aligned_start, (end - aligned_start as u64) as u32)
}

/// Cover a sector-aligned region with the largest erase commands that fit
///
/// 64 KiB block erase is only used on parts whose erase block is at least
/// 64 KiB.
pub fn plan_erase(
    geometry: &FlashGeometry,
    start: u32,
    len: u32,
) -> Result<Vec<EraseStep>, String> {
    if start % SECTOR_4K != 0 || len % SECTOR_4K != 0 {
        return Err(format!(
            "Erase range must be 4 KiB aligned (start 0x{:08X}, length 0x{:X})",
            start, len
        ));
    }
    if !geometry.contains_range(start, len as usize) {
        return Err(format!(
            "Erase range 0x{:08X}..0x{:08X} is outside chip bounds (0x{:08X})",
            start,
            start as u64 + len as u64,
            geometry.chip_size
        ));
    }

    let end = start + len;
    let use_64k = geometry.block_size >= BLOCK_64K;
    let mut steps = Vec::new();
    let mut addr = start;

    while addr < end {
        let remaining = end - addr;
        let step = if use_64k && addr % BLOCK_64K == 0 && remaining >= BLOCK_64K {
            EraseStep::Block64(addr)
        } else if addr % BLOCK_32K == 0 && remaining >= BLOCK_32K {
            EraseStep::Block32(addr)
        } else {
            EraseStep::Sector(addr)
        };
        addr += step.size();
        steps.push(step);
    }

    Ok(steps)
}

/// Run the erase command
pub fn run_erase(
    flash: &mut Flash,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    match (start, length) {
        (Some(start_addr), Some(len)) => {
            erase_region_with_progress(flash, start_addr, len)?;
            println!("Erased {} bytes starting at 0x{:08X}", len, start_addr);
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err("Both --start and --length must be specified for partial erase".into());
        }
        (None, None) => {
            chip_erase_with_progress(flash)?;
            println!("Chip erase complete");
        }
    }

    Ok(())
}

/// Erase entire chip with progress spinner
pub fn chip_erase_with_progress(flash: &mut Flash) -> Result<(), Box<dyn std::error::Error>> {
    let total_size = flash.geometry().chip_size;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Erasing {} bytes (this may take a while)...",
        total_size
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    flash.chip_erase()?;

    pb.finish_with_message(format!("Erased {} bytes", total_size));
    Ok(())
}

/// Erase a region with progress bar
pub fn erase_region_with_progress(
    flash: &mut Flash,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps = plan_erase(flash.geometry(), start, length)?;

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) Erasing")?
            .progress_chars("#>-"),
    );

    for step in &steps {
        log::debug!("{:?}", step);
        step.run(flash)?;
        pb.inc(step.size() as u64);
    }

    pb.finish_with_message("Erase complete");
    Ok(())
}
