//! spif - serial NOR flash tool
//!
//! Reads, writes and erases 25-series SPI NOR flash through any bus that
//! implements [`spif_core::transport::FlashBus`]. Every flash command
//! opens the programmer, probes the chip by JEDEC ID and then runs on an
//! initialized driver.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use programmers::{open_flash, Flash};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = cli.driver.to_config();

    match cli.command {
        Commands::Probe { programmer } => {
            let flash = open_flash(&programmer, config)?;
            commands::run_probe(&flash)?;
            finish(flash)
        }
        Commands::Info { programmer } => {
            let mut flash = open_flash(&programmer, config)?;
            commands::run_info(&mut flash)?;
            finish(flash)
        }
        Commands::Read {
            programmer,
            output,
            start,
            length,
            fast,
        } => {
            let mut flash = open_flash(&programmer, config)?;
            commands::read::run_read(&mut flash, &output, start, length, fast)?;
            finish(flash)
        }
        Commands::Write {
            programmer,
            input,
            start,
            no_verify,
            no_erase,
        } => {
            let mut flash = open_flash(&programmer, config)?;
            commands::write::run_write(&mut flash, &input, start, !no_erase, !no_verify)?;
            finish(flash)
        }
        Commands::Erase {
            programmer,
            start,
            length,
        } => {
            let mut flash = open_flash(&programmer, config)?;
            commands::erase::run_erase(&mut flash, start, length)?;
            finish(flash)
        }
        Commands::Status { programmer } => {
            let mut flash = open_flash(&programmer, config)?;
            commands::run_status(&mut flash)?;
            finish(flash)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
    }
}

/// Shut the bus down once a command has completed
fn finish(flash: Flash) -> Result<(), Box<dyn std::error::Error>> {
    flash.release()?;
    Ok(())
}
