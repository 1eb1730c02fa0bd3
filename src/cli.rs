//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use spif_core::{DriverConfig, PollConfig, UnknownChipPolicy};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "spif")]
#[command(author, version, about = "Serial NOR flash tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub driver: DriverArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Driver options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct DriverArgs {
    /// Status polls per busy wait
    #[arg(long, global = true, default_value_t = PollConfig::DEFAULT_ATTEMPTS)]
    pub poll_attempts: u32,

    /// Bus lock timeout in milliseconds
    #[arg(long, global = true, default_value_t = 1_000)]
    pub lock_timeout: u32,

    /// Assume the first known geometry when the JEDEC ID is not recognised
    #[arg(long, global = true)]
    pub allow_unknown: bool,
}

impl DriverArgs {
    /// Build the driver configuration
    pub fn to_config(&self) -> DriverConfig {
        let defaults = DriverConfig::default();
        let policy = if self.allow_unknown {
            UnknownChipPolicy::FallbackToFirst
        } else {
            UnknownChipPolicy::Reject
        };

        defaults
            .with_program_poll(PollConfig::new(
                self.poll_attempts,
                defaults.program_poll.delay_us,
            ))
            .with_erase_poll(PollConfig::new(
                self.poll_attempts,
                defaults.erase_poll.delay_us,
            ))
            .with_chip_erase_poll(PollConfig::new(
                self.poll_attempts,
                defaults.chip_erase_poll.delay_us,
            ))
            .with_lock_timeout_ms(self.lock_timeout)
            .with_unknown_chip(policy)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe for flash chip
    Probe {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Show chip information
    Info {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Read flash contents to file
    Read {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (default: to the end of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,

        /// Use FAST_READ (0x0B) instead of READ (0x03)
        #[arg(long)]
        fast: bool,
    },

    /// Write file to flash
    Write {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Skip read-back verification
        #[arg(long)]
        no_verify: bool,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,
    },

    /// Erase flash chip or a region of it
    Erase {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Start address for partial erase (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Length of region to erase (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Show status registers
    Status {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// List supported programmers
    ListProgrammers,

    /// List supported chips
    ListChips,
}
