//! Programmer registration and dispatch
//!
//! A programmer string is a name optionally followed by `:` and
//! comma-separated `key=value` options, e.g.
//! `linux_spi:dev=/dev/spidev0.0,spispeed=4000`.

use spif_core::platform::StdPlatform;
use spif_core::transport::FlashBus;
use spif_core::{DriverConfig, FlashDriver};
use thiserror::Error;

/// Driver type used by every command
pub type Flash = FlashDriver<Box<dyn FlashBus + Send>, StdPlatform>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors raised while opening a programmer
#[derive(Debug, Error)]
pub enum ProgrammerError {
    /// No programmer with this name was compiled in
    #[error("Unknown programmer: {name}\nAvailable programmers: {available}")]
    Unknown { name: String, available: String },

    /// Option value could not be parsed
    #[error("Invalid option {key}={value}")]
    InvalidOption { key: String, value: String },

    /// Chip name not in the geometry table
    #[error("Unknown chip '{0}' (see list-chips)")]
    UnknownChip(String),

    /// Image file for the emulator could not be read
    #[error("Failed to read image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Driver initialization failed
    #[error("Flash initialization failed: {0}")]
    Flash(#[from] spif_core::Error),

    /// spidev could not be opened
    #[cfg(feature = "linux-spi")]
    #[error(transparent)]
    LinuxSpi(#[from] spif_linux_spi::LinuxSpiError),
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &["dummy_spi"],
        description: "In-memory flash emulator on a byte-stream SPI bus (chip=<name>,image=<file>,busy=<polls>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy_qspi",
        aliases: &["dummy-qspi"],
        description: "In-memory flash emulator behind a QSPI phase generator (same options as dummy)",
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Split a programmer string into its name and `key=value` options
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the bus named by a programmer string
pub fn open_bus(programmer: &str) -> Result<Box<dyn FlashBus + Send>, ProgrammerError> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = find_programmer(name).ok_or_else(|| ProgrammerError::Unknown {
        name: name.to_string(),
        available: programmer_names_short(),
    })?;

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let chip = dummy::open_chip(&options)?;
            Ok(Box::new(spif_core::transport::SpiBus::new(
                spif_dummy::DummySpi::new(chip),
            )))
        }

        #[cfg(feature = "dummy")]
        "dummy_qspi" => {
            let chip = dummy::open_chip(&options)?;
            Ok(Box::new(spif_core::transport::QspiBus::new(
                spif_dummy::DummyQspi::new(chip),
            )))
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            let config = spif_linux_spi::parse_options(&options)?;
            let spi = spif_linux_spi::LinuxSpi::open(&config)?;
            Ok(Box::new(spif_core::transport::SpiBus::new(spi)))
        }

        _ => Err(ProgrammerError::Unknown {
            name: name.to_string(),
            available: programmer_names_short(),
        }),
    }
}

/// Open a programmer and initialize the flash driver on it
pub fn open_flash(programmer: &str, config: DriverConfig) -> Result<Flash, ProgrammerError> {
    let bus = open_bus(programmer)?;
    log::debug!("Opened {} bus for {}", bus.mode(), programmer);
    Ok(FlashDriver::init(bus, StdPlatform, config)?)
}

#[cfg(feature = "dummy")]
mod dummy {
    use super::ProgrammerError;
    use spif_core::geometry::{find_by_name, KNOWN_CHIPS};
    use spif_dummy::{DummyChip, DummyConfig};

    /// Build the emulated chip from `chip=`, `image=` and `busy=` options
    pub fn open_chip(options: &[(&str, &str)]) -> Result<DummyChip, ProgrammerError> {
        let mut config = DummyConfig::default();
        let mut busy_polls = None;
        let mut image = None;

        for (key, value) in options {
            match *key {
                "chip" => {
                    let geometry = find_by_name(KNOWN_CHIPS, value)
                        .ok_or_else(|| ProgrammerError::UnknownChip(value.to_string()))?;
                    config = DummyConfig::from_geometry(geometry);
                }
                "busy" => {
                    let polls = value.parse().map_err(|_| ProgrammerError::InvalidOption {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
                    busy_polls = Some(polls);
                }
                "image" => image = Some(*value),
                _ => log::warn!("dummy: Unknown option: {}={}", key, value),
            }
        }

        if let Some(polls) = busy_polls {
            config.busy_polls = polls;
        }

        match image {
            Some(path) => {
                let data = std::fs::read(path).map_err(|source| ProgrammerError::Image {
                    path: path.to_string(),
                    source,
                })?;
                log::info!("dummy: Loaded {} bytes from {}", data.len(), path);
                Ok(DummyChip::with_data(config, &data))
            }
            None => Ok(DummyChip::new(config)),
        }
    }
}
