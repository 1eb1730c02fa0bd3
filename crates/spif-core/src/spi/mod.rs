//! SPI NOR command set and framing
//!
//! This module provides the opcode table, the transport-independent command
//! structure and the status register flags of 25-series NOR flash chips.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::{encode_address, ADDRESS_LEN, ADDRESS_SPACE};
pub use command::FlashCommand;
pub use status::StatusRegister1;
