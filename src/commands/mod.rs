//! CLI command implementations
//!
//! Every command that touches the flash receives an initialized
//! [`Flash`](crate::programmers::Flash); chip detection has already
//! happened by the time a command runs.

pub mod erase;
mod list;
mod probe;
pub mod read;
mod status;
pub mod write;

pub use list::{list_chips, list_programmers};
pub use probe::{run_info, run_probe};
pub use status::run_status;
