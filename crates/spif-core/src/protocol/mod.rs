//! Protocol implementations
//!
//! This module contains the command sequences of 25-series serial NOR
//! flash, built on the [`FlashBus`](crate::transport::FlashBus) abstraction.

mod spinor;

pub use spinor::*;
