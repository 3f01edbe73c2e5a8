//! Core types used across the LSAT crates.

mod amount;
mod hash;

pub use amount::*;
pub use hash::*;
