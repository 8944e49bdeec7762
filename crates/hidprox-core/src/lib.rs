//! Core value types for Wiegand frame decoding.
//!
//! This crate holds everything that does not depend on how pulses are
//! captured: the card format table, the fixed-capacity [`FrameBits`]
//! container with big-endian field extraction, platform reader limits and the
//! protocol constants.

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{MAX_READ_BITS, WIEGAND_WAIT_TICKS};
pub use error::{Error, Result};
pub use types::{BitRange, CardFormat, FrameBits, LineId, PlatformClass};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
