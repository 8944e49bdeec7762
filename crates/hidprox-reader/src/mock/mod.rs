//! Mock interrupt hardware for testing and development.
//!
//! This module provides a simulated interrupt controller and a Wiegand
//! transmitter that drives it, so readers can be exercised end to end without
//! physical hardware.

pub mod interrupt;
pub mod transmitter;

pub use interrupt::MockInterruptController;
pub use transmitter::WiegandTransmitter;
