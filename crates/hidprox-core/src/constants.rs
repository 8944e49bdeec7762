//! Core constants for the Wiegand frame decoder.
//!
//! This module defines the fixed protocol and sizing constants shared by the
//! capture, scanning and decoding stages. Timing is expressed in scanner ticks
//! (one tick per call to the registry's poll entry point), not wall-clock time,
//! because the decoder runs inside a cooperative loop whose rate is set by the
//! host.
//!
//! # Frame Layout
//!
//! A Wiegand frame is a plain sequence of bits with no header, length prefix or
//! terminator. Bit 0 is the first pulse received:
//!
//! ```text
//! 26-bit:  P FFFFFFFF CCCCCCCCCCCCCCCC P
//!          0 1      8 9             24 25
//! ```
//!
//! The frame ends when no pulse has been seen for [`WIEGAND_WAIT_TICKS`] ticks.
//!
//! # Usage
//!
//! ```
//! use hidprox_core::constants::*;
//!
//! assert_eq!(MAX_READ_BITS, 100);
//! assert!(FRAME_WORDS * FRAME_WORD_BITS >= MAX_READ_BITS);
//! ```

// ============================================================================
// Frame Sizing
// ============================================================================

/// Maximum number of bits accumulated for a single frame.
///
/// Pulses arriving once a frame holds this many bits are dropped. No supported
/// format comes close to this length, so a capped frame is always reported as
/// unsupported.
///
/// # Value: 100 bits
pub const MAX_READ_BITS: usize = 100;

/// Width of one storage word in a frame bank.
pub const FRAME_WORD_BITS: usize = 32;

/// Number of storage words needed to hold [`MAX_READ_BITS`] bits.
///
/// # Examples
///
/// ```
/// use hidprox_core::constants::{FRAME_WORDS, FRAME_WORD_BITS, MAX_READ_BITS};
///
/// assert_eq!(FRAME_WORDS, 4);
/// assert!(FRAME_WORDS * FRAME_WORD_BITS >= MAX_READ_BITS);
/// ```
pub const FRAME_WORDS: usize = MAX_READ_BITS.div_ceil(FRAME_WORD_BITS);

// ============================================================================
// Timing
// ============================================================================

/// Number of scanner ticks without a pulse after which a frame is complete.
///
/// Every captured bit reloads the inactivity countdown with this value. When
/// the countdown reaches zero the frame is marked ready for decoding.
///
/// # Value: 3000 ticks
///
/// This is sized for a tight polling loop on an 8-bit microcontroller, where
/// 3000 iterations comfortably exceed the 2ms inter-pulse gap of a typical
/// reader while staying well below the time between two card presentations.
pub const WIEGAND_WAIT_TICKS: u16 = 3000;

/// Default interval between poll ticks when the registry is driven by the
/// async poller (microseconds).
///
/// # Value: 1000us (1ms)
///
/// Timer resolution on a hosted runtime is coarser than a bare-metal loop, so
/// the async driver is usually paired with a smaller wait window.
pub const DEFAULT_TICK_INTERVAL_US: u64 = 1000;

// ============================================================================
// Card Formats
// ============================================================================

/// Bit length of the HID Corporate 1000 format.
pub const CARD_FORMAT_CORPORATE_1000: usize = 35;

/// Bit length of the standard 26-bit Wiegand format (H10301).
pub const CARD_FORMAT_WIEGAND_26: usize = 26;

/// Bit length of the 32-bit Wiegand format.
pub const CARD_FORMAT_WIEGAND_32: usize = 32;

// ============================================================================
// Platform Limits
// ============================================================================

/// Number of interrupt lines consumed by one reader (DATA0 and DATA1).
pub const LINES_PER_READER: usize = 2;
