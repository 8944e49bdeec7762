//! Per-reader frame buffer shared between interrupt and polling contexts.
//!
//! A [`FrameBuffer`] holds everything the two execution contexts exchange for
//! one reader. It is written from the edge-interrupt context (see
//! [`capture`](crate::capture)) and read from the polling context (see
//! [`scanner`](crate::scanner) and [`decoder`](crate::decoder)).
//!
//! # Layout
//!
//! Bits live in two banks of atomic words. At any moment one bank is *active*
//! (receiving pulses) and the other is either idle and zeroed, or *sealed* and
//! being decoded. All per-frame counters are packed into a single state word so
//! every transition is one compare-and-swap:
//!
//! ```text
//!  31            16 15     9   8     7   6        0
//! ┌────────────────┬────────┬─────┬──────┬─────────┐
//! │   countdown    │ unused │ ovf │ bank │  count  │
//! └────────────────┴────────┴─────┴──────┴─────────┘
//! ```
//!
//! - `count`: bits accumulated in the active bank (`0..=MAX_READ_BITS`)
//! - `bank`: index of the active bank
//! - `ovf`: set when pulses were dropped because the frame was full
//! - `countdown`: inactivity ticks left before the frame is sealed
//!
//! # Handoff
//!
//! Sealing swaps the active bank and zeroes the count in the same step that
//! observes the countdown expiring. A pulse arriving after that moment lands in
//! the other bank and starts the next frame; it can never touch the bank being
//! decoded. The sealed bank is cleared after decoding and before it can become
//! active again, so every frame starts on an all-zero bank.

use std::sync::atomic::{AtomicU32, Ordering};

use hidprox_core::FrameBits;
use hidprox_core::constants::{FRAME_WORD_BITS, FRAME_WORDS};

use crate::error::{ReaderError, Result};

pub(crate) const COUNT_MASK: u32 = 0x7F;
pub(crate) const BANK_BIT: u32 = 1 << 7;
pub(crate) const OVERFLOW_BIT: u32 = 1 << 8;
pub(crate) const COUNTDOWN_SHIFT: u32 = 16;

#[inline]
pub(crate) const fn count_of(state: u32) -> usize {
    (state & COUNT_MASK) as usize
}

#[inline]
pub(crate) const fn bank_of(state: u32) -> usize {
    ((state & BANK_BIT) >> 7) as usize
}

#[inline]
pub(crate) const fn countdown_of(state: u32) -> u16 {
    (state >> COUNTDOWN_SHIFT) as u16
}

#[inline]
pub(crate) const fn with_countdown(state: u32, countdown: u16) -> u32 {
    (state & 0xFFFF) | ((countdown as u32) << COUNTDOWN_SHIFT)
}

/// Word index and mask for bit position `index`.
#[inline]
pub(crate) const fn locate(index: usize) -> (usize, u32) {
    (index / FRAME_WORD_BITS, 1u32 << (index % FRAME_WORD_BITS))
}

/// A frame that has been sealed by the timeout scanner and awaits decoding.
///
/// Holding a `SealedFrame` grants the polling context exclusive access to the
/// bank it names until [`FrameBuffer::release`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedFrame {
    pub(crate) bank: usize,
    pub(crate) len: usize,
    pub(crate) overflowed: bool,
}

impl SealedFrame {
    /// Number of bits in the sealed frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether pulses were dropped because the frame reached capacity.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

/// Lock-free frame storage for one reader.
///
/// # Concurrency
///
/// - Exactly one producer: the reader's two edge interrupts.
/// - Exactly one consumer: the polling loop.
/// - All coordination goes through the packed state word.
#[derive(Debug)]
pub struct FrameBuffer {
    banks: [[AtomicU32; FRAME_WORDS]; 2],
    pub(crate) state: AtomicU32,
    pub(crate) wait_ticks: u16,
}

impl FrameBuffer {
    /// Create an idle buffer whose countdown is loaded with `wait_ticks`.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::ConfigurationError`] if `wait_ticks` is zero, since
    /// a frame could then never be sealed.
    pub fn new(wait_ticks: u16) -> Result<Self> {
        if wait_ticks == 0 {
            return Err(ReaderError::configuration("wait_ticks must be non-zero"));
        }
        Ok(Self {
            banks: Default::default(),
            state: AtomicU32::new(with_countdown(0, wait_ticks)),
            wait_ticks,
        })
    }

    /// Inactivity window this buffer reloads on every pulse.
    #[must_use]
    pub fn wait_ticks(&self) -> u16 {
        self.wait_ticks
    }

    /// Bits accumulated for the frame in progress.
    #[must_use]
    pub fn bit_count(&self) -> usize {
        count_of(self.state.load(Ordering::Acquire))
    }

    /// Ticks left before the frame in progress is sealed.
    #[must_use]
    pub fn countdown(&self) -> u16 {
        countdown_of(self.state.load(Ordering::Acquire))
    }

    /// Whether the frame in progress has dropped pulses at capacity.
    #[must_use]
    pub fn is_overflowed(&self) -> bool {
        self.state.load(Ordering::Acquire) & OVERFLOW_BIT != 0
    }

    /// Bits of the frame in progress.
    ///
    /// This is a best-effort view for diagnostics; a pulse may land while the
    /// words are being copied.
    #[must_use]
    pub fn peek(&self) -> FrameBits {
        let state = self.state.load(Ordering::Acquire);
        self.copy_bank(bank_of(state), count_of(state))
    }

    /// Copy the bits of a sealed frame.
    #[must_use]
    pub fn read_sealed(&self, sealed: &SealedFrame) -> FrameBits {
        self.copy_bank(sealed.bank, sealed.len)
    }

    /// Zero the bank of a decoded frame so it can be reused.
    pub fn release(&self, sealed: SealedFrame) {
        for word in &self.banks[sealed.bank] {
            word.store(0, Ordering::Release);
        }
    }

    /// Discard the frame in progress and return the buffer to idle.
    ///
    /// The active bank is swapped out atomically and then cleared, so a pulse
    /// racing with the reset simply starts a new frame. Polling context only:
    /// no sealed frame may be outstanding.
    pub fn reset(&self) {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let fresh = with_countdown((state & BANK_BIT) ^ BANK_BIT, self.wait_ticks);
            match self.state.compare_exchange_weak(
                state,
                fresh,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => {
                    self.release(SealedFrame {
                        bank: bank_of(previous),
                        len: count_of(previous),
                        overflowed: false,
                    });
                    return;
                }
                Err(actual) => state = actual,
            }
        }
    }

    pub(crate) fn bank(&self, index: usize) -> &[AtomicU32; FRAME_WORDS] {
        &self.banks[index]
    }

    fn copy_bank(&self, bank: usize, len: usize) -> FrameBits {
        let mut words = [0u32; FRAME_WORDS];
        for (dst, src) in words.iter_mut().zip(&self.banks[bank]) {
            *dst = src.load(Ordering::Acquire);
        }
        FrameBits::from_words(words, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_packing() {
        let state = with_countdown(5 | BANK_BIT | OVERFLOW_BIT, 3000);
        assert_eq!(count_of(state), 5);
        assert_eq!(bank_of(state), 1);
        assert_eq!(countdown_of(state), 3000);
        assert_ne!(state & OVERFLOW_BIT, 0);

        let reloaded = with_countdown(state, 7);
        assert_eq!(count_of(reloaded), 5);
        assert_eq!(bank_of(reloaded), 1);
        assert_eq!(countdown_of(reloaded), 7);
    }

    #[test]
    fn test_count_mask_holds_max_bits() {
        assert!(hidprox_core::constants::MAX_READ_BITS <= COUNT_MASK as usize);
    }

    #[test]
    fn test_zero_wait_ticks_rejected() {
        assert!(matches!(
            FrameBuffer::new(0),
            Err(ReaderError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_new_buffer_is_idle() {
        let buffer = FrameBuffer::new(3000).unwrap();
        assert_eq!(buffer.bit_count(), 0);
        assert_eq!(buffer.countdown(), 3000);
        assert!(!buffer.is_overflowed());
        assert!(buffer.peek().is_empty());
    }

    #[test]
    fn test_reset_discards_frame_and_clears_bank() {
        let buffer = FrameBuffer::new(10).unwrap();
        buffer.capture(true);
        buffer.capture(true);
        assert_eq!(buffer.bit_count(), 2);

        buffer.reset();
        assert_eq!(buffer.bit_count(), 0);
        assert_eq!(buffer.countdown(), 10);
        for bank in 0..2 {
            assert!(
                buffer
                    .bank(bank)
                    .iter()
                    .all(|w| w.load(Ordering::Relaxed) == 0)
            );
        }
    }
}
