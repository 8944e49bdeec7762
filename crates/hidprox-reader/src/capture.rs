//! Bit capture entry points for the edge-interrupt context.
//!
//! A Wiegand reader signals each bit as a short low pulse on one of its two
//! data lines: DATA0 for a 0 bit, DATA1 for a 1 bit. The platform calls one
//! of the functions here from the falling-edge interrupt of the matching line.
//!
//! # Timing
//!
//! Capture completes in O(1), never blocks, never allocates and never logs.
//! It is safe to run while the polling loop is scanning or decoding the same
//! reader.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use hidprox_core::constants::MAX_READ_BITS;

use crate::frame::{
    COUNT_MASK, FrameBuffer, OVERFLOW_BIT, bank_of, count_of, locate, with_countdown,
};
use crate::types::ReaderHandle;

impl FrameBuffer {
    /// Record one pulse and reload the inactivity countdown.
    ///
    /// A 1 bit sets the position at the current count; a 0 bit only advances
    /// the count, relying on the active bank being zeroed. Once the frame holds
    /// [`MAX_READ_BITS`] bits further pulses are dropped and the overflow flag
    /// is raised, but the countdown is still reloaded so the over-long
    /// transmission completes as a single frame.
    #[inline]
    pub fn capture(&self, bit: bool) {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let count = count_of(state);

            if count >= MAX_READ_BITS {
                let next = with_countdown(state | OVERFLOW_BIT, self.wait_ticks);
                match self.state.compare_exchange_weak(
                    state,
                    next,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return,
                    Err(actual) => {
                        state = actual;
                        continue;
                    }
                }
            }

            let bank = bank_of(state);
            let (word, mask) = locate(count);
            if bit {
                self.bank(bank)[word].fetch_or(mask, Ordering::Relaxed);
            }

            let next = with_countdown(
                (state & !COUNT_MASK) | ((count as u32 + 1) & COUNT_MASK),
                self.wait_ticks,
            );
            match self.state.compare_exchange_weak(
                state,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => {
                    // Position `count` is past the end of whatever frame the
                    // consumer may hold, and only this producer writes it.
                    if bit {
                        self.bank(bank)[word].fetch_and(!mask, Ordering::Relaxed);
                    }
                    state = actual;
                }
            }
        }
    }
}

/// Cloneable handle for feeding pulses into one reader from interrupt context.
///
/// The handle shares the reader's [`FrameBuffer`] and stays valid for as long
/// as any clone exists, independent of registry growth.
///
/// # Examples
///
/// ```
/// use hidprox_core::LineId;
/// use hidprox_reader::{ReaderRegistry, RegistryConfig};
///
/// let mut registry = ReaderRegistry::new(RegistryConfig::default()).unwrap();
/// let reader = registry
///     .register_without_handler(LineId::new(2), LineId::new(3))
///     .unwrap();
/// let capture = registry.capture_handle(reader).unwrap();
///
/// capture.on_line1_edge();
/// capture.on_line0_edge();
/// assert_eq!(capture.bit_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    reader: ReaderHandle,
    buffer: Arc<FrameBuffer>,
}

impl CaptureHandle {
    pub(crate) fn new(reader: ReaderHandle, buffer: Arc<FrameBuffer>) -> Self {
        Self { reader, buffer }
    }

    /// Reader this handle feeds.
    #[must_use]
    pub fn reader(&self) -> ReaderHandle {
        self.reader
    }

    /// Falling edge on DATA0: append a 0 bit.
    #[inline]
    pub fn on_line0_edge(&self) {
        self.buffer.capture(false);
    }

    /// Falling edge on DATA1: append a 1 bit.
    #[inline]
    pub fn on_line1_edge(&self) {
        self.buffer.capture(true);
    }

    /// Append one bit.
    #[inline]
    pub fn push_bit(&self, bit: bool) {
        self.buffer.capture(bit);
    }

    /// Bits accumulated for the frame in progress.
    #[must_use]
    pub fn bit_count(&self) -> usize {
        self.buffer.bit_count()
    }

    /// Whether a frame is in progress.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.buffer.bit_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BANK_BIT, countdown_of};

    #[test]
    fn test_line1_sets_bit_at_count() {
        let buffer = FrameBuffer::new(100).unwrap();
        buffer.capture(false);
        buffer.capture(true);
        buffer.capture(false);

        let bits = buffer.peek();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits.to_string(), "010");
    }

    #[test]
    fn test_capture_reloads_countdown() {
        let buffer = FrameBuffer::new(50).unwrap();
        buffer.capture(true);
        for _ in 0..49 {
            buffer.tick();
        }
        assert_eq!(buffer.countdown(), 1);

        buffer.capture(false);
        assert_eq!(buffer.countdown(), 50);
        assert_eq!(buffer.bit_count(), 2);
    }

    #[test]
    fn test_capture_caps_at_max_bits() {
        let buffer = FrameBuffer::new(10).unwrap();
        for _ in 0..MAX_READ_BITS + 25 {
            buffer.capture(true);
        }

        assert_eq!(buffer.bit_count(), MAX_READ_BITS);
        assert!(buffer.is_overflowed());
        assert_eq!(buffer.peek().iter().filter(|b| *b).count(), MAX_READ_BITS);
    }

    #[test]
    fn test_capture_preserves_bank() {
        let buffer = FrameBuffer::new(10).unwrap();
        buffer.state.fetch_or(BANK_BIT, Ordering::SeqCst);
        buffer.capture(true);

        let state = buffer.state.load(Ordering::SeqCst);
        assert_eq!(bank_of(state), 1);
        assert_eq!(count_of(state), 1);
        assert_eq!(countdown_of(state), 10);
        assert_eq!(buffer.bank(1)[0].load(Ordering::SeqCst), 1);
        assert_eq!(buffer.bank(0)[0].load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_capture_handle_edges() {
        let buffer = Arc::new(FrameBuffer::new(10).unwrap());
        let handle = CaptureHandle::new(ReaderHandle::new(0), buffer.clone());
        assert!(!handle.is_pending());

        handle.on_line1_edge();
        handle.on_line0_edge();
        handle.push_bit(true);

        assert!(handle.is_pending());
        assert_eq!(handle.bit_count(), 3);
        assert_eq!(buffer.peek().to_string(), "101");
        assert_eq!(handle.reader(), ReaderHandle::new(0));
    }
}
