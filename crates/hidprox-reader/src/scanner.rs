//! Inactivity timeout scanner.
//!
//! Wiegand has no end-of-frame marker. A frame is considered complete once no
//! pulse has arrived for a fixed number of scanner ticks. Each call to
//! [`ReaderRegistry::poll`](crate::ReaderRegistry::poll) advances every
//! reader's countdown by one tick; the tick that drives it to zero seals the
//! frame for decoding.

use std::sync::atomic::Ordering;

use tracing::trace;

use crate::frame::{
    BANK_BIT, FrameBuffer, OVERFLOW_BIT, SealedFrame, bank_of, count_of, countdown_of,
    with_countdown,
};
use crate::types::ReaderHandle;

/// Outcome of advancing a reader's inactivity countdown by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No frame in progress; nothing to time out.
    Idle,

    /// A frame is in progress and more pulses may follow.
    Counting {
        /// Ticks left before the frame is sealed.
        remaining: u16,
    },

    /// The countdown expired on this tick and the frame was sealed.
    Sealed(SealedFrame),
}

impl FrameBuffer {
    /// Advance the inactivity countdown by one tick.
    ///
    /// Readers with no accumulated bits are left untouched, so ticking an idle
    /// reader any number of times is a no-op. When the countdown reaches zero
    /// the active bank is swapped out and the count cleared in the same atomic
    /// step, and the countdown is reloaded to rest at the full window.
    pub fn tick(&self) -> Tick {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let count = count_of(state);
            let countdown = countdown_of(state);
            if count == 0 || countdown == 0 {
                return Tick::Idle;
            }

            let remaining = countdown - 1;
            let next = if remaining == 0 {
                with_countdown((state & BANK_BIT) ^ BANK_BIT, self.wait_ticks)
            } else {
                with_countdown(state, remaining)
            };

            match self.state.compare_exchange_weak(
                state,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) if remaining == 0 => {
                    return Tick::Sealed(SealedFrame {
                        bank: bank_of(state),
                        len: count,
                        overflowed: state & OVERFLOW_BIT != 0,
                    });
                }
                Ok(_) => return Tick::Counting { remaining },
                Err(actual) => state = actual,
            }
        }
    }
}

/// Run the timeout scanner for one reader and return a frame that became
/// ready on this tick.
pub fn scan(reader: ReaderHandle, buffer: &FrameBuffer) -> Option<SealedFrame> {
    match buffer.tick() {
        Tick::Sealed(sealed) => {
            trace!("{} quiescent after {} bits", reader, sealed.len());
            Some(sealed)
        }
        Tick::Idle | Tick::Counting { .. } => None,
    }
}
