//! Frame decoder and completion callbacks.
//!
//! Once the scanner seals a frame, the decoder classifies it by total bit
//! length, extracts the facility and card fields for the matching
//! [`CardFormat`], hands the result to the reader's [`FrameHandler`] and
//! finally releases the frame's bank for reuse.
//!
//! Frames of any other length are still delivered, flagged as unsupported
//! with both codes zero. Line noise and unknown card types are observations
//! the caller may want to log, not errors.
//!
//! # Examples
//!
//! ```
//! use hidprox_core::{CardFormat, FrameBits};
//! use hidprox_reader::decoder::decode_bits;
//!
//! let bits = FrameBits::encode(CardFormat::Wiegand26, 42, 12345).unwrap();
//! let decoded = decode_bits(&bits);
//!
//! assert_eq!(decoded.format, Some(CardFormat::Wiegand26));
//! assert_eq!(decoded.facility_code, 42);
//! assert_eq!(decoded.card_code, 12345);
//! ```

use chrono::{DateTime, Utc};
use hidprox_core::{CardFormat, FrameBits};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::frame::{FrameBuffer, SealedFrame};
use crate::types::{ReaderHandle, ReaderLines};

/// Field values extracted from a frame, independent of any reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoding {
    /// Matched format, or `None` when the length is unsupported.
    pub format: Option<CardFormat>,

    /// Facility code, zero when unsupported.
    pub facility_code: u32,

    /// Card code, zero when unsupported.
    pub card_code: u32,
}

/// Classify `bits` by length and extract its fields.
#[must_use]
pub fn decode_bits(bits: &FrameBits) -> Decoding {
    match CardFormat::from_bit_count(bits.len()) {
        Some(format) => Decoding {
            format: Some(format),
            facility_code: bits.extract(format.facility_bits()),
            card_code: bits.extract(format.card_bits()),
        },
        None => Decoding {
            format: None,
            facility_code: 0,
            card_code: 0,
        },
    }
}

/// A completed frame as delivered to a [`FrameHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Reader the frame was received on.
    pub reader: ReaderHandle,

    /// Data lines of that reader.
    pub lines: ReaderLines,

    /// Total number of bits in the frame.
    pub bit_count: usize,

    /// Matched card format.
    pub format: Option<CardFormat>,

    /// Facility code. Zero unless the format is supported.
    pub facility_code: u32,

    /// Card code. Zero unless the format is supported.
    pub card_code: u32,

    /// The frame length matched no known format.
    pub unsupported: bool,

    /// Pulses were dropped because the frame reached capacity.
    pub overflowed: bool,

    /// Raw frame bits in arrival order.
    pub bits: FrameBits,

    /// When the frame was decoded.
    pub timestamp: DateTime<Utc>,
}

impl DecodedFrame {
    /// Build a decoded frame from raw bits.
    pub fn new(reader: ReaderHandle, lines: ReaderLines, bits: FrameBits, overflowed: bool) -> Self {
        let decoding = decode_bits(&bits);
        Self {
            reader,
            lines,
            bit_count: bits.len(),
            format: decoding.format,
            facility_code: decoding.facility_code,
            card_code: decoding.card_code,
            unsupported: decoding.format.is_none(),
            overflowed,
            bits,
            timestamp: Utc::now(),
        }
    }

    /// Whether the frame carried a supported card format.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !self.unsupported
    }

    /// Card number in the conventional `facility:card` form, e.g. `042:12345`.
    ///
    /// Returns `None` for unsupported frames.
    #[must_use]
    pub fn card_number(&self) -> Option<String> {
        self.format
            .map(|_| format!("{:03}:{:05}", self.facility_code, self.card_code))
    }
}

/// Completion callback invoked synchronously from the poll loop.
///
/// Handlers run on the polling context and must not block. Any
/// `FnMut(&DecodedFrame) + Send` closure is a handler, so state can be captured
/// directly:
///
/// ```
/// use hidprox_reader::decoder::{DecodedFrame, FrameHandler};
///
/// let mut seen = Vec::new();
/// let mut record = |frame: &DecodedFrame| seen.push(frame.card_code);
/// let _handler: &mut dyn FrameHandler = &mut record;
/// ```
pub trait FrameHandler: Send {
    /// Called once per completed frame, supported or not.
    fn on_frame_decoded(&mut self, frame: &DecodedFrame);
}

impl<F> FrameHandler for F
where
    F: FnMut(&DecodedFrame) + Send,
{
    fn on_frame_decoded(&mut self, frame: &DecodedFrame) {
        self(frame)
    }
}

/// Decode a sealed frame, deliver it, then release its bank.
///
/// The bank is released after the handler returns, whatever the outcome, so
/// the next frame on this reader always starts from zeroed storage.
pub fn decode_sealed(
    reader: ReaderHandle,
    lines: ReaderLines,
    buffer: &FrameBuffer,
    sealed: SealedFrame,
    handler: Option<&mut dyn FrameHandler>,
) -> DecodedFrame {
    let bits = buffer.read_sealed(&sealed);
    let frame = DecodedFrame::new(reader, lines, bits, sealed.overflowed());

    match frame.format {
        Some(format) => debug!(
            "{} decoded {}: facility={} card={}",
            reader, format, frame.facility_code, frame.card_code
        ),
        None => debug!(
            "{} received unsupported {}-bit frame",
            reader, frame.bit_count
        ),
    }
    if frame.overflowed {
        warn!(
            "{} frame exceeded capacity, extra pulses were dropped",
            reader
        );
    }

    if let Some(handler) = handler {
        handler.on_frame_decoded(&frame);
    }

    buffer.release(sealed);
    frame
}
