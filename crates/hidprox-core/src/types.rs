use crate::{
    Result,
    constants::{
        CARD_FORMAT_CORPORATE_1000, CARD_FORMAT_WIEGAND_26, CARD_FORMAT_WIEGAND_32,
        FRAME_WORD_BITS, FRAME_WORDS, LINES_PER_READER, MAX_READ_BITS,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a physical data line (pin or interrupt number).
///
/// The decoder never interprets this value; it is carried so decoded frames
/// can be attributed to the reader wired to those lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(u16);

impl LineId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        LineId(id)
    }

    /// Get the raw line number.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for LineId {
    fn from(id: u16) -> Self {
        LineId(id)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}

/// Half-open range of bit positions `[start, stop)` within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitRange {
    pub start: usize,
    pub stop: usize,
}

impl BitRange {
    #[must_use]
    pub const fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    /// Number of bits covered by the range.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    /// Largest value representable in this many bits.
    #[must_use]
    pub const fn max_value(&self) -> u32 {
        match self.width() {
            0 => 0,
            w if w >= 32 => u32::MAX,
            w => (1u32 << w) - 1,
        }
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}

/// Supported card formats, identified purely by total frame length.
///
/// | Format | Total bits | Facility field | Card field |
/// |---|---|---|---|
/// | Corporate 1000 | 35 | [2, 14) | [14, 34) |
/// | Wiegand-26 | 26 | [1, 9) | [9, 25) |
/// | Wiegand-32 | 32 | [4, 16) | [16, 32) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFormat {
    /// HID Corporate 1000, 35 bits.
    Corporate1000,
    /// Standard 26-bit Wiegand (H10301).
    Wiegand26,
    /// 32-bit Wiegand.
    Wiegand32,
}

impl CardFormat {
    /// All supported formats in lookup order.
    pub const ALL: [CardFormat; 3] = [
        CardFormat::Corporate1000,
        CardFormat::Wiegand26,
        CardFormat::Wiegand32,
    ];

    /// Select the format whose total length equals `bit_count` exactly.
    ///
    /// Returns `None` for any other length; such frames are reported as
    /// unsupported rather than treated as errors.
    #[must_use]
    pub fn from_bit_count(bit_count: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.bit_length() == bit_count)
    }

    /// Total frame length in bits.
    #[inline]
    #[must_use]
    pub const fn bit_length(self) -> usize {
        match self {
            CardFormat::Corporate1000 => CARD_FORMAT_CORPORATE_1000,
            CardFormat::Wiegand26 => CARD_FORMAT_WIEGAND_26,
            CardFormat::Wiegand32 => CARD_FORMAT_WIEGAND_32,
        }
    }

    /// Bit positions holding the facility code.
    #[must_use]
    pub const fn facility_bits(self) -> BitRange {
        match self {
            CardFormat::Corporate1000 => BitRange::new(2, 14),
            CardFormat::Wiegand26 => BitRange::new(1, 9),
            CardFormat::Wiegand32 => BitRange::new(4, 16),
        }
    }

    /// Bit positions holding the card code.
    #[must_use]
    pub const fn card_bits(self) -> BitRange {
        match self {
            CardFormat::Corporate1000 => BitRange::new(14, 34),
            CardFormat::Wiegand26 => BitRange::new(9, 25),
            CardFormat::Wiegand32 => BitRange::new(16, 32),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CardFormat::Corporate1000 => "Corporate 1000",
            CardFormat::Wiegand26 => "Wiegand-26",
            CardFormat::Wiegand32 => "Wiegand-32",
        }
    }
}

impl fmt::Display for CardFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}-bit)", self.name(), self.bit_length())
    }
}

/// Board family a registry is built for.
///
/// Each reader consumes two interrupt-capable lines, so the number of readers
/// a board can host follows from how many such lines it exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformClass {
    /// ATmega168/328 (Uno class): 2 external interrupts.
    #[serde(rename = "atmega328")]
    AtMega328,
    /// ATmega32U4 (Leonardo, Micro, Teensy class): 5 external interrupts.
    #[serde(rename = "atmega32u4")]
    AtMega32U4,
    /// ATmega1280/2560 (Mega class): 6 external interrupts.
    #[serde(rename = "atmega2560")]
    AtMega2560,
    /// Boards where any input pin can raise an interrupt (Due, Zero, MKR).
    #[default]
    #[serde(rename = "any_pin_interrupt")]
    AnyPinInterrupt,
}

impl PlatformClass {
    /// Number of external interrupt lines, or `None` when every pin qualifies.
    #[must_use]
    pub const fn interrupt_lines(self) -> Option<usize> {
        match self {
            PlatformClass::AtMega328 => Some(2),
            PlatformClass::AtMega32U4 => Some(5),
            PlatformClass::AtMega2560 => Some(6),
            PlatformClass::AnyPinInterrupt => None,
        }
    }

    /// Maximum number of readers, or `None` when unbounded.
    ///
    /// # Examples
    ///
    /// ```
    /// use hidprox_core::PlatformClass;
    ///
    /// assert_eq!(PlatformClass::AtMega328.max_readers(), Some(1));
    /// assert_eq!(PlatformClass::AtMega2560.max_readers(), Some(3));
    /// assert_eq!(PlatformClass::AnyPinInterrupt.max_readers(), None);
    /// ```
    #[must_use]
    pub const fn max_readers(self) -> Option<usize> {
        match self.interrupt_lines() {
            Some(lines) => Some(lines / LINES_PER_READER),
            None => None,
        }
    }
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PlatformClass::AtMega328 => "atmega328",
            PlatformClass::AtMega32U4 => "atmega32u4",
            PlatformClass::AtMega2560 => "atmega2560",
            PlatformClass::AnyPinInterrupt => "any_pin_interrupt",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for PlatformClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atmega328" | "atmega328p" | "atmega168" | "uno" => Ok(PlatformClass::AtMega328),
            "atmega32u4" | "leonardo" | "micro" => Ok(PlatformClass::AtMega32U4),
            "atmega2560" | "atmega1280" | "mega" => Ok(PlatformClass::AtMega2560),
            "any_pin_interrupt" | "any" => Ok(PlatformClass::AnyPinInterrupt),
            other => Err(Error::UnknownPlatform(other.to_string())),
        }
    }
}

/// Fixed-capacity sequence of frame bits in arrival order.
///
/// Positions that were never set read as zero, matching how a Wiegand 0 bit is
/// recorded (a count increment without a write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFrameBits")]
pub struct FrameBits {
    words: [u32; FRAME_WORDS],
    len: usize,
}

/// Unchecked wire form of [`FrameBits`].
#[derive(Deserialize)]
struct RawFrameBits {
    words: [u32; FRAME_WORDS],
    len: usize,
}

impl TryFrom<RawFrameBits> for FrameBits {
    type Error = Error;

    fn try_from(raw: RawFrameBits) -> Result<Self> {
        if raw.len > MAX_READ_BITS {
            return Err(Error::BitIndexOutOfRange {
                index: raw.len,
                capacity: MAX_READ_BITS,
            });
        }
        Ok(Self::from_words(raw.words, raw.len))
    }
}

impl FrameBits {
    /// Create an empty frame.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; FRAME_WORDS],
            len: 0,
        }
    }

    /// Build a frame from raw storage words and a length.
    ///
    /// Bits at or beyond `len` are masked off so they can never leak into a
    /// field extraction.
    #[must_use]
    pub fn from_words(mut words: [u32; FRAME_WORDS], len: usize) -> Self {
        let len = len.min(MAX_READ_BITS);
        for (i, word) in words.iter_mut().enumerate() {
            let base = i * FRAME_WORD_BITS;
            if base >= len {
                *word = 0;
            } else if len - base < FRAME_WORD_BITS {
                *word &= (1u32 << (len - base)) - 1;
            }
        }
        Self { words, len }
    }

    /// Build a frame from a `'0'`/`'1'` string. Other characters are ignored.
    ///
    /// # Errors
    /// Returns `Error::BitIndexOutOfRange` if the string holds more than
    /// [`MAX_READ_BITS`] bits.
    pub fn parse_binary(s: &str) -> Result<Self> {
        let mut bits = FrameBits::new();
        for c in s.chars() {
            match c {
                '0' => bits.push(false)?,
                '1' => bits.push(true)?,
                _ => {}
            }
        }
        Ok(bits)
    }

    /// Build a frame of `format` carrying the given facility and card codes.
    ///
    /// Bits outside the two fields are zero.
    ///
    /// # Errors
    /// Returns `Error::FieldOverflow` if either value does not fit its field.
    ///
    /// # Examples
    ///
    /// ```
    /// use hidprox_core::{CardFormat, FrameBits};
    ///
    /// let bits = FrameBits::encode(CardFormat::Wiegand26, 1, 1).unwrap();
    /// assert_eq!(bits.len(), 26);
    /// assert_eq!(bits.extract(CardFormat::Wiegand26.facility_bits()), 1);
    /// ```
    pub fn encode(format: CardFormat, facility_code: u32, card_code: u32) -> Result<Self> {
        let mut bits = FrameBits::new();
        bits.len = format.bit_length();
        bits.insert("facility", format.facility_bits(), facility_code)?;
        bits.insert("card", format.card_bits(), card_code)?;
        Ok(bits)
    }

    fn insert(&mut self, field: &'static str, range: BitRange, value: u32) -> Result<()> {
        if value > range.max_value() {
            return Err(Error::FieldOverflow {
                field,
                value,
                width: range.width(),
            });
        }
        for (offset, index) in (range.start..range.stop).enumerate() {
            let shift = range.width() - 1 - offset;
            self.set(index, (value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw storage words, bit `i` at word `i / 32`, position `i % 32`.
    #[must_use]
    pub const fn words(&self) -> &[u32; FRAME_WORDS] {
        &self.words
    }

    /// Read the bit at `index`. Positions beyond the frame length read as zero.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        let (word, mask) = Self::locate(index);
        self.words[word] & mask != 0
    }

    /// Set the bit at `index`, extending the frame if needed.
    ///
    /// # Errors
    /// Returns `Error::BitIndexOutOfRange` if `index >= MAX_READ_BITS`.
    pub fn set(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= MAX_READ_BITS {
            return Err(Error::BitIndexOutOfRange {
                index,
                capacity: MAX_READ_BITS,
            });
        }
        let (word, mask) = Self::locate(index);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
        self.len = self.len.max(index + 1);
        Ok(())
    }

    /// Append one bit.
    ///
    /// # Errors
    /// Returns `Error::BitIndexOutOfRange` if the frame is full.
    pub fn push(&mut self, value: bool) -> Result<()> {
        self.set(self.len, value)
    }

    /// Extract a field as a big-endian integer.
    ///
    /// Starting from zero, each bit in the range is shifted in from the right in
    /// ascending index order, so the first bit received is the most significant.
    #[must_use]
    pub fn extract(&self, range: BitRange) -> u32 {
        (range.start..range.stop).fold(0u32, |acc, index| (acc << 1) | u32::from(self.get(index)))
    }

    /// Iterate over the bits in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    #[inline]
    const fn locate(index: usize) -> (usize, u32) {
        (index / FRAME_WORD_BITS, 1u32 << (index % FRAME_WORD_BITS))
    }
}

impl fmt::Display for FrameBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
