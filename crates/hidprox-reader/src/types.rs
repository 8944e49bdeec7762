//! Common types shared across the reader registry and its stages.
//!
//! This module defines reader identifiers and the observable per-reader state
//! exposed by [`ReaderRegistry::snapshot`](crate::ReaderRegistry::snapshot).

use std::fmt;

use hidprox_core::LineId;
use serde::{Deserialize, Serialize};

use crate::decoder::DecodedFrame;

/// Stable identifier of a registered reader.
///
/// Handles are registration indices. Readers are never removed, so a handle
/// stays valid for the lifetime of the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReaderHandle(usize);

impl ReaderHandle {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registration index of the reader.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ReaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reader#{}", self.0)
    }
}

/// The two data lines a reader is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderLines {
    /// DATA0 line; a falling edge encodes a 0 bit.
    pub line0: LineId,

    /// DATA1 line; a falling edge encodes a 1 bit.
    pub line1: LineId,
}

impl ReaderLines {
    #[must_use]
    pub const fn new(line0: LineId, line1: LineId) -> Self {
        Self { line0, line1 }
    }
}

impl fmt::Display for ReaderLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D0={}, D1={}", self.line0.as_u16(), self.line1.as_u16())
    }
}

/// Where a reader is in its frame cycle.
///
/// ```text
/// Idle ──first pulse──► Accumulating ──countdown expires──► (decoded) ──► Idle
///                          ▲      │
///                          └pulse─┘
/// ```
///
/// Quiescent frames are decoded in the same poll pass that seals them, so the
/// decoded state is never observable between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderPhase {
    /// No bits accumulated.
    Idle,

    /// Bits accumulated and the inactivity window is still open.
    Accumulating,
}

impl fmt::Display for ReaderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderPhase::Idle => write!(f, "Idle"),
            ReaderPhase::Accumulating => write!(f, "Accumulating"),
        }
    }
}

/// Point-in-time view of one reader.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    /// Reader identifier.
    pub reader: ReaderHandle,

    /// Wired data lines.
    pub lines: ReaderLines,

    /// Current phase.
    pub phase: ReaderPhase,

    /// Bits accumulated for the frame in progress.
    pub bit_count: usize,

    /// Ticks left before the frame in progress is sealed.
    ///
    /// An idle reader rests at the full wait window.
    pub countdown: u16,

    /// Frames decoded since registration, supported or not.
    pub frames_decoded: u64,

    /// Most recent decoded frame, if any.
    pub last_frame: Option<DecodedFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_handle_display() {
        assert_eq!(ReaderHandle::new(2).to_string(), "reader#2");
        assert_eq!(ReaderHandle::new(2).index(), 2);
    }

    #[test]
    fn test_reader_lines_display() {
        let lines = ReaderLines::new(LineId::new(2), LineId::new(3));
        assert_eq!(lines.to_string(), "D0=2, D1=3");
    }

    #[test]
    fn test_reader_phase_serialization() {
        let json = serde_json::to_string(&ReaderPhase::Accumulating).unwrap();
        assert_eq!(json, "\"accumulating\"");
    }
}
