//! Simulated Wiegand card reader output.
//!
//! A real reader clocks a frame out as a burst of low pulses, one per bit, on
//! DATA0 or DATA1. [`WiegandTransmitter`] reproduces that burst either through
//! a [`MockInterruptController`] (exercising the interrupt binding) or straight
//! into a [`CaptureHandle`].

use hidprox_core::{CardFormat, FrameBits};

use crate::capture::CaptureHandle;
use crate::error::Result;
use crate::mock::MockInterruptController;
use crate::types::ReaderLines;

#[derive(Debug)]
enum Target<'a> {
    Lines {
        controller: &'a MockInterruptController,
        lines: ReaderLines,
    },
    Capture(CaptureHandle),
}

/// Emits Wiegand frames as data-line pulses.
///
/// # Examples
///
/// ```
/// use hidprox_core::{CardFormat, LineId};
/// use hidprox_reader::mock::{MockInterruptController, WiegandTransmitter};
/// use hidprox_reader::{ReaderRegistry, RegistryConfig};
///
/// let config = RegistryConfig { wait_ticks: 3, ..RegistryConfig::default() };
/// let mut registry = ReaderRegistry::new(config).unwrap();
/// let reader = registry
///     .register_without_handler(LineId::new(2), LineId::new(3))
///     .unwrap();
///
/// let mut controller = MockInterruptController::new();
/// registry.attach(&mut controller, reader).unwrap();
///
/// let transmitter = WiegandTransmitter::over_lines(&controller, registry.lines(reader).unwrap());
/// transmitter.send_card(CardFormat::Wiegand26, 12, 3456).unwrap();
///
/// for _ in 0..3 {
///     registry.poll();
/// }
/// let frame = registry.last_frame(reader).unwrap().unwrap();
/// assert_eq!((frame.facility_code, frame.card_code), (12, 3456));
/// ```
#[derive(Debug)]
pub struct WiegandTransmitter<'a> {
    target: Target<'a>,
}

impl<'a> WiegandTransmitter<'a> {
    /// Transmit by raising edges on `lines` of `controller`.
    pub fn over_lines(controller: &'a MockInterruptController, lines: ReaderLines) -> Self {
        Self {
            target: Target::Lines { controller, lines },
        }
    }

    /// Transmit directly into a reader's capture handle.
    pub fn direct(capture: CaptureHandle) -> Self {
        Self {
            target: Target::Capture(capture),
        }
    }

    /// Emit one pulse.
    ///
    /// # Errors
    ///
    /// Returns an error if the target line has no callback bound.
    pub fn pulse(&self, bit: bool) -> Result<()> {
        match &self.target {
            Target::Lines { controller, lines } => {
                let line = if bit { lines.line1 } else { lines.line0 };
                controller.trigger_falling_edge(line)
            }
            Target::Capture(capture) => {
                capture.push_bit(bit);
                Ok(())
            }
        }
    }

    /// Emit every bit of `bits` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a target line has no callback bound.
    pub fn transmit(&self, bits: &FrameBits) -> Result<()> {
        bits.iter().try_for_each(|bit| self.pulse(bit))
    }

    /// Encode a card in `format` and transmit it.
    ///
    /// Returns the transmitted bits.
    ///
    /// # Errors
    ///
    /// Returns an error if a code does not fit its field or a target line has
    /// no callback bound.
    pub fn send_card(&self, format: CardFormat, facility_code: u32, card_code: u32) -> Result<FrameBits> {
        let bits = FrameBits::encode(format, facility_code, card_code)?;
        self.transmit(&bits)?;
        Ok(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;
    use crate::registry::{ReaderRegistry, RegistryConfig};
    use hidprox_core::LineId;

    #[test]
    fn test_direct_transmit() {
        let mut registry = ReaderRegistry::new(RegistryConfig::default()).unwrap();
        let reader = registry
            .register_without_handler(LineId::new(2), LineId::new(3))
            .unwrap();
        let capture = registry.capture_handle(reader).unwrap();

        let transmitter = WiegandTransmitter::direct(capture.clone());
        let bits = transmitter.send_card(CardFormat::Wiegand32, 1, 2).unwrap();
        assert_eq!(bits.len(), 32);
        assert_eq!(capture.bit_count(), 32);
    }

    #[test]
    fn test_unbound_lines_fail() {
        let controller = MockInterruptController::new();
        let lines = ReaderLines::new(LineId::new(2), LineId::new(3));
        let transmitter = WiegandTransmitter::over_lines(&controller, lines);
        assert!(matches!(
            transmitter.pulse(true),
            Err(ReaderError::InterruptBinding { .. })
        ));
    }

    #[test]
    fn test_field_overflow_rejected() {
        let mut registry = ReaderRegistry::new(RegistryConfig::default()).unwrap();
        let reader = registry
            .register_without_handler(LineId::new(2), LineId::new(3))
            .unwrap();
        let transmitter = WiegandTransmitter::direct(registry.capture_handle(reader).unwrap());

        let error = transmitter
            .send_card(CardFormat::Wiegand26, 256, 0)
            .unwrap_err();
        assert!(matches!(error, ReaderError::Core(_)));
        assert_eq!(registry.snapshot(reader).unwrap().bit_count, 0);
    }
}
