//! Edge interrupt binding.
//!
//! The registry does not talk to hardware directly. Platforms expose their
//! pin-change or external interrupts through [`InterruptController`], and the
//! functions here bind a reader's two data lines to falling-edge callbacks
//! that feed its frame buffer.
//!
//! A controller implementation must:
//!
//! - Invoke each callback from the line's falling-edge interrupt
//! - Never invoke a callback concurrently with itself
//! - Report lines it cannot bind as [`ReaderError::InterruptBinding`]

use hidprox_core::LineId;

use crate::capture::CaptureHandle;
use crate::error::Result;
use crate::types::ReaderLines;

/// Callback run from a falling-edge interrupt.
pub type EdgeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Platform interrupt controller.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use hidprox_core::LineId;
/// use hidprox_reader::interrupt::{EdgeCallback, InterruptController};
///
/// #[derive(Default)]
/// struct Table(HashMap<LineId, EdgeCallback>);
///
/// impl InterruptController for Table {
///     fn attach_falling_edge(
///         &mut self,
///         line: LineId,
///         callback: EdgeCallback,
///     ) -> hidprox_reader::Result<()> {
///         self.0.insert(line, callback);
///         Ok(())
///     }
/// }
/// ```
pub trait InterruptController {
    /// Run `callback` on every falling edge of `line`.
    ///
    /// Binding a line that already has a callback replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::InterruptBinding`] if the line cannot raise
    /// interrupts on this platform.
    ///
    /// [`ReaderError::InterruptBinding`]: crate::ReaderError::InterruptBinding
    fn attach_falling_edge(&mut self, line: LineId, callback: EdgeCallback) -> Result<()>;
}

/// Bind `on_line0` and `on_line1` to the falling edges of `line0` and `line1`.
///
/// Lines are bound in order; if `line1` fails, `line0` stays bound.
///
/// # Errors
///
/// Propagates the controller's binding error.
pub fn attach_reader_interrupts<C>(
    controller: &mut C,
    line0: LineId,
    line1: LineId,
    on_line0: EdgeCallback,
    on_line1: EdgeCallback,
) -> Result<()>
where
    C: InterruptController + ?Sized,
{
    controller.attach_falling_edge(line0, on_line0)?;
    controller.attach_falling_edge(line1, on_line1)?;
    Ok(())
}

/// Bind a reader's data lines so that each edge appends a bit through
/// `capture`.
///
/// # Errors
///
/// Propagates the controller's binding error.
pub fn attach_capture<C>(controller: &mut C, lines: ReaderLines, capture: &CaptureHandle) -> Result<()>
where
    C: InterruptController + ?Sized,
{
    let zero = capture.clone();
    let one = capture.clone();
    attach_reader_interrupts(
        controller,
        lines.line0,
        lines.line1,
        Box::new(move || zero.on_line0_edge()),
        Box::new(move || one.on_line1_edge()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReaderError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        lines: HashMap<LineId, EdgeCallback>,
        refuse: Option<LineId>,
    }

    impl InterruptController for Recorder {
        fn attach_falling_edge(&mut self, line: LineId, callback: EdgeCallback) -> Result<()> {
            if self.refuse == Some(line) {
                return Err(ReaderError::interrupt_binding(line, "no interrupt on line"));
            }
            self.lines.insert(line, callback);
            Ok(())
        }
    }

    #[test]
    fn test_attach_binds_both_lines() {
        let zeros = Arc::new(AtomicUsize::new(0));
        let ones = Arc::new(AtomicUsize::new(0));
        let (z, o) = (Arc::clone(&zeros), Arc::clone(&ones));

        let mut controller = Recorder::default();
        attach_reader_interrupts(
            &mut controller,
            LineId::new(2),
            LineId::new(3),
            Box::new(move || {
                z.fetch_add(1, Ordering::SeqCst);
            }),
            Box::new(move || {
                o.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        (controller.lines[&LineId::new(2)])();
        (controller.lines[&LineId::new(3)])();
        (controller.lines[&LineId::new(3)])();
        assert_eq!(zeros.load(Ordering::SeqCst), 1);
        assert_eq!(ones.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_attach_propagates_refusal() {
        let mut controller = Recorder {
            refuse: Some(LineId::new(3)),
            ..Recorder::default()
        };
        let error = attach_reader_interrupts(
            &mut controller,
            LineId::new(2),
            LineId::new(3),
            Box::new(|| {}),
            Box::new(|| {}),
        )
        .unwrap_err();

        assert!(matches!(error, ReaderError::InterruptBinding { .. }));
        assert!(controller.lines.contains_key(&LineId::new(2)));
        assert!(!controller.lines.contains_key(&LineId::new(3)));
    }
}
