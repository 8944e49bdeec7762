//! Mock interrupt controller.

use std::collections::{HashMap, HashSet};
use std::fmt;

use hidprox_core::LineId;

use crate::error::{ReaderError, Result};
use crate::interrupt::{EdgeCallback, InterruptController};

/// In-memory interrupt controller whose edges are raised by the caller.
///
/// # Examples
///
/// ```
/// use hidprox_core::LineId;
/// use hidprox_reader::mock::MockInterruptController;
/// use hidprox_reader::{ReaderRegistry, RegistryConfig};
///
/// let mut registry = ReaderRegistry::new(RegistryConfig::default()).unwrap();
/// let reader = registry
///     .register_without_handler(LineId::new(2), LineId::new(3))
///     .unwrap();
///
/// let mut controller = MockInterruptController::new();
/// registry.attach(&mut controller, reader).unwrap();
///
/// controller.trigger_falling_edge(LineId::new(3)).unwrap();
/// assert_eq!(registry.snapshot(reader).unwrap().bit_count, 1);
/// ```
#[derive(Default)]
pub struct MockInterruptController {
    callbacks: HashMap<LineId, EdgeCallback>,
    unavailable: HashSet<LineId>,
}

impl MockInterruptController {
    /// Create a controller on which every line can raise interrupts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `line` as unable to raise interrupts.
    ///
    /// Binding it fails with [`ReaderError::InterruptBinding`].
    #[must_use]
    pub fn with_unavailable_line(mut self, line: LineId) -> Self {
        self.unavailable.insert(line);
        self
    }

    /// Raise a falling edge on `line`, running its callback.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::InterruptBinding`] if nothing is bound to the
    /// line.
    pub fn trigger_falling_edge(&self, line: LineId) -> Result<()> {
        let callback = self
            .callbacks
            .get(&line)
            .ok_or_else(|| ReaderError::interrupt_binding(line, "no callback attached"))?;
        callback();
        Ok(())
    }

    /// Whether a callback is bound to `line`.
    #[must_use]
    pub fn is_attached(&self, line: LineId) -> bool {
        self.callbacks.contains_key(&line)
    }

    /// Bound lines in ascending order.
    pub fn attached_lines(&self) -> Vec<LineId> {
        let mut lines: Vec<LineId> = self.callbacks.keys().copied().collect();
        lines.sort();
        lines
    }
}

impl InterruptController for MockInterruptController {
    fn attach_falling_edge(&mut self, line: LineId, callback: EdgeCallback) -> Result<()> {
        if self.unavailable.contains(&line) {
            return Err(ReaderError::interrupt_binding(
                line,
                "line cannot raise interrupts",
            ));
        }
        self.callbacks.insert(line, callback);
        Ok(())
    }
}

impl fmt::Debug for MockInterruptController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockInterruptController")
            .field("attached", &self.attached_lines())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}
