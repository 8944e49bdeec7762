//! Error types for reader registry operations.
//!
//! Every condition here is recoverable. A refused registration leaves the
//! registry untouched, and nothing that happens on the data lines is ever an
//! error: malformed or unknown frames are delivered through the normal
//! completion callback instead.

use hidprox_core::{LineId, PlatformClass};

use crate::types::ReaderHandle;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while registering, binding or driving readers.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The platform cannot host another reader.
    #[error("Reader capacity exceeded: {platform} supports at most {limit} reader(s)")]
    CapacityExceeded {
        platform: PlatformClass,
        limit: usize,
    },

    /// The handle was not issued by this registry.
    #[error("Unknown reader: {handle}")]
    UnknownReader { handle: ReaderHandle },

    /// A data line could not be bound to an edge interrupt.
    #[error("Interrupt binding failed on {line}: {message}")]
    InterruptBinding { line: LineId, message: String },

    /// Invalid registry or poller configuration.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// The background poll task terminated abnormally.
    #[error("Poll task failed: {message}")]
    TaskFailed { message: String },

    /// Error raised by a core value type.
    #[error(transparent)]
    Core(#[from] hidprox_core::Error),
}

impl ReaderError {
    /// Create a new capacity exceeded error.
    pub fn capacity_exceeded(platform: PlatformClass, limit: usize) -> Self {
        Self::CapacityExceeded { platform, limit }
    }

    /// Create a new unknown reader error.
    pub fn unknown_reader(handle: ReaderHandle) -> Self {
        Self::UnknownReader { handle }
    }

    /// Create a new interrupt binding error.
    pub fn interrupt_binding(line: LineId, message: impl Into<String>) -> Self {
        Self::InterruptBinding {
            line,
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new task failure error.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exceeded_error() {
        let error = ReaderError::capacity_exceeded(PlatformClass::AtMega328, 1);
        assert!(matches!(error, ReaderError::CapacityExceeded { limit: 1, .. }));
        assert_eq!(
            error.to_string(),
            "Reader capacity exceeded: atmega328 supports at most 1 reader(s)"
        );
    }

    #[test]
    fn test_unknown_reader_error() {
        let error = ReaderError::unknown_reader(ReaderHandle::new(4));
        assert_eq!(error.to_string(), "Unknown reader: reader#4");
    }

    #[test]
    fn test_interrupt_binding_error() {
        let error = ReaderError::interrupt_binding(LineId::new(7), "line already in use");
        assert_eq!(
            error.to_string(),
            "Interrupt binding failed on line 7: line already in use"
        );
    }

    #[test]
    fn test_core_error_conversion() {
        let error: ReaderError = hidprox_core::Error::UnknownPlatform("z80".to_string()).into();
        assert!(matches!(error, ReaderError::Core(_)));
        assert_eq!(error.to_string(), "Unknown platform class: z80");
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            ReaderError::configuration("wait_ticks must be non-zero"),
            ReaderError::task_failed("panicked"),
        ];

        for error in errors {
            let _ = format!("{}", error);
            let _ = format!("{:?}", error);
        }
    }
}
