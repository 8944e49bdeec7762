//! Reader registry.
//!
//! This module provides the [`ReaderRegistry`], which owns every registered
//! reader's frame buffer and completion handler and drives the scan and decode
//! stages from a single polling context.
//!
//! # Architecture
//!
//! Each reader's [`FrameBuffer`] is shared between the registry and the edge
//! interrupt callbacks through an `Arc`. The interrupt side only ever appends
//! bits; the registry side ticks countdowns, decodes sealed frames and calls
//! handlers.
//!
//! ```text
//!  D0/D1 edge ──► CaptureHandle ──► FrameBuffer ◄── poll() ──► FrameHandler
//!  (interrupt)                      (atomics)       (host loop)
//! ```
//!
//! # Examples
//!
//! ```
//! use hidprox_core::{CardFormat, FrameBits, LineId};
//! use hidprox_reader::{DecodedFrame, ReaderRegistry, RegistryConfig};
//!
//! let config = RegistryConfig { wait_ticks: 5, ..RegistryConfig::default() };
//! let mut registry = ReaderRegistry::new(config).unwrap();
//!
//! let reader = registry
//!     .register(LineId::new(2), LineId::new(3), |frame: &DecodedFrame| {
//!         println!("card {}", frame.card_code);
//!     })
//!     .unwrap();
//!
//! let capture = registry.capture_handle(reader).unwrap();
//! for bit in FrameBits::encode(CardFormat::Wiegand26, 1, 1).unwrap().iter() {
//!     capture.push_bit(bit);
//! }
//!
//! let mut decoded = 0;
//! for _ in 0..5 {
//!     decoded += registry.poll();
//! }
//! assert_eq!(decoded, 1);
//! assert_eq!(registry.last_frame(reader).unwrap().unwrap().card_code, 1);
//! ```

use std::fmt;
use std::sync::Arc;

use hidprox_core::constants::WIEGAND_WAIT_TICKS;
use hidprox_core::{LineId, PlatformClass};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capture::CaptureHandle;
use crate::decoder::{self, DecodedFrame, FrameHandler};
use crate::error::{ReaderError, Result};
use crate::frame::FrameBuffer;
use crate::interrupt::{self, InterruptController};
use crate::scanner;
use crate::types::{ReaderHandle, ReaderLines, ReaderPhase, ReaderSnapshot};

/// Configuration for a [`ReaderRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Platform class, which bounds the number of readers.
    pub platform: PlatformClass,

    /// Poll ticks without a pulse after which a frame is complete.
    pub wait_ticks: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            platform: PlatformClass::default(),
            wait_ticks: WIEGAND_WAIT_TICKS,
        }
    }
}

impl RegistryConfig {
    /// Configuration for `platform` with the default inactivity window.
    #[must_use]
    pub fn for_platform(platform: PlatformClass) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Check that the configuration can drive a registry.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::ConfigurationError`] if `wait_ticks` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.wait_ticks == 0 {
            return Err(ReaderError::configuration("wait_ticks must be non-zero"));
        }
        Ok(())
    }
}

/// Per-reader state held by the registry.
struct ReaderSlot {
    lines: ReaderLines,
    buffer: Arc<FrameBuffer>,
    handler: Option<Box<dyn FrameHandler>>,
    last_frame: Option<DecodedFrame>,
    frames_decoded: u64,
}

impl fmt::Debug for ReaderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSlot")
            .field("lines", &self.lines)
            .field("bit_count", &self.buffer.bit_count())
            .field("has_handler", &self.handler.is_some())
            .field("frames_decoded", &self.frames_decoded)
            .finish_non_exhaustive()
    }
}

/// Owns the registered readers and runs their scan and decode stages.
///
/// # Lifecycle
///
/// 1. Create the registry with a [`RegistryConfig`]
/// 2. Register readers, up to the platform limit
/// 3. Bind each reader's data lines with [`attach`](Self::attach), or feed
///    pulses through a [`CaptureHandle`]
/// 4. Call [`poll`](Self::poll) once per host loop iteration
///
/// Readers are never removed. Handles stay valid for the registry's lifetime.
#[derive(Debug)]
pub struct ReaderRegistry {
    config: RegistryConfig,
    readers: Vec<ReaderSlot>,
}

impl ReaderRegistry {
    /// Create an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Reader registry created for {} (wait_ticks={})",
            config.platform, config.wait_ticks
        );
        Ok(Self {
            config,
            readers: Vec::new(),
        })
    }

    /// Create an empty registry for `platform` with the default inactivity
    /// window.
    #[must_use]
    pub fn for_platform(platform: PlatformClass) -> Self {
        Self {
            config: RegistryConfig::for_platform(platform),
            readers: Vec::new(),
        }
    }

    /// Registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Maximum number of readers, or `None` when unbounded.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.config.platform.max_readers()
    }

    /// Number of registered readers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Whether no reader has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Handles of all registered readers in registration order.
    pub fn handles(&self) -> impl Iterator<Item = ReaderHandle> + '_ {
        (0..self.readers.len()).map(ReaderHandle::new)
    }

    /// Register a reader wired to `line0` (DATA0) and `line1` (DATA1).
    ///
    /// `handler` is called from [`poll`](Self::poll) once per completed frame.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::CapacityExceeded`] if the platform already hosts
    /// its maximum number of readers. The registry is left unchanged.
    pub fn register<H>(&mut self, line0: LineId, line1: LineId, handler: H) -> Result<ReaderHandle>
    where
        H: FrameHandler + 'static,
    {
        let handler: Box<dyn FrameHandler> = Box::new(handler);
        self.insert(ReaderLines::new(line0, line1), Some(handler))
    }

    /// Register a reader with no completion handler.
    ///
    /// Decoded frames are still counted and available from
    /// [`last_frame`](Self::last_frame).
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::CapacityExceeded`] if the platform is full.
    pub fn register_without_handler(&mut self, line0: LineId, line1: LineId) -> Result<ReaderHandle> {
        self.insert(ReaderLines::new(line0, line1), None)
    }

    fn insert(
        &mut self,
        lines: ReaderLines,
        handler: Option<Box<dyn FrameHandler>>,
    ) -> Result<ReaderHandle> {
        if let Some(limit) = self.capacity()
            && self.readers.len() >= limit
        {
            warn!(
                "Refusing reader on {}: {} supports at most {} reader(s)",
                lines, self.config.platform, limit
            );
            return Err(ReaderError::capacity_exceeded(self.config.platform, limit));
        }

        let buffer = Arc::new(FrameBuffer::new(self.config.wait_ticks)?);
        let handle = ReaderHandle::new(self.readers.len());
        self.readers.push(ReaderSlot {
            lines,
            buffer,
            handler,
            last_frame: None,
            frames_decoded: 0,
        });
        info!("Registered {} on {}", handle, lines);
        Ok(handle)
    }

    fn slot(&self, handle: ReaderHandle) -> Result<&ReaderSlot> {
        self.readers
            .get(handle.index())
            .ok_or_else(|| ReaderError::unknown_reader(handle))
    }

    /// Data lines of a registered reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn lines(&self, handle: ReaderHandle) -> Result<ReaderLines> {
        Ok(self.slot(handle)?.lines)
    }

    /// Interrupt-side handle that appends bits to a reader's frame.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn capture_handle(&self, handle: ReaderHandle) -> Result<CaptureHandle> {
        let slot = self.slot(handle)?;
        Ok(CaptureHandle::new(handle, Arc::clone(&slot.buffer)))
    }

    /// Record a falling edge on the reader's DATA0 line (a 0 bit).
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn on_line0_edge(&self, handle: ReaderHandle) -> Result<()> {
        self.slot(handle)?.buffer.capture(false);
        Ok(())
    }

    /// Record a falling edge on the reader's DATA1 line (a 1 bit).
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn on_line1_edge(&self, handle: ReaderHandle) -> Result<()> {
        self.slot(handle)?.buffer.capture(true);
        Ok(())
    }

    /// Bind a reader's data lines to falling-edge interrupts on `controller`.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle, or the
    /// controller's [`ReaderError::InterruptBinding`] error.
    pub fn attach<C>(&self, controller: &mut C, handle: ReaderHandle) -> Result<()>
    where
        C: InterruptController + ?Sized,
    {
        let lines = self.lines(handle)?;
        let capture = self.capture_handle(handle)?;
        interrupt::attach_capture(controller, lines, &capture)?;
        info!("Bound {} interrupts on {}", handle, lines);
        Ok(())
    }

    /// Advance every reader by one tick and decode frames that completed.
    ///
    /// Handlers of completed frames are called before this returns. Returns the
    /// number of frames decoded on this tick.
    pub fn poll(&mut self) -> usize {
        let mut decoded = 0;
        for (index, slot) in self.readers.iter_mut().enumerate() {
            let reader = ReaderHandle::new(index);
            let Some(sealed) = scanner::scan(reader, &slot.buffer) else {
                continue;
            };

            let handler = slot
                .handler
                .as_mut()
                .map(|h| &mut **h as &mut dyn FrameHandler);
            let frame = decoder::decode_sealed(reader, slot.lines, &slot.buffer, sealed, handler);
            slot.frames_decoded += 1;
            slot.last_frame = Some(frame);
            decoded += 1;
        }
        decoded
    }

    /// Most recent decoded frame of a reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn last_frame(&self, handle: ReaderHandle) -> Result<Option<&DecodedFrame>> {
        Ok(self.slot(handle)?.last_frame.as_ref())
    }

    /// Point-in-time view of a reader.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn snapshot(&self, handle: ReaderHandle) -> Result<ReaderSnapshot> {
        let slot = self.slot(handle)?;
        let bit_count = slot.buffer.bit_count();
        let phase = if bit_count == 0 {
            ReaderPhase::Idle
        } else {
            ReaderPhase::Accumulating
        };

        Ok(ReaderSnapshot {
            reader: handle,
            lines: slot.lines,
            phase,
            bit_count,
            countdown: slot.buffer.countdown(),
            frames_decoded: slot.frames_decoded,
            last_frame: slot.last_frame.clone(),
        })
    }

    /// Snapshots of every reader in registration order.
    pub fn snapshots(&self) -> Vec<ReaderSnapshot> {
        self.handles()
            .filter_map(|handle| self.snapshot(handle).ok())
            .collect()
    }

    /// Discard the frame in progress on a reader without decoding it.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::UnknownReader`] for a foreign handle.
    pub fn reset_reader(&self, handle: ReaderHandle) -> Result<()> {
        let slot = self.slot(handle)?;
        let dropped = slot.buffer.bit_count();
        slot.buffer.reset();
        if dropped > 0 {
            debug!("{} reset, discarded {} bits", handle, dropped);
        }
        Ok(())
    }
}
