//! Interrupt-driven Wiegand reader decoding for HID proximity cards.
//!
//! A Wiegand reader reports each bit of a card as a short low pulse on one of
//! two data lines. This crate accumulates those pulses from edge interrupts,
//! detects the end of each frame by inactivity, and decodes the facility and
//! card codes of the Corporate 1000 (35-bit), 26-bit and 32-bit formats.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐  capture  ┌─────────────┐  scan   ┌─────────┐  decode  ┌──────────────┐
//! │ D0 / D1  │──────────►│ FrameBuffer │────────►│ Sealed  │─────────►│ FrameHandler │
//! │ edges    │           │ (per reader)│ timeout │ frame   │          │ callback     │
//! └──────────┘           └─────────────┘         └─────────┘          └──────────────┘
//! ```
//!
//! - **Capture** ([`capture`]) runs in interrupt context. It appends one bit
//!   and reloads the inactivity countdown in O(1), without locks or allocation.
//! - **Scan** ([`scanner`]) runs once per [`ReaderRegistry::poll`] and seals a
//!   frame when its countdown expires.
//! - **Decode** ([`decoder`]) classifies the sealed frame by length, extracts
//!   its fields and calls the reader's [`FrameHandler`].
//!
//! # Concurrency
//!
//! Interrupt and poll sides share each reader's [`FrameBuffer`] through a
//! single packed atomic state word and two alternating bit banks. A pulse that
//! arrives while a frame is being decoded starts the next frame in the other
//! bank, so neither side ever observes a torn frame.
//!
//! # Hosting
//!
//! On bare metal, bind lines through an [`InterruptController`] and call
//! [`ReaderRegistry::poll`] from the main loop. On a hosted runtime,
//! [`driver::spawn_poller`] runs the loop on a tokio task.
//!
//! # Examples
//!
//! ```
//! use hidprox_core::{CardFormat, LineId, PlatformClass};
//! use hidprox_reader::mock::{MockInterruptController, WiegandTransmitter};
//! use hidprox_reader::{DecodedFrame, ReaderRegistry, RegistryConfig};
//!
//! let config = RegistryConfig {
//!     platform: PlatformClass::AtMega2560,
//!     wait_ticks: 10,
//! };
//! let mut registry = ReaderRegistry::new(config)?;
//! let reader = registry.register(LineId::new(2), LineId::new(3), |frame: &DecodedFrame| {
//!     println!("{:?}", frame.card_number());
//! })?;
//!
//! let mut controller = MockInterruptController::new();
//! registry.attach(&mut controller, reader)?;
//!
//! WiegandTransmitter::over_lines(&controller, registry.lines(reader)?)
//!     .send_card(CardFormat::Corporate1000, 1000, 54321)?;
//!
//! let decoded: usize = (0..10).map(|_| registry.poll()).sum();
//! assert_eq!(decoded, 1);
//! # Ok::<(), hidprox_reader::ReaderError>(())
//! ```

pub mod capture;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod frame;
pub mod interrupt;
pub mod mock;
pub mod registry;
pub mod scanner;
pub mod types;

// Re-export commonly used types for convenience
pub use capture::CaptureHandle;
pub use decoder::{DecodedFrame, FrameHandler};
pub use error::{ReaderError, Result};
pub use frame::{FrameBuffer, SealedFrame};
pub use interrupt::{EdgeCallback, InterruptController};
pub use registry::{ReaderRegistry, RegistryConfig};
pub use types::{ReaderHandle, ReaderLines, ReaderPhase, ReaderSnapshot};

// Re-export driver types
pub use driver::{ChannelHandler, PollerConfig, PollerHandle, spawn_poller};
