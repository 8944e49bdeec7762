//! Common test utilities for integration tests.
//!
//! Helpers here build registries with a short inactivity window, register
//! readers whose decoded frames are recorded for later inspection, and push
//! synthetic pulse trains through capture handles.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hidprox_core::{CardFormat, FrameBits, LineId, PlatformClass};
use hidprox_reader::{CaptureHandle, DecodedFrame, ReaderHandle, ReaderRegistry, RegistryConfig};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Inactivity window used by most tests.
pub const TEST_WAIT_TICKS: u16 = 8;

/// Frames recorded by a reader's handler.
pub type Recorded = Arc<Mutex<Vec<DecodedFrame>>>;

/// Create a registry for `platform` with [`TEST_WAIT_TICKS`].
pub fn create_registry(platform: PlatformClass) -> ReaderRegistry {
    ReaderRegistry::new(RegistryConfig {
        platform,
        wait_ticks: TEST_WAIT_TICKS,
    })
    .unwrap()
}

/// Register a reader on `line0`/`line1` that records every decoded frame.
pub fn register_recording(
    registry: &mut ReaderRegistry,
    line0: u16,
    line1: u16,
) -> (ReaderHandle, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&recorded);
    let handle = registry
        .register(LineId::new(line0), LineId::new(line1), move |frame: &DecodedFrame| {
            sink.lock().unwrap().push(frame.clone());
        })
        .unwrap();
    (handle, recorded)
}

/// Push every bit of `bits` through `capture`.
pub fn send_bits(capture: &CaptureHandle, bits: &FrameBits) {
    for bit in bits.iter() {
        capture.push_bit(bit);
    }
}

/// Encode and push a card through `capture`.
pub fn send_card(capture: &CaptureHandle, format: CardFormat, facility: u32, card: u32) {
    send_bits(capture, &FrameBits::encode(format, facility, card).unwrap());
}

/// Poll `ticks` times and return the number of frames decoded.
pub fn poll_n(registry: &mut ReaderRegistry, ticks: usize) -> usize {
    (0..ticks).map(|_| registry.poll()).sum()
}

/// Poll for one full inactivity window.
pub fn poll_window(registry: &mut ReaderRegistry) -> usize {
    poll_n(registry, TEST_WAIT_TICKS as usize)
}

/// Snapshot of the frames recorded so far.
pub fn recorded(frames: &Recorded) -> Vec<DecodedFrame> {
    frames.lock().unwrap().clone()
}
