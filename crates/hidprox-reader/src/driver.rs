//! Async poll driver.
//!
//! On a hosted platform there is no bare-metal main loop to call
//! [`ReaderRegistry::poll`] from. This module runs the poll loop on a tokio
//! task at a fixed tick interval and forwards decoded frames into a channel.
//!
//! ```text
//! ┌──────────────┐  interval   ┌──────────────┐  try_send  ┌──────────────┐
//! │ Poller task  │────────────►│ registry.poll│───────────►│ mpsc channel │──► consumer
//! └──────────────┘             └──────────────┘            └──────────────┘
//!        ▲
//!        └── shutdown (oneshot) returns the registry
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use hidprox_core::LineId;
//! use hidprox_reader::driver::{ChannelHandler, PollerConfig, spawn_poller};
//! use hidprox_reader::{ReaderRegistry, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> hidprox_reader::Result<()> {
//!     let mut registry = ReaderRegistry::new(RegistryConfig::default())?;
//!     let (handler, mut frames) = ChannelHandler::new(16);
//!     registry.register(LineId::new(2), LineId::new(3), handler)?;
//!
//!     let poller = spawn_poller(registry, PollerConfig::default())?;
//!     if let Some(frame) = frames.recv().await {
//!         println!("card {:?}", frame.card_number());
//!     }
//!
//!     let _registry = poller.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hidprox_core::constants::DEFAULT_TICK_INTERVAL_US;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::decoder::{DecodedFrame, FrameHandler};
use crate::error::{ReaderError, Result};
use crate::registry::ReaderRegistry;

/// Configuration for the background poll task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Interval between poll ticks in microseconds.
    pub tick_interval_us: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_interval_us: DEFAULT_TICK_INTERVAL_US,
        }
    }
}

impl PollerConfig {
    /// Interval between poll ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(self.tick_interval_us)
    }

    /// Check that the configuration can drive a poll task.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::ConfigurationError`] if the interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_us == 0 {
            return Err(ReaderError::configuration(
                "tick_interval_us must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Handle to a running poll task.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<ReaderRegistry>,
}

impl PollerHandle {
    /// Whether the poll task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the poll task and take the registry back.
    ///
    /// Frames still accumulating are left in place and complete on the next
    /// poll of the returned registry.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::TaskFailed`] if the task panicked or was aborted.
    pub async fn shutdown(self) -> Result<ReaderRegistry> {
        // The task only exits on this signal, so a closed receiver means it died.
        let _ = self.shutdown_tx.send(());
        let registry = self
            .task
            .await
            .map_err(|e| ReaderError::task_failed(e.to_string()))?;
        info!("Poll task stopped ({} readers)", registry.len());
        Ok(registry)
    }
}

/// Move `registry` onto a tokio task that polls it every tick interval.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an error if `config` fails validation.
pub fn spawn_poller(mut registry: ReaderRegistry, config: PollerConfig) -> Result<PollerHandle> {
    config.validate()?;
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let period = config.tick_interval();

    info!(
        "Starting poll task for {} readers every {:?}",
        registry.len(),
        period
    );

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => {
                    registry.poll();
                }
            }
        }
        registry
    });

    Ok(PollerHandle { shutdown_tx, task })
}

/// Frame handler that forwards decoded frames into a bounded channel.
///
/// Sending never blocks the poll loop. When the channel is full the frame is
/// dropped and counted; clones share the same counter, so keep one to read
/// [`dropped_frames`](Self::dropped_frames) after moving another into the
/// registry.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::Sender<DecodedFrame>,
    dropped: Arc<AtomicU64>,
}

impl ChannelHandler {
    /// Create a handler and the receiving end of its channel.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DecodedFrame>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handler = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (handler, rx)
    }

    /// Frames discarded because the channel was full or closed.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FrameHandler for ChannelHandler {
    fn on_frame_decoded(&mut self, frame: &DecodedFrame) {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(frame)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Frame channel full, dropping frame from {}", frame.reader);
            }
            Err(mpsc::error::TrySendError::Closed(frame)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Frame channel closed, dropping frame from {}", frame.reader);
            }
        }
    }
}
