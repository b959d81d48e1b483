//! The frame producer: one task that captures, encodes and fans out frames
//! at the current target rate.
//!
//! ```text
//!   ticker ──► tick ──► capture(selector) ──► encode(quality_for(fps)) ──► broadcast
//!     ▲                                                                        │
//!     └── rebuilt when a new rate is applied ◄── RateController mailbox        ▼
//!                                                                     ConnectionRegistry
//! ```
//!
//! A failed capture or encode only loses the current tick. When no viewer is
//! connected the tick returns before capturing anything.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::Backends;
use crate::error::DeskviewError;
use crate::stream::rate::{RateController, quality_for};
use crate::stream::registry::{BroadcastReport, ConnectionRegistry};
use crate::stream::state::StreamState;
use crate::stream::stats::FrameStats;

/// What a single [`FrameProducer::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No viewer connected; nothing captured.
    Idle,
    /// Capture or encode failed; nothing sent.
    Dropped,
    /// A frame was offered to every viewer.
    Broadcast(BroadcastReport),
}

/// Drives the capture → encode → broadcast pipeline.
pub struct FrameProducer {
    state: Arc<StreamState>,
    registry: Arc<ConnectionRegistry>,
    rate_rx: watch::Receiver<u32>,
    backends: Backends,
    fps: u32,
    stats: FrameStats,
}

impl FrameProducer {
    pub fn new(
        state: Arc<StreamState>,
        registry: Arc<ConnectionRegistry>,
        rate: &RateController,
        backends: Backends,
        stats_interval: Duration,
    ) -> Self {
        let fps = state.target_fps();
        Self {
            state,
            registry,
            rate_rx: rate.subscribe(),
            backends,
            fps,
            stats: FrameStats::new(stats_interval),
        }
    }

    /// Frame rate the producer is currently running at.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Consume the pending rate request, if any.
    ///
    /// Returns the new rate when it differs from the running one. The new
    /// rate is published to [`StreamState`] and the stats window restarts.
    pub fn apply_pending_rate(&mut self) -> Option<u32> {
        let requested = *self.rate_rx.borrow_and_update();
        if requested == self.fps {
            return None;
        }
        info!("frame rate {} → {requested} fps (quality {})", self.fps, quality_for(requested));
        self.fps = requested;
        self.state.set_target_fps(requested);
        self.stats.reset();
        Some(requested)
    }

    /// Run one pipeline iteration.
    pub fn tick(&mut self) -> TickOutcome {
        if self.registry.is_empty() {
            return TickOutcome::Idle;
        }

        let selector = self
            .state
            .selector()
            .resolve(self.backends.topology.count());

        let started = Instant::now();
        let frame = match self.backends.capture.capture(selector) {
            Ok(frame) => frame,
            Err(e) => return Self::dropped(&format!("display {selector}"), e),
        };
        let captured = Instant::now();

        let encoded = match self.backends.encoder.encode(&frame, quality_for(self.fps)) {
            Ok(bytes) => bytes,
            Err(e) => return Self::dropped("encode", e),
        };
        let size = encoded.len();
        let report = self.registry.broadcast(encoded);
        let finished = Instant::now();

        self.stats
            .record(captured - started, finished - captured, size * report.delivered);
        self.stats.maybe_log(self.fps);
        TickOutcome::Broadcast(report)
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        self.apply_pending_rate();
        let mut ticker = Self::ticker(self.fps);
        let mut rate_open = true;
        info!("frame producer started at {} fps", self.fps);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = self.rate_rx.changed(), if rate_open => match changed {
                    Ok(()) => {
                        if self.apply_pending_rate().is_some() {
                            ticker = Self::ticker(self.fps);
                        }
                    }
                    Err(_) => {
                        debug!("rate controller dropped; keeping {} fps", self.fps);
                        rate_open = false;
                    }
                },
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        info!("frame producer stopped");
    }

    /// Log a failed tick. Capture and encode failures are routine; anything
    /// else a backend reports is logged as an error.
    fn dropped(stage: &str, e: DeskviewError) -> TickOutcome {
        if e.is_tick_local() {
            warn!("{stage}: {e}");
        } else {
            error!("{stage}: {e}");
        }
        TickOutcome::Dropped
    }

    fn ticker(fps: u32) -> Interval {
        let period = Duration::from_secs(1) / fps.max(1);
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }
}
