//! Producer throughput statistics.
//!
//! Accumulates per-phase timings and emitted bytes, and logs a summary at
//! most once per reporting interval. Reset whenever the frame rate changes
//! so every report describes a single configuration.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

/// A summary of one reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    /// Frames broadcast in the window.
    pub frames: u64,
    /// Frames per second actually achieved.
    pub achieved_fps: f64,
    /// Mean capture time in milliseconds.
    pub avg_capture_ms: f64,
    /// Mean encode + fan-out time in milliseconds.
    pub avg_encode_ms: f64,
    /// Mean total tick time in milliseconds.
    pub avg_total_ms: f64,
    /// Outbound throughput in KiB/s.
    pub kib_per_sec: f64,
}

/// Rolling producer counters.
#[derive(Debug)]
pub struct FrameStats {
    interval: Duration,
    window_start: Instant,
    frames: u64,
    bytes: u64,
    capture: Duration,
    encode: Duration,
    total: Duration,
}

impl FrameStats {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: Instant::now(),
            frames: 0,
            bytes: 0,
            capture: Duration::ZERO,
            encode: Duration::ZERO,
            total: Duration::ZERO,
        }
    }

    /// Record one broadcast frame.
    pub fn record(&mut self, capture: Duration, encode: Duration, bytes: usize) {
        self.frames += 1;
        self.bytes += bytes as u64;
        self.capture += capture;
        self.encode += encode;
        self.total += capture + encode;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start a fresh window.
    pub fn reset(&mut self) {
        *self = Self::new(self.interval);
    }

    /// Summarize the window if the reporting interval has elapsed and at
    /// least one frame was recorded, then start a new window.
    pub fn take_report(&mut self) -> Option<StatsReport> {
        let elapsed = self.window_start.elapsed();
        if elapsed < self.interval || self.frames == 0 {
            return None;
        }
        let n = self.frames as f64;
        let secs = elapsed.as_secs_f64();
        let report = StatsReport {
            frames: self.frames,
            achieved_fps: n / secs,
            avg_capture_ms: self.capture.as_secs_f64() * 1000.0 / n,
            avg_encode_ms: self.encode.as_secs_f64() * 1000.0 / n,
            avg_total_ms: self.total.as_secs_f64() * 1000.0 / n,
            kib_per_sec: self.bytes as f64 / 1024.0 / secs,
        };
        self.reset();
        Some(report)
    }

    /// Log a summary when one is due.
    pub fn maybe_log(&mut self, target_fps: u32) {
        if let Some(r) = self.take_report() {
            info!(
                "stream: {:.1}/{target_fps} fps, capture {:.1}ms, encode+send {:.1}ms, total {:.1}ms, {:.1} KiB/s",
                r.achieved_fps, r.avg_capture_ms, r.avg_encode_ms, r.avg_total_ms, r.kib_per_sec
            );
        }
    }
}
