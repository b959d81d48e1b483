//! Frame-rate requests and the FPS → quality table.
//!
//! Requests land in a single-slot mailbox (a `watch` channel): a newer
//! request overwrites one the producer has not consumed yet, so only the
//! latest value is ever applied.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{DeskviewError, Result};

/// Lowest accepted frame rate.
pub const MIN_FPS: u32 = 1;
/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 120;

/// Compression quality for a given frame rate.
///
/// | fps      | quality |
/// |----------|---------|
/// | ≥ 90     | 30      |
/// | 60 – 89  | 35      |
/// | 30 – 59  | 50      |
/// | 6 – 29   | 70      |
/// | ≤ 5      | 90      |
pub const fn quality_for(fps: u32) -> u8 {
    match fps {
        90.. => 30,
        60..=89 => 35,
        30..=59 => 50,
        6..=29 => 70,
        _ => 90,
    }
}

/// Entry point for frame-rate changes, cloneable across viewer tasks.
#[derive(Debug, Clone)]
pub struct RateController {
    mailbox: Arc<watch::Sender<u32>>,
}

impl RateController {
    /// Create a controller whose mailbox starts at `initial_fps`
    /// (clamped into `MIN_FPS..=MAX_FPS`).
    pub fn new(initial_fps: u32) -> Self {
        let (tx, _) = watch::channel(initial_fps.clamp(MIN_FPS, MAX_FPS));
        Self {
            mailbox: Arc::new(tx),
        }
    }

    /// Request a new target frame rate.
    ///
    /// Values outside `1..=120` are rejected with
    /// [`DeskviewError::InvalidTuning`] and leave everything unchanged.
    pub fn request_fps(&self, fps: i64) -> Result<()> {
        let fps = u32::try_from(fps)
            .ok()
            .filter(|f| (MIN_FPS..=MAX_FPS).contains(f))
            .ok_or_else(|| {
                DeskviewError::InvalidTuning(format!("fps {fps} outside {MIN_FPS}..={MAX_FPS}"))
            })?;
        self.mailbox.send_replace(fps);
        Ok(())
    }

    /// Most recently requested frame rate (applied or not).
    pub fn requested(&self) -> u32 {
        *self.mailbox.borrow()
    }

    /// Receiver end of the mailbox, for the frame producer.
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.mailbox.subscribe()
    }

    /// See [`quality_for`].
    pub fn quality_for(fps: u32) -> u8 {
        quality_for(fps)
    }
}
