//! Process-wide stream tuning shared by every viewer.

use parking_lot::Mutex;

use crate::error::{DeskviewError, Result};
use crate::types::DisplaySelector;

/// A consistent copy of the tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// Display(s) being streamed.
    pub selector: DisplaySelector,
    /// Frame rate the producer is currently running at.
    pub target_fps: u32,
}

/// Global tuning state: active display selector and applied frame rate.
///
/// Any viewer may change the selector; the last writer wins. The frame rate
/// is only written by the frame producer when it applies a pending request
/// from the [`RateController`](super::RateController).
#[derive(Debug)]
pub struct StreamState {
    inner: Mutex<Tuning>,
}

impl StreamState {
    pub fn new(selector: DisplaySelector, target_fps: u32) -> Self {
        Self {
            inner: Mutex::new(Tuning {
                selector,
                target_fps,
            }),
        }
    }

    /// Copy both values under one lock.
    pub fn snapshot(&self) -> Tuning {
        *self.inner.lock()
    }

    pub fn selector(&self) -> DisplaySelector {
        self.inner.lock().selector
    }

    pub fn target_fps(&self) -> u32 {
        self.inner.lock().target_fps
    }

    /// Change the streamed display(s).
    ///
    /// `DisplaySelector::Index(n)` is accepted only if `n < display_count`;
    /// otherwise the previous selector is kept and
    /// [`DeskviewError::InvalidTuning`] is returned.
    pub fn select(&self, selector: DisplaySelector, display_count: usize) -> Result<()> {
        if let DisplaySelector::Index(n) = selector {
            if n >= display_count {
                return Err(DeskviewError::InvalidTuning(format!(
                    "display {n} out of range ({display_count} attached)"
                )));
            }
        }
        self.inner.lock().selector = selector;
        Ok(())
    }

    pub(crate) fn set_target_fps(&self, fps: u32) {
        self.inner.lock().target_fps = fps;
    }
}
