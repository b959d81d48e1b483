//! Synthetic displays for headless hosts and demos.
//!
//! Each display shows a diagonal BGRA gradient with a bright vertical bar
//! that advances every frame, so viewers can see the stream is live.

use std::sync::atomic::{AtomicU32, Ordering};

use deskview_core::{
    CaptureProvider, DeskviewError, DisplayBounds, DisplaySelector, DisplayTopology, PixelFormat,
    RawFrame, Result,
};

use super::stitch;

/// A fixed set of synthetic displays.
#[derive(Debug)]
pub struct PatternBackend {
    displays: Vec<DisplayBounds>,
    frame: AtomicU32,
}

impl PatternBackend {
    pub fn new(displays: Vec<DisplayBounds>) -> Self {
        Self {
            displays,
            frame: AtomicU32::new(0),
        }
    }

    fn render(&self, bounds: DisplayBounds, tick: u32) -> RawFrame {
        let (w, h) = (bounds.width, bounds.height);
        let mut frame = RawFrame::blank(w, h, PixelFormat::Bgra8);
        let bar = if w == 0 { 0 } else { tick.wrapping_mul(8) % w };
        for y in 0..h {
            let row = frame.row_mut(y);
            for x in 0..w {
                let i = x as usize * 4;
                let px = if x.abs_diff(bar) < 4 {
                    [0xFF, 0xFF, 0xFF, 0xFF]
                } else {
                    let r = (x * 255 / w.max(1)) as u8;
                    let g = (y * 255 / h.max(1)) as u8;
                    let b = ((x + y) * 255 / (w + h).max(1)) as u8;
                    [b, g, r, 0xFF]
                };
                row[i..i + 4].copy_from_slice(&px);
            }
        }
        frame
    }
}

impl DisplayTopology for PatternBackend {
    fn count(&self) -> usize {
        self.displays.len()
    }

    fn bounds(&self, index: usize) -> Option<DisplayBounds> {
        self.displays.get(index).copied()
    }
}

impl CaptureProvider for PatternBackend {
    fn capture(&self, selector: DisplaySelector) -> Result<RawFrame> {
        let tick = self.frame.fetch_add(1, Ordering::Relaxed);
        match selector {
            DisplaySelector::Index(n) => {
                let bounds = self
                    .bounds(n)
                    .ok_or_else(|| DeskviewError::Capture(format!("no display {n}")))?;
                Ok(self.render(bounds, tick))
            }
            DisplaySelector::All => {
                let parts: Vec<_> = self
                    .displays
                    .iter()
                    .map(|&b| (b, self.render(b, tick)))
                    .collect();
                stitch(&parts)
            }
        }
    }
}
