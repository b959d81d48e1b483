//! Platform screen capture through `scrap`.
//!
//! `scrap::Capturer` is not `Send` on every platform, so all capturers live
//! on one dedicated thread that answers capture requests:
//!
//! ```text
//!  producer ── Request { selector, reply } ──► capture thread (owns Capturers)
//!           ◄──────── Result<RawFrame> ───────┘
//! ```
//!
//! `scrap` reports display sizes but not positions, so origins come from the
//! configured layout (see `place_displays`).

use std::io::ErrorKind;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use scrap::{Capturer, Display};
use tracing::{debug, info, warn};

use deskview_core::{
    CaptureProvider, DeskviewError, DisplayBounds, DisplaySelector, DisplayTopology, PixelFormat,
    RawFrame, Result,
};

use super::{place_displays, stitch};

/// How long to wait for the platform to produce a fresh frame.
const FRAME_TIMEOUT: Duration = Duration::from_millis(100);
const RETRY_DELAY: Duration = Duration::from_millis(5);

struct Request {
    selector: DisplaySelector,
    reply: mpsc::Sender<Result<RawFrame>>,
}

/// Handle to the capture thread.
pub struct NativeBackend {
    displays: Vec<DisplayBounds>,
    requests: mpsc::Sender<Request>,
}

impl NativeBackend {
    /// Enumerate displays, place them using `layout` and start the capture
    /// thread.
    pub fn start(layout: Vec<DisplayBounds>) -> Result<Self> {
        let (layout_tx, layout_rx) = mpsc::channel();
        let (requests, request_rx) = mpsc::channel::<Request>();

        thread::Builder::new()
            .name("deskview-capture".into())
            .spawn(move || {
                let mut screens = match open_displays(&layout) {
                    Ok(screens) => screens,
                    Err(e) => {
                        let _ = layout_tx.send(Err(e));
                        return;
                    }
                };
                let layout: Vec<DisplayBounds> = screens.iter().map(|s| s.bounds).collect();
                if layout_tx.send(Ok(layout)).is_err() {
                    return;
                }
                for req in request_rx {
                    let result = capture_selected(&mut screens, req.selector);
                    let _ = req.reply.send(result);
                }
                debug!("capture thread exiting");
            })?;

        let displays = layout_rx.recv().map_err(|_| {
            DeskviewError::Capture("capture thread exited during start-up".into())
        })??;
        info!("native capture ready with {} display(s)", displays.len());
        Ok(Self { displays, requests })
    }
}

impl DisplayTopology for NativeBackend {
    fn count(&self) -> usize {
        self.displays.len()
    }

    fn bounds(&self, index: usize) -> Option<DisplayBounds> {
        self.displays.get(index).copied()
    }
}

impl CaptureProvider for NativeBackend {
    fn capture(&self, selector: DisplaySelector) -> Result<RawFrame> {
        let (reply, rx) = mpsc::channel();
        self.requests
            .send(Request { selector, reply })
            .map_err(|_| DeskviewError::Capture("capture thread stopped".into()))?;
        rx.recv()
            .map_err(|_| DeskviewError::Capture("capture thread stopped".into()))?
    }
}

// ── Capture thread ───────────────────────────────────────────────

struct Screen {
    bounds: DisplayBounds,
    capturer: Capturer,
}

fn open_displays(layout: &[DisplayBounds]) -> Result<Vec<Screen>> {
    let displays = Display::all().map_err(|e| DeskviewError::Capture(e.to_string()))?;
    let sizes: Vec<(u32, u32)> = displays
        .iter()
        .map(|d| (d.width() as u32, d.height() as u32))
        .collect();
    let placed = place_displays(&sizes, layout)?;

    let mut screens = Vec::with_capacity(displays.len());
    for (i, (display, bounds)) in displays.into_iter().zip(placed).enumerate() {
        match Capturer::new(display) {
            Ok(capturer) => screens.push(Screen { bounds, capturer }),
            Err(e) => warn!("display {i} skipped: {e}"),
        }
    }
    Ok(screens)
}

fn capture_selected(screens: &mut [Screen], selector: DisplaySelector) -> Result<RawFrame> {
    match selector {
        DisplaySelector::Index(n) => {
            let screen = screens
                .get_mut(n)
                .ok_or_else(|| DeskviewError::Capture(format!("no display {n}")))?;
            grab(screen)
        }
        DisplaySelector::All => {
            let mut parts = Vec::with_capacity(screens.len());
            for screen in screens.iter_mut() {
                parts.push((screen.bounds, grab(screen)?));
            }
            stitch(&parts)
        }
    }
}

fn grab(screen: &mut Screen) -> Result<RawFrame> {
    let DisplayBounds { width, height, .. } = screen.bounds;
    let deadline = Instant::now() + FRAME_TIMEOUT;
    loop {
        match screen.capturer.frame() {
            Ok(frame) => {
                let data = frame.to_vec();
                let stride = (data.len() / height.max(1) as usize) as u32;
                return Ok(RawFrame {
                    width,
                    height,
                    stride,
                    format: PixelFormat::Bgra8,
                    data,
                    timestamp: Instant::now(),
                });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock && Instant::now() < deadline => {
                thread::sleep(RETRY_DELAY);
            }
            Err(e) => return Err(DeskviewError::Capture(e.to_string())),
        }
    }
}
