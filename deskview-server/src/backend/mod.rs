//! Concrete collaborators: capture backends, the JPEG encoder and the
//! platform input injector.

pub mod input;
pub mod jpeg;
#[cfg(feature = "native-capture")]
pub mod native;
pub mod pattern;

use std::sync::Arc;
use std::time::Instant;

use deskview_core::{
    Backends, DeskviewError, DisplayBounds, DisplayTopology, PixelFormat, RawFrame, Result,
};

use crate::config::{CaptureBackend, ServerConfig};

pub use input::CommandInjector;
pub use jpeg::JpegEncoder;
pub use pattern::PatternBackend;

/// Build the collaborators selected by `config`.
pub fn build(config: &ServerConfig) -> Result<Backends> {
    let injector = Arc::new(CommandInjector::new());
    let encoder = Arc::new(JpegEncoder);
    match config.capture.backend {
        CaptureBackend::Pattern => {
            let displays = config.capture.displays.iter().map(|&d| d.into()).collect();
            let pattern = Arc::new(PatternBackend::new(displays));
            Ok(Backends {
                topology: pattern.clone(),
                capture: pattern,
                encoder,
                injector,
            })
        }
        #[cfg(feature = "native-capture")]
        CaptureBackend::Native => {
            let layout = config.capture.displays.iter().map(|&d| d.into()).collect();
            let native = Arc::new(native::NativeBackend::start(layout)?);
            Ok(Backends {
                topology: native.clone(),
                capture: native,
                encoder,
                injector,
            })
        }
        #[cfg(not(feature = "native-capture"))]
        CaptureBackend::Native => Err(DeskviewError::Config(
            "capture.backend = \"native\" needs the `native-capture` feature".into(),
        )),
    }
}

/// Printable display layout, one line per display.
pub fn describe(topology: &dyn DisplayTopology) -> Vec<String> {
    topology
        .all_bounds()
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{i}: {b}"))
        .collect()
}

/// Virtual-desktop bounds for displays detected with `sizes`, in detection
/// order.
///
/// `configured` supplies the origins when it lists one entry per detected
/// display with the same sizes. A lone display sits at `(0,0)`. Any other
/// layout cannot be placed and is rejected.
#[cfg_attr(not(feature = "native-capture"), allow(dead_code))]
pub(crate) fn place_displays(
    sizes: &[(u32, u32)],
    configured: &[DisplayBounds],
) -> Result<Vec<DisplayBounds>> {
    let listed = configured.len() == sizes.len()
        && configured
            .iter()
            .zip(sizes)
            .all(|(b, &size)| (b.width, b.height) == size);
    if listed {
        return Ok(configured.to_vec());
    }
    match sizes {
        [] => Ok(Vec::new()),
        &[(width, height)] => Ok(vec![DisplayBounds::new(0, 0, width, height)]),
        _ => {
            let found: Vec<String> = sizes.iter().map(|(w, h)| format!("{w}x{h}")).collect();
            Err(DeskviewError::Config(format!(
                "cannot place {} displays ({}); list their origins in order under [[capture.displays]]",
                sizes.len(),
                found.join(", ")
            )))
        }
    }
}

/// Copy per-display BGRA frames into one frame covering their union.
/// Uncovered areas stay black.
pub(crate) fn stitch(parts: &[(DisplayBounds, RawFrame)]) -> Result<RawFrame> {
    let bounds: Vec<DisplayBounds> = parts.iter().map(|(b, _)| *b).collect();
    let union = DisplayBounds::union(&bounds).ok_or(DeskviewError::NoDisplays)?;
    let mut out = RawFrame::blank(union.width, union.height, PixelFormat::Bgra8);

    for (b, frame) in parts {
        if frame.format != PixelFormat::Bgra8 || !frame.is_consistent() {
            return Err(DeskviewError::Capture(format!("cannot stitch display at {b}")));
        }
        let dx = (b.x - union.x) as usize * 4;
        let dy = (b.y - union.y) as u32;
        let rows = frame.height.min(b.height);
        let cols = frame.width.min(b.width) as usize * 4;
        for y in 0..rows {
            let src = &frame.row(y)[..cols];
            out.row_mut(dy + y)[dx..dx + cols].copy_from_slice(src);
        }
    }
    out.timestamp = Instant::now();
    Ok(out)
}
