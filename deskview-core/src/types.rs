//! Shared types for the capture → encode → fan-out pipeline.
//!
//! These are internal representations. The wire vocabulary spoken with
//! viewers lives in [`crate::protocol`].

use std::fmt;
use std::time::Instant;

// ── DisplaySelector ──────────────────────────────────────────────

/// Which display(s) the producer streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplaySelector {
    /// The union of every display (the whole virtual desktop).
    #[default]
    All,
    /// One display, by topology index.
    Index(usize),
}

impl DisplaySelector {
    /// Resolve against the current display count.
    ///
    /// A selector pointing past the end of the topology (displays were
    /// unplugged since it was set) falls back to [`DisplaySelector::All`].
    pub fn resolve(self, display_count: usize) -> Self {
        match self {
            Self::Index(n) if n >= display_count => Self::All,
            other => other,
        }
    }
}

impl fmt::Display for DisplaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Index(n) => write!(f, "{n}"),
        }
    }
}

// ── DisplayBounds ────────────────────────────────────────────────

/// Position and size of one display in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayBounds {
    /// Left edge (may be negative for displays left of the primary).
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DisplayBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Smallest rectangle containing every bounds in `all`.
    pub fn union(all: &[DisplayBounds]) -> Option<DisplayBounds> {
        let first = all.first()?;
        let (mut left, mut top) = (first.x, first.y);
        let (mut right, mut bottom) = (first.right(), first.bottom());
        for b in &all[1..] {
            left = left.min(b.x);
            top = top.min(b.y);
            right = right.max(b.right());
            bottom = bottom.max(b.bottom());
        }
        Some(DisplayBounds::new(
            left,
            top,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

impl fmt::Display for DisplayBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({},{})", self.width, self.height, self.x, self.y)
    }
}

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout for raw captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

// ── RawFrame ─────────────────────────────────────────────────────

/// An uncompressed capture handed from the capture provider to the encoder.
///
/// `data` holds `height` rows of `stride` bytes each; `stride` may be larger
/// than `width * bytes_per_pixel` when the backend pads rows.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in bytes.
    pub stride: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Monotonic capture timestamp.
    pub timestamp: Instant,
}

impl RawFrame {
    /// Allocate a tightly packed frame filled with zeroes.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel() as u32;
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride as usize * height as usize],
            timestamp: Instant::now(),
        }
    }

    /// Total byte size the raw bitmap occupies.
    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Whether `data` is large enough for the declared geometry.
    pub fn is_consistent(&self) -> bool {
        let min_stride = self.width as usize * self.format.bytes_per_pixel();
        self.stride as usize >= min_stride && self.data.len() >= self.byte_len()
    }

    /// Returns the visible bytes of row `y` (padding excluded).
    ///
    /// # Panics
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let end = start + self.width as usize * self.format.bytes_per_pixel();
        &self.data[start..end]
    }

    /// Mutable access to the visible bytes of row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        let end = start + self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..end]
    }
}
