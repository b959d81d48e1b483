//! Mock collaborators for engine tests.
//!
//! Every mock records what it was asked to do so tests can assert on calls.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use deskview_core::{
    Backends, CaptureProvider, DeskviewError, DisplayBounds, DisplaySelector, DisplayTopology,
    ImageEncoder, InputInjector, KeyAction, Modifiers, MouseAction, MouseButton, PixelFormat,
    RawFrame, Result,
};

/// Create a small BGRA frame with a diagonal gradient.
pub fn create_gradient_frame(width: u32, height: u32) -> RawFrame {
    let mut frame = RawFrame::blank(width, height, PixelFormat::Bgra8);
    for y in 0..height {
        let row = frame.row_mut(y);
        for x in 0..width as usize {
            let r = ((x as u32 * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            row[x * 4..x * 4 + 4].copy_from_slice(&[0x80, g, r, 0xFF]);
        }
    }
    frame
}

// ── Topology ─────────────────────────────────────────────────────

/// Display layout that tests can hot-unplug.
pub struct MockTopology {
    pub displays: Mutex<Vec<DisplayBounds>>,
}

impl MockTopology {
    /// Two 1920x1080 displays side by side.
    pub fn dual() -> Self {
        Self {
            displays: Mutex::new(vec![
                DisplayBounds::new(0, 0, 1920, 1080),
                DisplayBounds::new(1920, 0, 1920, 1080),
            ]),
        }
    }

    /// Remove the highest-indexed display.
    pub fn unplug_last(&self) {
        self.displays.lock().pop();
    }
}

impl DisplayTopology for MockTopology {
    fn count(&self) -> usize {
        self.displays.lock().len()
    }

    fn bounds(&self, index: usize) -> Option<DisplayBounds> {
        self.displays.lock().get(index).copied()
    }
}

// ── Capture ──────────────────────────────────────────────────────

/// Counts calls and remembers the selectors it was asked for.
#[derive(Default)]
pub struct MockCapture {
    pub calls: AtomicUsize,
    pub selectors: Mutex<Vec<DisplaySelector>>,
    pub fail: AtomicBool,
}

impl MockCapture {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl CaptureProvider for MockCapture {
    fn capture(&self, selector: DisplaySelector) -> Result<RawFrame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.selectors.lock().push(selector);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeskviewError::Capture("mock capture failure".into()));
        }
        Ok(create_gradient_frame(8, 4))
    }
}

// ── Encoder ──────────────────────────────────────────────────────

/// Emits `[quality, width, height]` so tests can see the chosen quality.
#[derive(Default)]
pub struct MockEncoder {
    pub qualities: Mutex<Vec<u8>>,
    pub fail: AtomicBool,
}

impl MockEncoder {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ImageEncoder for MockEncoder {
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Bytes> {
        self.qualities.lock().push(quality);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeskviewError::Encode("mock encode failure".into()));
        }
        Ok(Bytes::from(vec![quality, frame.width as u8, frame.height as u8]))
    }
}

// ── Injector ─────────────────────────────────────────────────────

/// A recorded injector call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectorCall {
    Mouse(i32, i32, MouseButton, MouseAction),
    Keyboard(String, KeyAction, Modifiers),
    ClipboardGet,
    ClipboardSet(String),
}

/// Records calls; serves clipboard reads from `clipboard`.
#[derive(Default)]
pub struct MockInjector {
    pub calls: Mutex<Vec<InjectorCall>>,
    pub clipboard: Mutex<String>,
    pub fail: AtomicBool,
}

impl MockInjector {
    pub fn calls(&self) -> Vec<InjectorCall> {
        self.calls.lock().clone()
    }

    pub fn set_clipboard(&self, text: &str) {
        *self.clipboard.lock() = text.to_string();
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DeskviewError::Injection("mock injector failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InputInjector for MockInjector {
    async fn mouse(&self, x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()> {
        self.calls.lock().push(InjectorCall::Mouse(x, y, button, action));
        self.check()
    }

    async fn keyboard(&self, key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()> {
        self.calls
            .lock()
            .push(InjectorCall::Keyboard(key.to_string(), action, modifiers));
        self.check()
    }

    async fn clipboard_get(&self) -> Result<String> {
        self.calls.lock().push(InjectorCall::ClipboardGet);
        self.check()?;
        Ok(self.clipboard.lock().clone())
    }

    async fn clipboard_set(&self, text: &str) -> Result<()> {
        self.calls
            .lock()
            .push(InjectorCall::ClipboardSet(text.to_string()));
        self.check()?;
        *self.clipboard.lock() = text.to_string();
        Ok(())
    }
}

// ── Bundle ───────────────────────────────────────────────────────

/// Mock backends with handles kept for assertions.
pub struct MockBackends {
    pub topology: Arc<MockTopology>,
    pub capture: Arc<MockCapture>,
    pub encoder: Arc<MockEncoder>,
    pub injector: Arc<MockInjector>,
}

impl MockBackends {
    pub fn dual() -> Self {
        Self {
            topology: Arc::new(MockTopology::dual()),
            capture: Arc::new(MockCapture::default()),
            encoder: Arc::new(MockEncoder::default()),
            injector: Arc::new(MockInjector::default()),
        }
    }

    pub fn backends(&self) -> Backends {
        Backends {
            topology: self.topology.clone(),
            capture: self.capture.clone(),
            encoder: self.encoder.clone(),
            injector: self.injector.clone(),
        }
    }
}
