//! Structured input events sent by viewers.
//!
//! Every event is decoded against a fixed schema. A missing field, a value of
//! the wrong type or an unknown enum tag makes the whole event fail to decode;
//! the dispatcher drops it.

use serde::{Deserialize, Serialize};

// ── ControlEvent ─────────────────────────────────────────────────

/// A decoded `{"type": ..., "data": {...}}` control message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ControlEvent {
    Mouse(MouseEvent),
    Keyboard(KeyEvent),
    Clipboard(ClipboardEvent),
}

impl ControlEvent {
    /// Tags that mark a JSON object as a control event.
    pub const TYPES: [&'static str; 3] = ["mouse", "keyboard", "clipboard"];
}

// ── Mouse ────────────────────────────────────────────────────────

/// Mouse button named by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Wheel,
    None,
}

/// What the pointer does. Scrolling carries its signed notch count
/// (positive = up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    Drag,
    Scroll(i32),
}

/// A pointer event in coordinates relative to the streamed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMouseEvent")]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    pub action: MouseAction,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawMouseAction {
    Down,
    Up,
    Move,
    Drag,
    Scroll,
}

#[derive(Deserialize)]
struct RawMouseEvent {
    x: i32,
    y: i32,
    button: MouseButton,
    action: RawMouseAction,
    #[serde(default)]
    scroll: Option<i32>,
}

impl TryFrom<RawMouseEvent> for MouseEvent {
    type Error = String;

    fn try_from(raw: RawMouseEvent) -> Result<Self, Self::Error> {
        let action = match raw.action {
            RawMouseAction::Down => MouseAction::Down,
            RawMouseAction::Up => MouseAction::Up,
            RawMouseAction::Move => MouseAction::Move,
            RawMouseAction::Drag => MouseAction::Drag,
            RawMouseAction::Scroll => match raw.scroll {
                Some(delta) => MouseAction::Scroll(delta),
                None => return Err("scroll action without a scroll delta".into()),
            },
        };
        Ok(Self {
            x: raw.x,
            y: raw.y,
            button: raw.button,
            action,
        })
    }
}

// ── Keyboard ─────────────────────────────────────────────────────

/// Key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Down,
    Up,
}

/// Modifier keys held while the key event happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// A key press or release, with the browser's key name (`"a"`, `"Enter"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawKeyEvent")]
pub struct KeyEvent {
    pub key: String,
    pub action: KeyAction,
    pub modifiers: Modifiers,
}

#[derive(Deserialize)]
struct RawKeyEvent {
    key: String,
    action: KeyAction,
    ctrl: bool,
    alt: bool,
    shift: bool,
}

impl From<RawKeyEvent> for KeyEvent {
    fn from(raw: RawKeyEvent) -> Self {
        Self {
            key: raw.key,
            action: raw.action,
            modifiers: Modifiers {
                ctrl: raw.ctrl,
                alt: raw.alt,
                shift: raw.shift,
            },
        }
    }
}

// ── Clipboard ────────────────────────────────────────────────────

/// Clipboard exchange with the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawClipboardEvent")]
pub enum ClipboardEvent {
    /// Ask for the host clipboard text.
    Get,
    /// Replace the host clipboard text.
    Set(String),
    /// Clipboard text pushed by a viewer; accepted and ignored.
    Content(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawClipboardAction {
    Get,
    Set,
    Content,
}

#[derive(Deserialize)]
struct RawClipboardEvent {
    action: RawClipboardAction,
    #[serde(default)]
    text: Option<String>,
}

impl TryFrom<RawClipboardEvent> for ClipboardEvent {
    type Error = String;

    fn try_from(raw: RawClipboardEvent) -> Result<Self, Self::Error> {
        match (raw.action, raw.text) {
            (RawClipboardAction::Get, _) => Ok(Self::Get),
            (RawClipboardAction::Set, Some(text)) => Ok(Self::Set(text)),
            (RawClipboardAction::Content, Some(text)) => Ok(Self::Content(text)),
            (_, None) => Err("clipboard action requires text".into()),
        }
    }
}
