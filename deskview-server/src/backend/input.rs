//! Host input injection and clipboard access.
//!
//! # Platform
//!
//! - Linux / BSD: `xdotool` for pointer and keys, `xclip` for the clipboard.
//! - macOS: `osascript` (CoreGraphics events through JavaScript for
//!   Automation, System Events keystrokes), `pbcopy` / `pbpaste`.
//! - Windows: Win32 `SendInput`; PowerShell `Get-Clipboard` / `Set-Clipboard`.
//!
//! Browser key names (`"Enter"`, `"ArrowLeft"`, `" "`, ...) are translated to
//! the names each platform tool expects.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::trace;

use deskview_core::{
    DeskviewError, InputInjector, KeyAction, Modifiers, MouseAction, MouseButton, Result,
};

// ── CommandInjector ──────────────────────────────────────────────

/// Injects input into the local desktop session.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandInjector;

impl CommandInjector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InputInjector for CommandInjector {
    async fn mouse(&self, x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()> {
        platform::mouse(x, y, button, action).await
    }

    async fn keyboard(&self, key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()> {
        platform::keyboard(key, action, modifiers).await
    }

    async fn clipboard_get(&self) -> Result<String> {
        platform::clipboard_get().await
    }

    async fn clipboard_set(&self, text: &str) -> Result<()> {
        platform::clipboard_set(text).await
    }
}

/// Run an external tool, optionally feeding `stdin`, and return its stdout.
#[cfg_attr(not(any(unix, target_os = "windows")), allow(dead_code))]
async fn run(program: &str, args: &[String], stdin: Option<&str>) -> Result<String> {
    trace!("exec {program} {args:?}");
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| DeskviewError::Injection(format!("{program}: {e}")))?;
    if let (Some(text), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(text.as_bytes())
            .await
            .map_err(|e| DeskviewError::Injection(format!("{program} stdin: {e}")))?;
    }
    let out = child
        .wait_with_output()
        .await
        .map_err(|e| DeskviewError::Injection(format!("{program}: {e}")))?;
    if !out.status.success() {
        return Err(DeskviewError::Injection(format!(
            "{program} exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

fn unsupported(button: MouseButton, action: MouseAction) -> DeskviewError {
    DeskviewError::Injection(format!("{action:?} with button {button:?} is not injectable"))
}

// ── xdotool ──────────────────────────────────────────────────────

#[cfg(any(test, all(unix, not(target_os = "macos"))))]
mod xdo {
    use super::*;

    fn button_number(button: MouseButton) -> Option<&'static str> {
        match button {
            MouseButton::Left => Some("1"),
            MouseButton::Middle => Some("2"),
            MouseButton::Right => Some("3"),
            MouseButton::Wheel | MouseButton::None => None,
        }
    }

    pub(super) fn mouse_args(
        x: i32,
        y: i32,
        button: MouseButton,
        action: MouseAction,
    ) -> Result<Vec<String>> {
        let mut args = vec!["mousemove".to_string(), x.to_string(), y.to_string()];
        match action {
            MouseAction::Move | MouseAction::Drag => {}
            MouseAction::Down | MouseAction::Up => {
                let n = button_number(button).ok_or_else(|| unsupported(button, action))?;
                let verb = if action == MouseAction::Down { "mousedown" } else { "mouseup" };
                args.extend([verb.to_string(), n.to_string()]);
            }
            MouseAction::Scroll(0) => {}
            MouseAction::Scroll(delta) => {
                // Button 4 scrolls up, 5 scrolls down.
                let wheel = if delta > 0 { "4" } else { "5" };
                args.extend([
                    "click".to_string(),
                    "--repeat".to_string(),
                    delta.unsigned_abs().to_string(),
                    wheel.to_string(),
                ]);
            }
        }
        Ok(args)
    }

    /// xdotool keysym for a browser key name.
    pub(super) fn key_name(key: &str) -> String {
        let mapped = match key {
            " " => "space",
            "Enter" => "Return",
            "Backspace" => "BackSpace",
            "Tab" => "Tab",
            "Escape" => "Escape",
            "Delete" => "Delete",
            "Insert" => "Insert",
            "Home" => "Home",
            "End" => "End",
            "PageUp" => "Page_Up",
            "PageDown" => "Page_Down",
            "ArrowLeft" => "Left",
            "ArrowRight" => "Right",
            "ArrowUp" => "Up",
            "ArrowDown" => "Down",
            "CapsLock" => "Caps_Lock",
            "Control" => "ctrl",
            "Shift" => "shift",
            "Alt" => "alt",
            "Meta" => "super",
            "." => "period",
            "," => "comma",
            "/" => "slash",
            "\\" => "backslash",
            "-" => "minus",
            "=" => "equal",
            ";" => "semicolon",
            "'" => "apostrophe",
            "`" => "grave",
            "[" => "bracketleft",
            "]" => "bracketright",
            other if other.chars().count() == 1 => return other.to_lowercase(),
            other => other,
        };
        mapped.to_string()
    }

    pub(super) fn key_args(key: &str, action: KeyAction, modifiers: Modifiers) -> Vec<String> {
        let name = key_name(key);
        let mut combo = String::new();
        if !matches!(name.as_str(), "ctrl" | "alt" | "shift" | "super") {
            if modifiers.ctrl {
                combo.push_str("ctrl+");
            }
            if modifiers.alt {
                combo.push_str("alt+");
            }
            if modifiers.shift {
                combo.push_str("shift+");
            }
        }
        combo.push_str(&name);
        let verb = match action {
            KeyAction::Down => "keydown",
            KeyAction::Up => "keyup",
        };
        vec![verb.to_string(), combo]
    }
}

// ── AppleScript / JXA ────────────────────────────────────────────

#[cfg(any(test, target_os = "macos"))]
mod apple {
    use super::*;

    /// JavaScript for Automation posting one CoreGraphics mouse event.
    pub(super) fn mouse_script(
        x: i32,
        y: i32,
        button: MouseButton,
        action: MouseAction,
    ) -> Result<String> {
        let event = match (action, button) {
            (MouseAction::Scroll(delta), _) => {
                return Ok(format!(
                    "ObjC.import('CoreGraphics'); \
                     $.CGEventPost($.kCGHIDEventTap, \
                     $.CGEventCreateScrollWheelEvent(null, $.kCGScrollEventUnitLine, 1, {delta}));"
                ));
            }
            (MouseAction::Move, _) => "kCGEventMouseMoved",
            (MouseAction::Drag, MouseButton::Right) => "kCGEventRightMouseDragged",
            (MouseAction::Drag, MouseButton::Middle) => "kCGEventOtherMouseDragged",
            (MouseAction::Drag, _) => "kCGEventLeftMouseDragged",
            (MouseAction::Down, MouseButton::Left) => "kCGEventLeftMouseDown",
            (MouseAction::Up, MouseButton::Left) => "kCGEventLeftMouseUp",
            (MouseAction::Down, MouseButton::Right) => "kCGEventRightMouseDown",
            (MouseAction::Up, MouseButton::Right) => "kCGEventRightMouseUp",
            (MouseAction::Down, MouseButton::Middle) => "kCGEventOtherMouseDown",
            (MouseAction::Up, MouseButton::Middle) => "kCGEventOtherMouseUp",
            (MouseAction::Down | MouseAction::Up, _) => return Err(unsupported(button, action)),
        };
        let cg_button = match button {
            MouseButton::Right => "kCGMouseButtonRight",
            MouseButton::Middle => "kCGMouseButtonCenter",
            _ => "kCGMouseButtonLeft",
        };
        Ok(format!(
            "ObjC.import('CoreGraphics'); \
             $.CGEventPost($.kCGHIDEventTap, \
             $.CGEventCreateMouseEvent(null, $.{event}, {{x: {x}, y: {y}}}, $.{cg_button}));"
        ))
    }

    /// System Events virtual key code for non-printing keys.
    pub(super) fn key_code(key: &str) -> Option<u16> {
        Some(match key {
            "Enter" => 36,
            "Tab" => 48,
            " " => 49,
            "Backspace" => 51,
            "Escape" => 53,
            "Home" => 115,
            "PageUp" => 116,
            "Delete" => 117,
            "End" => 119,
            "PageDown" => 121,
            "ArrowLeft" => 123,
            "ArrowRight" => 124,
            "ArrowDown" => 125,
            "ArrowUp" => 126,
            _ => return None,
        })
    }

    /// AppleScript for a key press, or `None` when nothing should be sent.
    ///
    /// System Events only synthesizes whole keystrokes, so releases and
    /// bare modifier presses are not forwarded.
    pub(super) fn key_script(key: &str, action: KeyAction, modifiers: Modifiers) -> Option<String> {
        if action == KeyAction::Up || matches!(key, "Control" | "Shift" | "Alt" | "Meta") {
            return None;
        }
        let mut held = Vec::new();
        if modifiers.ctrl {
            held.push("control down");
        }
        if modifiers.alt {
            held.push("option down");
        }
        if modifiers.shift {
            held.push("shift down");
        }
        let using = if held.is_empty() {
            String::new()
        } else {
            format!(" using {{{}}}", held.join(", "))
        };
        let stroke = match key_code(key) {
            Some(code) => format!("key code {code}"),
            None if key.chars().count() == 1 => {
                let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
                format!("keystroke \"{escaped}\"")
            }
            None => return None,
        };
        Some(format!("tell application \"System Events\" to {stroke}{using}"))
    }
}

// ── Windows virtual keys ─────────────────────────────────────────

#[cfg(any(test, target_os = "windows"))]
mod vk {
    /// Virtual-key code for a named (non-character) browser key.
    pub(super) fn named(key: &str) -> Option<u16> {
        Some(match key {
            "Backspace" => 0x08,
            "Tab" => 0x09,
            "Enter" => 0x0D,
            "Shift" => 0x10,
            "Control" => 0x11,
            "Alt" => 0x12,
            "CapsLock" => 0x14,
            "Escape" => 0x1B,
            " " => 0x20,
            "PageUp" => 0x21,
            "PageDown" => 0x22,
            "End" => 0x23,
            "Home" => 0x24,
            "ArrowLeft" => 0x25,
            "ArrowUp" => 0x26,
            "ArrowRight" => 0x27,
            "ArrowDown" => 0x28,
            "Insert" => 0x2D,
            "Delete" => 0x2E,
            "Meta" => 0x5B,
            f if f.len() >= 2 && f.starts_with('F') => {
                let n: u16 = f[1..].parse().ok()?;
                if !(1..=24).contains(&n) {
                    return None;
                }
                0x70 + n - 1
            }
            _ => return None,
        })
    }

    /// Whether the key needs `KEYEVENTF_EXTENDEDKEY`.
    pub(super) fn is_extended(vk: u16) -> bool {
        matches!(vk, 0x21..=0x28 | 0x2D | 0x2E | 0x5B)
    }

    pub(super) const VK_SHIFT: u16 = 0x10;
    pub(super) const VK_CONTROL: u16 = 0x11;
    pub(super) const VK_MENU: u16 = 0x12;
}

// ── Linux / BSD ──────────────────────────────────────────────────

#[cfg(all(unix, not(target_os = "macos")))]
mod platform {
    use super::*;

    pub(super) async fn mouse(x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()> {
        run("xdotool", &xdo::mouse_args(x, y, button, action)?, None).await?;
        Ok(())
    }

    pub(super) async fn keyboard(key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()> {
        run("xdotool", &xdo::key_args(key, action, modifiers), None).await?;
        Ok(())
    }

    fn xclip_args(direction: &str) -> Vec<String> {
        vec![direction.into(), "-selection".into(), "clipboard".into()]
    }

    pub(super) async fn clipboard_get() -> Result<String> {
        run("xclip", &xclip_args("-o"), None).await
    }

    pub(super) async fn clipboard_set(text: &str) -> Result<()> {
        run("xclip", &xclip_args("-i"), Some(text)).await?;
        Ok(())
    }
}

// ── macOS ────────────────────────────────────────────────────────

#[cfg(target_os = "macos")]
mod platform {
    use super::*;

    pub(super) async fn mouse(x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()> {
        let script = apple::mouse_script(x, y, button, action)?;
        run("osascript", &["-l".into(), "JavaScript".into(), "-e".into(), script], None).await?;
        Ok(())
    }

    pub(super) async fn keyboard(key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()> {
        if let Some(script) = apple::key_script(key, action, modifiers) {
            run("osascript", &["-e".into(), script], None).await?;
        }
        Ok(())
    }

    pub(super) async fn clipboard_get() -> Result<String> {
        run("pbpaste", &[], None).await
    }

    pub(super) async fn clipboard_set(text: &str) -> Result<()> {
        run("pbcopy", &[], Some(text)).await?;
        Ok(())
    }
}

// ── Windows ──────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::UI::Input::KeyboardAndMouse::*;
    use windows::Win32::UI::WindowsAndMessaging::*;

    /// One wheel notch.
    const WHEEL_DELTA: i32 = 120;

    fn send(inputs: &[INPUT]) -> Result<()> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(DeskviewError::Injection(format!(
                "SendInput accepted {sent} of {} events",
                inputs.len()
            )));
        }
        Ok(())
    }

    fn mouse_input(dx: i32, dy: i32, data: u32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: data,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn key_input(vk: u16, up: bool) -> INPUT {
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if up {
            flags |= KEYEVENTF_KEYUP;
        }
        if vk::is_extended(vk) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    /// Map virtual-desktop pixels onto the 0..=65535 absolute range.
    fn normalize(x: i32, y: i32) -> Result<(i32, i32)> {
        let (vx, vy, vw, vh) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if vw <= 1 || vh <= 1 {
            return Err(DeskviewError::Injection("GetSystemMetrics returned 0".into()));
        }
        let ax = ((x - vx) as i64 * 65535 / (vw - 1) as i64) as i32;
        let ay = ((y - vy) as i64 * 65535 / (vh - 1) as i64) as i32;
        Ok((ax, ay))
    }

    pub(super) async fn mouse(x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()> {
        let (ax, ay) = normalize(x, y)?;
        let at = MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK;
        let mut inputs = vec![mouse_input(ax, ay, 0, at)];
        match action {
            MouseAction::Move | MouseAction::Drag => {}
            MouseAction::Down | MouseAction::Up => {
                let down = action == MouseAction::Down;
                let flag = match (button, down) {
                    (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
                    (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
                    (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
                    (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
                    (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
                    (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
                    _ => return Err(unsupported(button, action)),
                };
                inputs.push(mouse_input(0, 0, 0, flag));
            }
            MouseAction::Scroll(0) => {}
            MouseAction::Scroll(delta) => {
                let amount = delta.saturating_mul(WHEEL_DELTA);
                inputs.push(mouse_input(0, 0, amount as u32, MOUSEEVENTF_WHEEL));
            }
        }
        send(&inputs)
    }

    pub(super) async fn keyboard(key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()> {
        let code = match vk::named(key) {
            Some(code) => code,
            None => {
                let mut chars = key.encode_utf16();
                let (Some(unit), None) = (chars.next(), chars.next()) else {
                    return Err(DeskviewError::Injection(format!("unknown key {key:?}")));
                };
                let scan = unsafe { VkKeyScanW(unit) };
                if scan == -1 {
                    return Err(DeskviewError::Injection(format!("no virtual key for {key:?}")));
                }
                (scan as u16) & 0xFF
            }
        };

        let mut held = Vec::new();
        if modifiers.ctrl && code != vk::VK_CONTROL {
            held.push(vk::VK_CONTROL);
        }
        if modifiers.alt && code != vk::VK_MENU {
            held.push(vk::VK_MENU);
        }
        if modifiers.shift && code != vk::VK_SHIFT {
            held.push(vk::VK_SHIFT);
        }

        let inputs: Vec<INPUT> = match action {
            KeyAction::Down => held
                .iter()
                .map(|&m| key_input(m, false))
                .chain(std::iter::once(key_input(code, false)))
                .collect(),
            KeyAction::Up => std::iter::once(key_input(code, true))
                .chain(held.iter().rev().map(|&m| key_input(m, true)))
                .collect(),
        };
        send(&inputs)
    }

    async fn powershell(script: String) -> Result<String> {
        run(
            "powershell",
            &[
                "-NoProfile".into(),
                "-NonInteractive".into(),
                "-Command".into(),
                script,
            ],
            None,
        )
        .await
    }

    pub(super) async fn clipboard_get() -> Result<String> {
        let out = powershell("Get-Clipboard -Raw".into()).await?;
        Ok(out.strip_suffix("\r\n").unwrap_or(&out).to_string())
    }

    pub(super) async fn clipboard_set(text: &str) -> Result<()> {
        let quoted = text.replace('\'', "''");
        powershell(format!("Set-Clipboard -Value '{quoted}'")).await?;
        Ok(())
    }
}

// ── Unsupported platforms ────────────────────────────────────────

#[cfg(not(any(unix, target_os = "windows")))]
mod platform {
    use super::*;

    fn unavailable() -> DeskviewError {
        DeskviewError::Injection("input injection is not available on this platform".into())
    }

    pub(super) async fn mouse(_: i32, _: i32, _: MouseButton, _: MouseAction) -> Result<()> {
        Err(unavailable())
    }

    pub(super) async fn keyboard(_: &str, _: KeyAction, _: Modifiers) -> Result<()> {
        Err(unavailable())
    }

    pub(super) async fn clipboard_get() -> Result<String> {
        Err(unavailable())
    }

    pub(super) async fn clipboard_set(_: &str) -> Result<()> {
        Err(unavailable())
    }
}

// ── Tests ────────────────────────────────────────────────────────
