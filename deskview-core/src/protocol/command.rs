//! Plain-text tuning commands: `refresh`, `screen:all`, `screen:<n>`, `fps:<n>`.

use std::str::FromStr;

use crate::error::DeskviewError;
use crate::types::DisplaySelector;

/// A parsed plain-text command.
///
/// Parsing only checks the grammar; range checks against the display
/// topology and the FPS bounds happen when the command is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Liveness ping; no effect.
    Refresh,
    /// Switch the streamed display(s).
    Screen(DisplaySelector),
    /// Request a new target frame rate.
    Fps(i64),
}

impl FromStr for Command {
    type Err = DeskviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "refresh" {
            return Ok(Self::Refresh);
        }
        if let Some(arg) = s.strip_prefix("screen:") {
            if arg == "all" {
                return Ok(Self::Screen(DisplaySelector::All));
            }
            return arg
                .parse::<usize>()
                .map(|n| Self::Screen(DisplaySelector::Index(n)))
                .map_err(|_| DeskviewError::MalformedControl(format!("bad display index {arg:?}")));
        }
        if let Some(arg) = s.strip_prefix("fps:") {
            return arg
                .parse::<i64>()
                .map(Self::Fps)
                .map_err(|_| DeskviewError::MalformedControl(format!("bad fps {arg:?}")));
        }
        Err(DeskviewError::MalformedControl(format!("unknown command {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!("refresh".parse::<Command>().unwrap(), Command::Refresh);
        assert_eq!(
            "screen:all".parse::<Command>().unwrap(),
            Command::Screen(DisplaySelector::All)
        );
        assert_eq!(
            "screen:1".parse::<Command>().unwrap(),
            Command::Screen(DisplaySelector::Index(1))
        );
        assert_eq!("fps:30".parse::<Command>().unwrap(), Command::Fps(30));
        assert_eq!("fps:-5".parse::<Command>().unwrap(), Command::Fps(-5));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(" fps:15\n".parse::<Command>().unwrap(), Command::Fps(15));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!("screen:-1".parse::<Command>().is_err());
        assert!("screen:two".parse::<Command>().is_err());
        assert!("fps:".parse::<Command>().is_err());
        assert!("fps:fast".parse::<Command>().is_err());
    }

    #[test]
    fn rejects_unknown_text() {
        assert!("reboot".parse::<Command>().is_err());
        assert!("REFRESH".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }
}
