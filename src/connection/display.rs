//! DISPLAY name parsing
//!
//! Only local displays are supported: `[host]:N[.screen]` always maps to the
//! UNIX socket `/tmp/.X11-unix/XN`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Directory holding the local X server sockets
pub const X11_UNIX_SOCKET_DIR: &str = "/tmp/.X11-unix";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisplayError {
    #[error("DISPLAY is not set")]
    NotSet,
    #[error("invalid display name {0:?}")]
    Invalid(String),
}

/// A parsed display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    pub host: String,
    pub display: u32,
    pub screen: Option<u32>,
}

impl DisplayName {
    /// Parse the display named by the `DISPLAY` environment variable
    pub fn from_env() -> Result<Self, DisplayError> {
        let value = env::var("DISPLAY").map_err(|_| DisplayError::NotSet)?;
        DisplayName::parse(&value)
    }

    /// Parse a display name such as `:0`, `unix:1` or `:0.1`
    pub fn parse(name: &str) -> Result<Self, DisplayError> {
        let invalid = || DisplayError::Invalid(name.to_string());
        let (host, rest) = name.split_once(':').ok_or_else(invalid)?;

        let (display, screen) = match rest.split_once('.') {
            Some((display, screen)) => (display, Some(screen.parse().map_err(|_| invalid())?)),
            None => (rest, None),
        };
        let display = display.parse().map_err(|_| invalid())?;

        if !host.is_empty() && host != "unix" {
            log::warn!(
                "Ignoring host {:?} in display name, connecting to local display :{}",
                host,
                display
            );
        }

        Ok(DisplayName {
            host: host.to_string(),
            display,
            screen,
        })
    }

    /// Path of the UNIX socket serving this display
    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(format!("{}/X{}", X11_UNIX_SOCKET_DIR, self.display))
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.display)?;
        if let Some(screen) = self.screen {
            write!(f, ".{}", screen)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_display() {
        let name = DisplayName::parse(":0").unwrap();
        assert_eq!(name.display, 0);
        assert_eq!(name.screen, None);
        assert_eq!(name.socket_path(), PathBuf::from("/tmp/.X11-unix/X0"));
    }

    #[test]
    fn test_screen_and_host_are_ignored_for_socket() {
        let name = DisplayName::parse("unix:12.1").unwrap();
        assert_eq!(name.display, 12);
        assert_eq!(name.screen, Some(1));
        assert_eq!(name.socket_path(), PathBuf::from("/tmp/.X11-unix/X12"));
        assert_eq!(name.to_string(), "unix:12.1");

        let remote = DisplayName::parse("example.org:3").unwrap();
        assert_eq!(remote.socket_path(), PathBuf::from("/tmp/.X11-unix/X3"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(DisplayName::parse("0").is_err());
        assert!(DisplayName::parse(":").is_err());
        assert!(DisplayName::parse(":x").is_err());
        assert!(DisplayName::parse(":1.y").is_err());
    }
}
