//! Inbound environment notifications

use serde::{Deserialize, Serialize};
use std::fmt;

/// A key press as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Default::default()
        }
    }

    pub fn ctrl(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Default::default()
        }
    }

    pub fn ctrl_shift(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            shift: true,
            ..Default::default()
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.meta && self.key != "Meta" {
            f.write_str("Meta+")?;
        }
        f.write_str(&self.key)
    }
}

/// Everything the host environment can tell the monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvironmentEvent {
    /// Page visibility changed; `hidden` means another tab is in front
    VisibilityChanged { hidden: bool },
    WindowBlur,
    WindowFocus,
    FullscreenChanged { fullscreen: bool },
    Resized {
        outer_width: u32,
        screen_width: u32,
        #[serde(default)]
        hidden: bool,
    },
    MouseLeave,
    MouseEnter,
    KeyDown(KeyPress),
    ContextMenu,
}

impl EnvironmentEvent {
    /// Events that only exist on desktop hosts
    pub fn is_desktop_only(&self) -> bool {
        matches!(
            self,
            EnvironmentEvent::FullscreenChanged { .. }
                | EnvironmentEvent::Resized { .. }
                | EnvironmentEvent::MouseLeave
                | EnvironmentEvent::MouseEnter
                | EnvironmentEvent::KeyDown(_)
                | EnvironmentEvent::ContextMenu
        )
    }
}
