//! Blocked key combinations

use crate::event::KeyPress;

/// One deny-list entry. Letter keys match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyCombo {
    const fn plain(key: &'static str) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    const fn ctrl(key: &'static str) -> Self {
        Self {
            key,
            ctrl: true,
            shift: false,
        }
    }

    const fn ctrl_shift(key: &'static str) -> Self {
        Self {
            key,
            ctrl: true,
            shift: true,
        }
    }

    fn matches(&self, press: &KeyPress) -> bool {
        if self.ctrl && !press.ctrl {
            return false;
        }
        if self.shift && !press.shift {
            return false;
        }
        press.key.eq_ignore_ascii_case(self.key)
    }
}

/// Devtools, view-source, clipboard, select-all, find, print and save
const DEFAULT_DENY_LIST: [KeyCombo; 15] = [
    KeyCombo::plain("F12"),
    KeyCombo::plain("F11"),
    KeyCombo::plain("PrintScreen"),
    KeyCombo::plain("Meta"),
    KeyCombo::ctrl("c"),
    KeyCombo::ctrl("v"),
    KeyCombo::ctrl("x"),
    KeyCombo::ctrl("a"),
    KeyCombo::ctrl("f"),
    KeyCombo::ctrl("p"),
    KeyCombo::ctrl("s"),
    KeyCombo::ctrl("u"),
    KeyCombo::ctrl_shift("I"),
    KeyCombo::ctrl_shift("J"),
    KeyCombo::ctrl_shift("C"),
];

#[derive(Debug, Clone)]
pub struct BlockedKeys {
    combos: Vec<KeyCombo>,
}

impl Default for BlockedKeys {
    fn default() -> Self {
        Self {
            combos: DEFAULT_DENY_LIST.to_vec(),
        }
    }
}

impl BlockedKeys {
    /// Any meta-modified press is blocked outright
    pub fn is_blocked(&self, press: &KeyPress) -> bool {
        press.meta || self.combos.iter().any(|combo| combo.matches(press))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devtools_and_clipboard_blocked() {
        let keys = BlockedKeys::default();
        assert!(keys.is_blocked(&KeyPress::plain("F12")));
        assert!(keys.is_blocked(&KeyPress::ctrl("c")));
        assert!(keys.is_blocked(&KeyPress::ctrl("V")));
        assert!(keys.is_blocked(&KeyPress::ctrl_shift("I")));
        assert!(keys.is_blocked(&KeyPress {
            key: "Tab".into(),
            meta: true,
            ..Default::default()
        }));
    }

    #[test]
    fn test_ordinary_typing_allowed() {
        let keys = BlockedKeys::default();
        assert!(!keys.is_blocked(&KeyPress::plain("c")));
        assert!(!keys.is_blocked(&KeyPress::plain("Enter")));
        assert!(!keys.is_blocked(&KeyPress::ctrl("z")));
    }
}
