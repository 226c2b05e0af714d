// src/keys.rs

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Represents a keyboard modifier held during a key or pointer event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2; // Also known as Option on macOS
        const SUPER = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK = 1 << 5;
    }
}

/// Represents a key symbol, already normalised by the platform driver.
///
/// Keypad navigation keys are kept distinct from the main cluster: the
/// keypad is the only source of the four diagonal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum KeySymbol {
    // Alphanumeric keys
    Char(char),

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Modifier keys (when pressed and released without other keys)
    Shift,
    Control,
    Alt,
    Super,
    CapsLock,
    NumLock,

    // Navigation keys
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,

    // Other common keys
    Enter,
    Backspace,
    Tab,
    Escape,

    // Keypad digits (NumLock on)
    Keypad0,
    Keypad1,
    Keypad2,
    Keypad3,
    Keypad4,
    Keypad5,
    Keypad6,
    Keypad7,
    Keypad8,
    Keypad9,

    // Keypad navigation (NumLock off)
    KeypadUp,
    KeypadDown,
    KeypadLeft,
    KeypadRight,
    KeypadHome,
    KeypadEnd,
    KeypadPageUp,
    KeypadPageDown,
    KeypadBegin,
    KeypadEnter,

    #[default]
    Unknown,
}

impl KeySymbol {
    /// Returns true if the key symbol represents a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            KeySymbol::Shift
                | KeySymbol::Control
                | KeySymbol::Alt
                | KeySymbol::Super
                | KeySymbol::CapsLock
                | KeySymbol::NumLock
        )
    }

    /// Returns the 1-based index of a function key, if this is one.
    pub fn function_index(&self) -> Option<usize> {
        let index = match self {
            KeySymbol::F1 => 1,
            KeySymbol::F2 => 2,
            KeySymbol::F3 => 3,
            KeySymbol::F4 => 4,
            KeySymbol::F5 => 5,
            KeySymbol::F6 => 6,
            KeySymbol::F7 => 7,
            KeySymbol::F8 => 8,
            KeySymbol::F9 => 9,
            KeySymbol::F10 => 10,
            KeySymbol::F11 => 11,
            KeySymbol::F12 => 12,
            _ => return None,
        };
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_the_default_symbol() {
        assert_eq!(KeySymbol::default(), KeySymbol::Unknown);
    }

    #[test]
    fn only_modifier_keys_report_as_modifiers() {
        assert!(KeySymbol::Shift.is_modifier());
        assert!(KeySymbol::NumLock.is_modifier());
        assert!(!KeySymbol::KeypadUp.is_modifier());
        assert!(!KeySymbol::Char('a').is_modifier());
    }

    #[test]
    fn function_keys_report_their_index() {
        assert_eq!(KeySymbol::F1.function_index(), Some(1));
        assert_eq!(KeySymbol::F12.function_index(), Some(12));
        assert_eq!(KeySymbol::Keypad1.function_index(), None);
    }
}
