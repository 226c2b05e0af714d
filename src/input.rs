// src/input.rs

//! Translation of normalised platform input into engine commands.
//!
//! Both translators are stateless: each event maps on its own, and anything
//! unrecognised maps to `None` so no engine call is made.

use log::trace;

use crate::config::InputConfig;
use crate::keys::KeySymbol;
use crate::midend::Command;
use crate::platform::{ButtonAction, ButtonEvent};

/// Maps a key press to a command.
///
/// Text of exactly one character in the Latin-1 range passes through as a
/// literal code, control characters included. Otherwise only navigation
/// keys are recognised.
pub fn translate_key(symbol: KeySymbol, text: &str) -> Option<Command> {
    let mut chars = text.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Ok(byte) = u8::try_from(u32::from(ch)) {
            return Some(Command::Char(byte));
        }
    }

    let command = match symbol {
        KeySymbol::Up | KeySymbol::KeypadUp | KeySymbol::Keypad8 => Command::CursorUp,
        KeySymbol::Down | KeySymbol::KeypadDown | KeySymbol::Keypad2 => Command::CursorDown,
        KeySymbol::Left | KeySymbol::KeypadLeft | KeySymbol::Keypad4 => Command::CursorLeft,
        KeySymbol::Right | KeySymbol::KeypadRight | KeySymbol::Keypad6 => Command::CursorRight,
        KeySymbol::KeypadHome | KeySymbol::Keypad7 => Command::CursorUpLeft,
        KeySymbol::KeypadEnd | KeySymbol::Keypad1 => Command::CursorDownLeft,
        KeySymbol::KeypadPageUp | KeySymbol::Keypad9 => Command::CursorUpRight,
        KeySymbol::KeypadPageDown | KeySymbol::Keypad3 => Command::CursorDownRight,
        _ => {
            trace!("No command for key {:?} (text {:?})", symbol, text);
            return None;
        }
    };
    Some(command)
}

/// Maps a pointer button press to a command and its canvas position.
///
/// Releases and buttons other than 1..=3 yield nothing. Button 2, or button
/// 1 or 3 with the configured modifier held, is the middle button.
pub fn translate_button(event: &ButtonEvent, config: &InputConfig) -> Option<(Command, i32, i32)> {
    if event.action != ButtonAction::Press {
        return None;
    }
    if !(1..=3).contains(&event.button) {
        trace!("Ignoring press of button {}", event.button);
        return None;
    }
    let modifier = config.middle_button_modifier;
    let shifted = !modifier.is_empty() && event.modifiers.contains(modifier);

    let command = if event.button == 2 || shifted {
        Command::MiddleButton
    } else if event.button == 1 {
        Command::LeftButton
    } else {
        Command::RightButton
    };
    Some((command, event.x, event.y))
}
