// src/platform/backends/x11/event.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! Decoding of raw X events into [`PlatformEvent`]s, and the blocking wait
//! on the X connection.

use super::window::Window;
use crate::keys::{KeySymbol, Modifiers};
use crate::platform::{ButtonEvent, MenuAction, PixelRect, PlatformEvent};

use anyhow::{anyhow, Result};
use log::{debug, info, trace, warn};
use std::os::unix::io::RawFd;
use std::ptr;
use std::time::Duration;

use libc::{c_char, c_int, c_uint};
use x11::{keysym, xlib};

const KEY_TEXT_BUFFER_SIZE: usize = 32;

/// Turns one X event into a platform event, if it means anything to us.
pub fn translate(window: &mut Window, xevent: &mut xlib::XEvent) -> Option<PlatformEvent> {
    let event_type = xevent.get_type();
    match event_type {
        xlib::Expose => {
            let expose = unsafe { xevent.expose };
            // Only the last of a batch triggers a repaint; the whole buffer is copied anyway.
            if expose.count != 0 {
                return None;
            }
            trace!(
                "XEvent: Expose (x:{}, y:{}, w:{}, h:{})",
                expose.x, expose.y, expose.width, expose.height
            );
            Some(PlatformEvent::Expose {
                area: PixelRect::new(expose.x, expose.y, expose.width, expose.height),
            })
        }
        xlib::ConfigureNotify => {
            let configure = unsafe { xevent.configure };
            if window.update_dimensions(configure.width, configure.height) {
                debug!("XEvent: ConfigureNotify {}x{}", configure.width, configure.height);
                Some(PlatformEvent::Configure {
                    width: configure.width,
                    height: configure.height,
                })
            } else {
                trace!("XEvent: ConfigureNotify with unchanged size");
                None
            }
        }
        xlib::MapNotify => {
            debug!("XEvent: MapNotify");
            Some(PlatformEvent::Map)
        }
        xlib::KeyPress => {
            let key_event = unsafe { &mut xevent.key };
            let mut x_keysym: xlib::KeySym = 0;
            let mut key_text_buffer = [0u8; KEY_TEXT_BUFFER_SIZE];
            let count = unsafe {
                xlib::XLookupString(
                    key_event,
                    key_text_buffer.as_mut_ptr() as *mut c_char,
                    key_text_buffer.len() as c_int,
                    &mut x_keysym,
                    ptr::null_mut(),
                )
            };
            let text = if count > 0 {
                // XLookupString produces Latin-1.
                key_text_buffer[..count as usize]
                    .iter()
                    .map(|&b| char::from(b))
                    .collect()
            } else {
                String::new()
            };
            let modifiers = modifiers_from_state(key_event.state);
            let symbol = xkeysym_to_keysymbol(x_keysym, &text);
            debug!(
                "XEvent: KeyPress (symbol: {:?}, keysym: {:X}, modifiers: {:?}, text: {:?})",
                symbol, x_keysym, modifiers, text
            );
            // Function keys are the accelerators of the preset menu.
            if let Some(index) = symbol.function_index() {
                return Some(PlatformEvent::Menu(MenuAction::Preset(index - 1)));
            }
            Some(PlatformEvent::Key {
                symbol,
                modifiers,
                text,
            })
        }
        xlib::ButtonPress | xlib::ButtonRelease => {
            let button_event = unsafe { xevent.button };
            let modifiers = modifiers_from_state(button_event.state);
            let button = u8::try_from(button_event.button).unwrap_or(u8::MAX);
            debug!(
                "XEvent: Button{} {} at ({}, {}) {:?}",
                if event_type == xlib::ButtonPress { "Press" } else { "Release" },
                button,
                button_event.x,
                button_event.y,
                modifiers
            );
            let event = if event_type == xlib::ButtonPress {
                ButtonEvent::press(button, button_event.x, button_event.y, modifiers)
            } else {
                ButtonEvent::release(button, button_event.x, button_event.y, modifiers)
            };
            Some(PlatformEvent::Button(event))
        }
        xlib::MotionNotify => {
            let motion = unsafe { xevent.motion };
            trace!("XEvent: MotionNotify ({}, {})", motion.x, motion.y);
            Some(PlatformEvent::PointerMotion {
                x: motion.x,
                y: motion.y,
                modifiers: modifiers_from_state(motion.state),
            })
        }
        xlib::ClientMessage => {
            let client_message = unsafe { xevent.client_message };
            if client_message.message_type == window.protocols_atom()
                && client_message.data.as_longs()[0] as xlib::Atom == window.wm_delete_window_atom()
            {
                info!("XEvent: WM_DELETE_WINDOW received from window manager.");
                Some(PlatformEvent::CloseRequested)
            } else {
                trace!("XEvent: ignored ClientMessage type {}", client_message.message_type);
                None
            }
        }
        other => {
            trace!("XEvent: ignored event type {}", other);
            None
        }
    }
}

/// Reads the modifier bits of an X event state field.
pub fn modifiers_from_state(state: c_uint) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if state & xlib::ShiftMask != 0 {
        modifiers.insert(Modifiers::SHIFT);
    }
    if state & xlib::ControlMask != 0 {
        modifiers.insert(Modifiers::CONTROL);
    }
    if state & xlib::Mod1Mask != 0 {
        modifiers.insert(Modifiers::ALT);
    }
    if state & xlib::Mod4Mask != 0 {
        modifiers.insert(Modifiers::SUPER);
    }
    if state & xlib::LockMask != 0 {
        modifiers.insert(Modifiers::CAPS_LOCK);
    }
    if state & xlib::Mod2Mask != 0 {
        modifiers.insert(Modifiers::NUM_LOCK);
    }
    modifiers
}

/// Maps an X keysym to a [`KeySymbol`].
///
/// Keypad keysyms keep their own symbols. Anything not listed falls back to
/// the single character the keyboard produced, if any.
pub fn xkeysym_to_keysymbol(keysym_val: xlib::KeySym, text: &str) -> KeySymbol {
    let Ok(keysym_u32) = u32::try_from(keysym_val) else {
        warn!("Received out-of-range keysym 0x{:X}", keysym_val);
        return char_or_unknown(text);
    };

    match keysym_u32 {
        keysym::XK_Shift_L | keysym::XK_Shift_R => KeySymbol::Shift,
        keysym::XK_Control_L | keysym::XK_Control_R => KeySymbol::Control,
        keysym::XK_Alt_L | keysym::XK_Alt_R | keysym::XK_Meta_L | keysym::XK_Meta_R => {
            KeySymbol::Alt
        }
        keysym::XK_Super_L | keysym::XK_Super_R | keysym::XK_Hyper_L | keysym::XK_Hyper_R => {
            KeySymbol::Super
        }
        keysym::XK_Caps_Lock => KeySymbol::CapsLock,
        keysym::XK_Num_Lock => KeySymbol::NumLock,

        keysym::XK_Return => KeySymbol::Enter,
        keysym::XK_BackSpace => KeySymbol::Backspace,
        keysym::XK_Tab | keysym::XK_ISO_Left_Tab => KeySymbol::Tab,
        keysym::XK_Escape => KeySymbol::Escape,

        keysym::XK_Home => KeySymbol::Home,
        keysym::XK_Left => KeySymbol::Left,
        keysym::XK_Up => KeySymbol::Up,
        keysym::XK_Right => KeySymbol::Right,
        keysym::XK_Down => KeySymbol::Down,
        keysym::XK_Page_Up => KeySymbol::PageUp,
        keysym::XK_Page_Down => KeySymbol::PageDown,
        keysym::XK_End => KeySymbol::End,
        keysym::XK_Insert => KeySymbol::Insert,
        keysym::XK_Delete => KeySymbol::Delete,

        keysym::XK_F1 => KeySymbol::F1,
        keysym::XK_F2 => KeySymbol::F2,
        keysym::XK_F3 => KeySymbol::F3,
        keysym::XK_F4 => KeySymbol::F4,
        keysym::XK_F5 => KeySymbol::F5,
        keysym::XK_F6 => KeySymbol::F6,
        keysym::XK_F7 => KeySymbol::F7,
        keysym::XK_F8 => KeySymbol::F8,
        keysym::XK_F9 => KeySymbol::F9,
        keysym::XK_F10 => KeySymbol::F10,
        keysym::XK_F11 => KeySymbol::F11,
        keysym::XK_F12 => KeySymbol::F12,

        // Keypad, NumLock on
        keysym::XK_KP_0 => KeySymbol::Keypad0,
        keysym::XK_KP_1 => KeySymbol::Keypad1,
        keysym::XK_KP_2 => KeySymbol::Keypad2,
        keysym::XK_KP_3 => KeySymbol::Keypad3,
        keysym::XK_KP_4 => KeySymbol::Keypad4,
        keysym::XK_KP_5 => KeySymbol::Keypad5,
        keysym::XK_KP_6 => KeySymbol::Keypad6,
        keysym::XK_KP_7 => KeySymbol::Keypad7,
        keysym::XK_KP_8 => KeySymbol::Keypad8,
        keysym::XK_KP_9 => KeySymbol::Keypad9,

        // Keypad, NumLock off
        keysym::XK_KP_Up => KeySymbol::KeypadUp,
        keysym::XK_KP_Down => KeySymbol::KeypadDown,
        keysym::XK_KP_Left => KeySymbol::KeypadLeft,
        keysym::XK_KP_Right => KeySymbol::KeypadRight,
        keysym::XK_KP_Home => KeySymbol::KeypadHome,
        keysym::XK_KP_End => KeySymbol::KeypadEnd,
        keysym::XK_KP_Page_Up => KeySymbol::KeypadPageUp,
        keysym::XK_KP_Page_Down => KeySymbol::KeypadPageDown,
        keysym::XK_KP_Begin => KeySymbol::KeypadBegin,
        keysym::XK_KP_Enter => KeySymbol::KeypadEnter,

        _ => char_or_unknown(text),
    }
}

fn char_or_unknown(text: &str) -> KeySymbol {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => KeySymbol::Char(c),
        _ => {
            trace!("No key symbol for text {:?}", text);
            KeySymbol::Unknown
        }
    }
}

/// Blocks until `fd` is readable or `timeout` elapses. `None` waits forever.
/// Returns true when the descriptor is readable.
pub fn wait_readable(fd: RawFd, timeout: Option<Duration>) -> Result<bool> {
    let timeout_ms: c_int = match timeout {
        // Round up so a sub-millisecond deadline doesn't spin.
        Some(d) => c_int::try_from(d.as_micros().div_ceil(1000)).unwrap_or(c_int::MAX),
        None => -1,
    };
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if ready >= 0 {
            return Ok(ready > 0);
        }
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::Interrupted {
            continue;
        }
        return Err(anyhow!("poll on X connection failed: {}", err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ks(sym: u32) -> xlib::KeySym {
        xlib::KeySym::from(sym)
    }

    #[test]
    fn it_should_map_special_keys() {
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_Return), ""), KeySymbol::Enter);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_Escape), "\x1b"), KeySymbol::Escape);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_Left), ""), KeySymbol::Left);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_F3), ""), KeySymbol::F3);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_Shift_L), ""), KeySymbol::Shift);
    }

    #[test]
    fn it_should_keep_keypad_keys_distinct() {
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_KP_Up), ""), KeySymbol::KeypadUp);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_KP_Home), ""), KeySymbol::KeypadHome);
        assert_eq!(
            xkeysym_to_keysymbol(ks(keysym::XK_KP_Page_Down), ""),
            KeySymbol::KeypadPageDown
        );
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_KP_8), "8"), KeySymbol::Keypad8);
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_Up), ""), KeySymbol::Up);
    }

    #[test]
    fn it_should_fall_back_to_the_typed_character() {
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_a), "a"), KeySymbol::Char('a'));
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_eacute), "é"), KeySymbol::Char('é'));
        // Ctrl+R
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_r), "\x12"), KeySymbol::Char('\x12'));
        assert_eq!(xkeysym_to_keysymbol(ks(keysym::XK_a), ""), KeySymbol::Unknown);
    }

    #[test]
    fn it_should_decode_modifier_state() {
        let state = xlib::ShiftMask | xlib::ControlMask;
        assert_eq!(modifiers_from_state(state), Modifiers::SHIFT | Modifiers::CONTROL);
        assert_eq!(modifiers_from_state(0), Modifiers::empty());
    }
}
