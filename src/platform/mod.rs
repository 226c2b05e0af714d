// src/platform/mod.rs
//
// Platform-facing types: the events a driver delivers to the front end and
// the driver implementations themselves.

use crate::keys::{KeySymbol, Modifiers};
use crate::midend::Command;

pub mod backends;

pub use backends::{Driver, PixelRect, Point, TimerId};

/// Kind of pointer button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Press,
    Release,
}

/// A pointer button event with physical button numbering
/// (1 = primary, 2 = secondary/middle, 3 = tertiary/right, others as reported).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub action: ButtonAction,
    pub button: u8,
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
}

impl ButtonEvent {
    pub fn press(button: u8, x: i32, y: i32, modifiers: Modifiers) -> Self {
        Self {
            action: ButtonAction::Press,
            button,
            x,
            y,
            modifiers,
        }
    }

    pub fn release(button: u8, x: i32, y: i32, modifiers: Modifiers) -> Self {
        Self {
            action: ButtonAction::Release,
            button,
            x,
            y,
            modifiers,
        }
    }
}

/// What a game-menu entry does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Send a command to the engine as if it had been typed.
    Key(Command),
    /// Switch to the engine's preset parameter set with this index.
    Preset(usize),
}

/// Events delivered by a platform driver, already normalised.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A key was pressed. `text` is what the keyboard layout produced, if anything.
    Key {
        symbol: KeySymbol,
        modifiers: Modifiers,
        text: String,
    },
    /// A pointer button went down or up.
    Button(ButtonEvent),
    /// The pointer moved.
    PointerMotion { x: i32, y: i32, modifiers: Modifiers },
    /// Part of the visible surface was lost and must be repainted.
    Expose { area: PixelRect },
    /// The drawing area was (re)sized or realised.
    Configure { width: i32, height: i32 },
    /// The window became visible.
    Map,
    /// A game-menu entry was activated.
    Menu(MenuAction),
    /// A repeating timeout registered with `Driver::add_timeout` fired.
    Timer(TimerId),
    /// The user asked the window manager to close the window.
    CloseRequested,
}
