// src/midend.rs

//! The contract of the puzzle engine ("midend") driven by the front end, and
//! the abstract command alphabet it consumes.

use crate::render::DrawingApi;

/// An abstract input command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// A literal character code, passed through from the keyboard or menu.
    Char(u8),
    LeftButton,
    MiddleButton,
    RightButton,
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    CursorUpLeft,
    CursorDownLeft,
    CursorUpRight,
    CursorDownRight,
}

impl Command {
    pub const LEFT_BUTTON: u32 = 0x200;
    pub const MIDDLE_BUTTON: u32 = 0x201;
    pub const RIGHT_BUTTON: u32 = 0x202;
    pub const CURSOR_UP: u32 = 0x203;
    pub const CURSOR_DOWN: u32 = 0x204;
    pub const CURSOR_LEFT: u32 = 0x205;
    pub const CURSOR_RIGHT: u32 = 0x206;
    pub const CURSOR_UP_LEFT: u32 = 0x207;
    pub const CURSOR_DOWN_LEFT: u32 = 0x208;
    pub const CURSOR_UP_RIGHT: u32 = 0x209;
    pub const CURSOR_DOWN_RIGHT: u32 = 0x20A;

    /// The engine's integer code for this command.
    pub fn code(self) -> u32 {
        match self {
            Command::Char(c) => u32::from(c),
            Command::LeftButton => Self::LEFT_BUTTON,
            Command::MiddleButton => Self::MIDDLE_BUTTON,
            Command::RightButton => Self::RIGHT_BUTTON,
            Command::CursorUp => Self::CURSOR_UP,
            Command::CursorDown => Self::CURSOR_DOWN,
            Command::CursorLeft => Self::CURSOR_LEFT,
            Command::CursorRight => Self::CURSOR_RIGHT,
            Command::CursorUpLeft => Self::CURSOR_UP_LEFT,
            Command::CursorDownLeft => Self::CURSOR_DOWN_LEFT,
            Command::CursorUpRight => Self::CURSOR_UP_RIGHT,
            Command::CursorDownRight => Self::CURSOR_DOWN_RIGHT,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let command = match code {
            0..=0xFF => Command::Char(code as u8),
            Self::LEFT_BUTTON => Command::LeftButton,
            Self::MIDDLE_BUTTON => Command::MiddleButton,
            Self::RIGHT_BUTTON => Command::RightButton,
            Self::CURSOR_UP => Command::CursorUp,
            Self::CURSOR_DOWN => Command::CursorDown,
            Self::CURSOR_LEFT => Command::CursorLeft,
            Self::CURSOR_RIGHT => Command::CursorRight,
            Self::CURSOR_UP_LEFT => Command::CursorUpLeft,
            Self::CURSOR_DOWN_LEFT => Command::CursorDownLeft,
            Self::CURSOR_UP_RIGHT => Command::CursorUpRight,
            Self::CURSOR_DOWN_RIGHT => Command::CursorDownRight,
            _ => return None,
        };
        Some(command)
    }

    pub fn is_button(self) -> bool {
        matches!(
            self,
            Command::LeftButton | Command::MiddleButton | Command::RightButton
        )
    }

    pub fn is_cursor(self) -> bool {
        (Self::CURSOR_UP..=Self::CURSOR_DOWN_RIGHT).contains(&self.code())
    }
}

/// A game engine the front end can host.
///
/// Methods that may draw receive the front end's drawing surface. The
/// engine calls back into it (`start_draw`, primitives, `end_draw`,
/// `activate_timer`, …) before returning.
pub trait Midend {
    /// A complete parameter set (board size, difficulty, …).
    type Params: Clone;

    /// Starts a new game, or resumes one from its serialised description.
    fn new_game(&mut self, saved: Option<&str>);

    /// Pixel size of the playing area for the current parameters.
    fn size(&self) -> (i32, i32);

    fn num_presets(&self) -> usize;

    /// Name and parameters of preset `index`.
    fn fetch_preset(&self, index: usize) -> Option<(String, Self::Params)>;

    /// Palette as a flat `[r, g, b, …]` array of normalised floats.
    fn colours(&mut self, fe: &dyn DrawingApi) -> Vec<f32>;

    fn wants_statusbar(&self) -> bool;

    /// Feeds one command at canvas position `(x, y)`. Returns `false` when
    /// the session has ended and the window should close.
    fn process_key(&mut self, fe: &mut dyn DrawingApi, x: i32, y: i32, command: Command) -> bool;

    /// Advances animation by `elapsed` seconds.
    fn timer(&mut self, fe: &mut dyn DrawingApi, elapsed: f32);

    /// Redraws the whole playing area.
    fn redraw(&mut self, fe: &mut dyn DrawingApi);

    fn params(&self) -> Self::Params;

    fn set_params(&mut self, params: &Self::Params);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_codes_match_the_engine_alphabet() {
        assert_eq!(Command::LeftButton.code(), 0x200);
        assert_eq!(Command::MiddleButton.code(), 0x201);
        assert_eq!(Command::RightButton.code(), 0x202);
        assert_eq!(Command::CursorUp.code(), 0x203);
        assert_eq!(Command::CursorDownRight.code(), 0x20A);
        assert_eq!(Command::Char(b'q').code(), 0x71);
    }

    #[test]
    fn from_code_inverts_code() {
        for code in (0..=0xFF).chain(0x200..=0x20A) {
            let command = Command::from_code(code).unwrap();
            assert_eq!(command.code(), code);
        }
        assert_eq!(Command::from_code(0x100), None);
        assert_eq!(Command::from_code(0x20B), None);
    }

    #[test]
    fn classification() {
        assert!(Command::RightButton.is_button());
        assert!(!Command::CursorLeft.is_button());
        assert!(Command::CursorUpLeft.is_cursor());
        assert!(!Command::Char(b'8').is_cursor());
    }
}
