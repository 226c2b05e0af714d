// src/render/mod.rs

//! The drawing surface offered to the engine.
//!
//! Everything here targets the off-screen buffer inside a render session
//! (`start_draw` … `end_draw`); the session blits the accumulated damage when
//! it closes.

pub mod damage;
pub mod session;

pub use damage::DamageRect;
pub use session::RenderSession;

use crate::fonts::FontFamily;

/// Horizontal text alignment relative to the given `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Centre,
    Right,
}

/// Vertical text alignment relative to the given `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    /// `y` is the baseline.
    #[default]
    Baseline,
    /// `y` is the visual centre of the ascent/descent box.
    Centre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Align {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl Align {
    pub const VCENTRE_FLAG: u32 = 0x100;
    pub const HCENTRE_FLAG: u32 = 0x001;
    pub const HRIGHT_FLAG: u32 = 0x002;

    pub const fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub const fn centred() -> Self {
        Self::new(HAlign::Centre, VAlign::Centre)
    }

    /// Decodes the engine's packed alignment bits. Horizontal centre wins
    /// over right.
    pub fn from_flags(flags: u32) -> Self {
        let horizontal = if flags & Self::HCENTRE_FLAG != 0 {
            HAlign::Centre
        } else if flags & Self::HRIGHT_FLAG != 0 {
            HAlign::Right
        } else {
            HAlign::Left
        };
        let vertical = if flags & Self::VCENTRE_FLAG != 0 {
            VAlign::Centre
        } else {
            VAlign::Baseline
        };
        Self::new(horizontal, vertical)
    }

    /// Moves a baseline origin so the text lands where this alignment says.
    pub fn apply(&self, x: i32, y: i32, width: i32, ascent: i32, descent: i32) -> (i32, i32) {
        let y = match self.vertical {
            VAlign::Baseline => y,
            VAlign::Centre => y
                .saturating_add(ascent)
                .saturating_sub(ascent.saturating_add(descent) / 2),
        };
        let x = match self.horizontal {
            HAlign::Left => x,
            HAlign::Centre => x.saturating_sub(width / 2),
            HAlign::Right => x.saturating_sub(width),
        };
        (x, y)
    }
}

/// Drawing primitives and services the engine may call.
///
/// Colours are palette indices. Primitives are only meaningful between
/// `start_draw` and `end_draw`; outside a session they are ignored.
pub trait DrawingApi {
    fn start_draw(&mut self);

    fn end_draw(&mut self);

    /// Filled rectangle.
    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: usize);

    /// One-pixel rectangle outline covering the same pixels as
    /// `draw_rect(x, y, w, h)`.
    fn draw_rect_outline(&mut self, x: i32, y: i32, w: i32, h: i32, colour: usize) {
        let right = x.saturating_add(w).saturating_sub(1);
        let bottom = y.saturating_add(h).saturating_sub(1);
        let coords = [x, y, right, y, right, bottom, x, bottom];
        self.draw_polygon(&coords, false, colour);
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: usize);

    /// Closed polygon from a flat `[x0, y0, x1, y1, …]` list.
    fn draw_polygon(&mut self, coords: &[i32], filled: bool, colour: usize);

    /// Text with its anchor at `(x, y)` as described by `align`.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        family: FontFamily,
        size: i32,
        align: Align,
        colour: usize,
        text: &str,
    );

    fn clip(&mut self, x: i32, y: i32, w: i32, h: i32);

    fn unclip(&mut self);

    /// Marks `(x, y, w, h)` as changed in the current session.
    fn draw_update(&mut self, x: i32, y: i32, w: i32, h: i32);

    /// The window's own background, normalised to `[0, 1]`.
    fn default_colour(&self) -> [f32; 3];

    fn status_bar(&mut self, text: &str);

    fn activate_timer(&mut self);

    fn deactivate_timer(&mut self);
}
