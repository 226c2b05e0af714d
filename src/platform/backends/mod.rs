// src/platform/backends/mod.rs

//! Defines the `Driver` trait implemented by platform backends, and the
//! small geometric and resource types shared between drivers and the
//! front end.

use crate::color::Rgb16;
use crate::frontend::menu::MenuItem;
use crate::platform::PlatformEvent;
use anyhow::Result;
use std::time::Duration;

pub mod headless;
#[cfg(feature = "x11")]
pub mod x11;

/// A display pixel value as granted by the driver's colour allocation.
/// Its encoding is private to the driver.
pub type Pixel = u32;

/// Handle of a repeating timeout registered with a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A point on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangle on the canvas, in pixels. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// The overlapping part of two rectangles, if any.
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(PixelRect::new(
                left,
                top,
                right.saturating_sub(left),
                bottom.saturating_sub(top),
            ))
        } else {
            None
        }
    }
}

/// String metrics reported by a driver for a loaded font.
///
/// Bearings are relative to the drawing origin; `ascent` extends up from the
/// baseline and `descent` down from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtents {
    pub lbearing: i32,
    pub rbearing: i32,
    pub width: i32,
    pub ascent: i32,
    pub descent: i32,
}

/// Everything a driver needs to put the top-level window on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub title: String,
    /// Size of the drawing area in pixels.
    pub width: i32,
    pub height: i32,
    /// Whether the engine wants a status line under the drawing area.
    pub statusbar: bool,
    /// The game menu, in display order.
    pub menu: Vec<MenuItem>,
}

/// Capability interface a windowing platform implements for the front end.
///
/// A `Driver` owns the top-level window, the visible drawing surface and the
/// off-screen buffer that mirrors it. Every drawing call targets the
/// off-screen buffer; only [`Driver::blit`] touches the visible surface.
///
/// All methods are called from the single event-loop thread.
pub trait Driver {
    /// Platform font handle returned by [`Driver::load_font`].
    type Font;

    // --- Window ---

    /// Creates and shows the top-level window. The driver is expected to
    /// follow up with a `Configure` event for the drawing area.
    fn create_window(&mut self, spec: &WindowSpec) -> Result<()>;

    /// Tears the window down. After this `next_event` reports no more events.
    fn destroy_window(&mut self);

    /// Requests a new drawing-area size. A `Configure` event follows.
    fn resize_canvas(&mut self, width: i32, height: i32) -> Result<()>;

    /// Replaces the status-line text.
    fn set_status_text(&mut self, text: &str);

    /// Asks the platform to repaint the whole window (delivers an `Expose`).
    fn queue_repaint(&mut self);

    // --- Colours ---

    /// Allocates a batch of colours. The result has one entry per request;
    /// `None` means the display could not grant that colour.
    fn alloc_colours(&mut self, colours: &[Rgb16]) -> Vec<Option<Pixel>>;

    /// Reads back the window's current background colour.
    fn default_background(&self) -> Rgb16;

    // --- Off-screen buffer and drawing context ---

    /// Releases any existing off-screen buffer and allocates a new one,
    /// cleared to `fill`.
    fn create_buffer(&mut self, width: i32, height: i32, fill: Pixel) -> Result<()>;

    /// True once `create_buffer` has succeeded.
    fn has_buffer(&self) -> bool;

    /// Acquires a drawing context on the off-screen buffer. Starts unclipped.
    fn begin_context(&mut self) -> Result<()>;

    /// Releases the drawing context, dropping any clip.
    fn end_context(&mut self);

    /// Restricts drawing through the current context to `rect`.
    fn set_clip(&mut self, rect: PixelRect);

    fn fill_rect(&mut self, rect: PixelRect, pixel: Pixel);

    fn draw_line(&mut self, from: Point, to: Point, pixel: Pixel);

    /// Draws a closed polygon, filled or as an outline.
    fn draw_polygon(&mut self, points: &[Point], filled: bool, pixel: Pixel);

    // --- Text ---

    fn load_font(&mut self, face: &str, size: i32) -> Result<Self::Font>;

    fn text_extents(&mut self, font: &Self::Font, text: &str) -> TextExtents;

    /// Draws `text` with its baseline origin at `origin`.
    fn draw_text(&mut self, font: &Self::Font, origin: Point, text: &str, pixel: Pixel);

    // --- Presentation ---

    /// Copies `rect` of the off-screen buffer to the same place on the
    /// visible surface.
    fn blit(&mut self, rect: PixelRect);

    // --- Timers and events ---

    /// Registers a repeating timeout; it fires as `PlatformEvent::Timer`.
    fn add_timeout(&mut self, period: Duration) -> Result<TimerId>;

    /// Cancels a timeout. Unknown handles are ignored.
    fn remove_timeout(&mut self, id: TimerId);

    /// Blocks until the next event. `Ok(None)` means the event source is
    /// exhausted (window destroyed, or nothing left to wait for).
    fn next_event(&mut self) -> Result<Option<PlatformEvent>>;
}
