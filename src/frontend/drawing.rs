// src/frontend/drawing.rs

//! The engine-facing drawing surface of a window.
//!
//! Primitives resolve their palette index, widen the session damage by their
//! unclipped bounds and draw into the off-screen buffer. Calls made outside
//! a render session, or naming a colour the palette does not have, are
//! logged and dropped.

use log::{trace, warn};

use super::FrontendState;
use crate::fonts::FontFamily;
use crate::platform::backends::{Driver, Pixel, PixelRect, Point};
use crate::render::damage::{line_bounds, polygon_bounds, text_bounds};
use crate::render::{Align, DrawingApi};

impl<D: Driver> FrontendState<D> {
    /// Pixel for `colour` if drawing is allowed right now.
    fn drawable(&self, what: &str, colour: usize) -> Option<Pixel> {
        if !self.session.is_open() {
            warn!("{} outside a render session; ignored", what);
            return None;
        }
        let pixel = self.colours.pixel(colour);
        if pixel.is_none() {
            warn!(
                "{} with colour {} but the palette has {} entries; ignored",
                what,
                colour,
                self.colours.len()
            );
        }
        pixel
    }
}

impl<D: Driver> DrawingApi for FrontendState<D> {
    fn start_draw(&mut self) {
        if self.session.is_open() {
            warn!("start_draw inside an open render session; ignored");
            return;
        }
        if !self.driver.has_buffer() {
            warn!("start_draw before the off-screen buffer exists; ignored");
            return;
        }
        if let Err(e) = self.session.begin(&mut self.driver, self.width, self.height) {
            self.fail(e.context("opening drawing context").into());
        }
    }

    fn end_draw(&mut self) {
        if !self.session.is_open() {
            warn!("end_draw without start_draw; ignored");
            return;
        }
        self.session.end(&mut self.driver);
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, colour: usize) {
        let Some(pixel) = self.drawable("draw_rect", colour) else {
            return;
        };
        trace!("draw_rect ({}, {}) {}x{} colour {}", x, y, w, h, colour);
        let rect = PixelRect::new(x, y, w, h);
        self.session.mark(rect);
        self.driver.fill_rect(rect, pixel);
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: usize) {
        let Some(pixel) = self.drawable("draw_line", colour) else {
            return;
        };
        let (from, to) = (Point::new(x1, y1), Point::new(x2, y2));
        self.session.mark(line_bounds(from, to));
        self.driver.draw_line(from, to, pixel);
    }

    fn draw_polygon(&mut self, coords: &[i32], filled: bool, colour: usize) {
        let Some(pixel) = self.drawable("draw_polygon", colour) else {
            return;
        };
        if coords.len() % 2 != 0 {
            warn!("draw_polygon with odd coordinate count {}; last value dropped", coords.len());
        }
        let points: Vec<Point> = coords
            .chunks_exact(2)
            .map(|c| Point::new(c[0], c[1]))
            .collect();
        let Some(bounds) = polygon_bounds(&points) else {
            return;
        };
        self.session.mark(bounds);
        self.driver.draw_polygon(&points, filled, pixel);
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        family: FontFamily,
        size: i32,
        align: Align,
        colour: usize,
        text: &str,
    ) {
        let Some(pixel) = self.drawable("draw_text", colour) else {
            return;
        };
        let driver = &mut self.driver;
        let id = match self
            .fonts
            .resolve(family, size, |face, size| driver.load_font(face, size))
        {
            Ok(id) => id,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        let Some(font) = self.fonts.get(id) else {
            return;
        };
        let extents = self.driver.text_extents(font, text);
        let (x, y) = align.apply(x, y, extents.width, extents.ascent, extents.descent);
        let origin = Point::new(x, y);
        trace!("draw_text {:?} at ({}, {})", text, x, y);
        self.session.mark(text_bounds(origin, &extents));
        self.driver.draw_text(font, origin, text, pixel);
    }

    fn clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if !self.session.is_open() {
            warn!("clip outside a render session; ignored");
            return;
        }
        self.session
            .set_clip(&mut self.driver, PixelRect::new(x, y, w, h));
    }

    fn unclip(&mut self) {
        if !self.session.is_open() {
            warn!("unclip outside a render session; ignored");
            return;
        }
        self.session.clear_clip(&mut self.driver);
    }

    fn draw_update(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if !self.session.is_open() {
            warn!("draw_update outside a render session; ignored");
            return;
        }
        self.session.mark(PixelRect::new(x, y, w, h));
    }

    fn default_colour(&self) -> [f32; 3] {
        self.driver.default_background().to_normalized()
    }

    fn status_bar(&mut self, text: &str) {
        if !self.statusbar {
            warn!("status_bar called but no status bar was requested; ignored");
            return;
        }
        self.driver.set_status_text(text);
    }

    fn activate_timer(&mut self) {
        if let Err(e) = self.timer.activate(&mut self.driver) {
            self.fail(e.context("starting animation timer").into());
        }
    }

    fn deactivate_timer(&mut self) {
        self.timer.deactivate(&mut self.driver);
    }
}
