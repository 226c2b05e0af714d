// src/render/session.rs

//! The `start_draw` / `end_draw` protocol over a driver's drawing context.

use log::{debug, trace};

use crate::platform::backends::{Driver, PixelRect};
use crate::render::damage::DamageRect;

/// State of the current render pass.
///
/// While open, a drawing context on the off-screen buffer is held and damage
/// accumulates. Closing releases the context (dropping any clip) and blits
/// the damaged rectangle to the visible surface.
#[derive(Debug, Clone)]
pub struct RenderSession {
    open: bool,
    damage: DamageRect,
    canvas: PixelRect,
}

impl Default for RenderSession {
    fn default() -> Self {
        Self {
            open: false,
            damage: DamageRect::empty(0, 0),
            canvas: PixelRect::default(),
        }
    }
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn damage(&self) -> &DamageRect {
        &self.damage
    }

    /// Opens a session on a `width × height` canvas: acquires the context,
    /// resets damage, starts unclipped.
    pub fn begin<D: Driver + ?Sized>(
        &mut self,
        driver: &mut D,
        width: i32,
        height: i32,
    ) -> anyhow::Result<()> {
        driver.begin_context()?;
        self.open = true;
        self.canvas = PixelRect::new(0, 0, width, height);
        self.damage = DamageRect::empty(width, height);
        trace!("Render session opened on {}x{}", width, height);
        Ok(())
    }

    /// Closes the session and returns the rectangle that was blitted, if any.
    pub fn end<D: Driver + ?Sized>(&mut self, driver: &mut D) -> Option<PixelRect> {
        driver.end_context();
        self.open = false;
        let damaged = self.damage.bounds();
        match damaged {
            Some(rect) => {
                debug!(
                    "Blitting damage ({}, {}) {}x{}",
                    rect.x, rect.y, rect.width, rect.height
                );
                driver.blit(rect);
            }
            None => trace!("Render session closed with no damage"),
        }
        damaged
    }

    /// Widens the damage rectangle.
    pub fn mark(&mut self, rect: PixelRect) {
        self.damage.include_rect(rect);
    }

    pub fn set_clip<D: Driver + ?Sized>(&mut self, driver: &mut D, rect: PixelRect) {
        driver.set_clip(rect);
    }

    /// Restores the full-canvas clip.
    pub fn clear_clip<D: Driver + ?Sized>(&mut self, driver: &mut D) {
        driver.set_clip(self.canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::backends::headless::HeadlessDriver;

    #[test_log::test]
    fn empty_session_blits_nothing() {
        let mut driver = HeadlessDriver::new();
        driver.create_buffer(50, 50, 0).unwrap();
        let mut session = RenderSession::new();
        session.begin(&mut driver, 50, 50).unwrap();
        assert_eq!(session.end(&mut driver), None);
        assert!(driver.blits().is_empty());
        assert!(!driver.is_context_open());
    }

    #[test_log::test]
    fn session_blits_union_of_marks() {
        let mut driver = HeadlessDriver::new();
        driver.create_buffer(50, 50, 0).unwrap();
        let mut session = RenderSession::new();
        session.begin(&mut driver, 50, 50).unwrap();
        session.mark(PixelRect::new(1, 1, 2, 2));
        session.mark(PixelRect::new(10, 10, 5, 5));
        let blitted = session.end(&mut driver);
        assert_eq!(blitted, Some(PixelRect::new(1, 1, 14, 14)));
        assert_eq!(driver.blits(), &[PixelRect::new(1, 1, 14, 14)]);
    }

    #[test_log::test]
    fn begin_fails_without_a_buffer() {
        let mut driver = HeadlessDriver::new();
        let mut session = RenderSession::new();
        assert!(session.begin(&mut driver, 10, 10).is_err());
        assert!(!session.is_open());
    }

    #[test_log::test]
    fn unclip_restores_full_canvas() {
        let mut driver = HeadlessDriver::new();
        driver.create_buffer(30, 20, 0).unwrap();
        let mut session = RenderSession::new();
        session.begin(&mut driver, 30, 20).unwrap();
        session.set_clip(&mut driver, PixelRect::new(1, 1, 2, 2));
        session.clear_clip(&mut driver);
        assert_eq!(driver.clip(), Some(PixelRect::new(0, 0, 30, 20)));
    }
}
