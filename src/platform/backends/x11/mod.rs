// src/platform/backends/x11/mod.rs

//! X11 implementation of [`Driver`] using Xlib for the window and drawing
//! and Xft for text.
//!
//! The X window has no toolkit menu bar. The game menu is reached through
//! its keyboard accelerators: the single-key entries are the keys the
//! engine already understands, and F1..F12 select presets.

use crate::color::Rgb16;
use crate::frontend::menu::MenuItem;
use crate::platform::backends::{
    Driver, Pixel, PixelRect, Point, TextExtents, TimerId, WindowSpec,
};
use crate::platform::{MenuAction, PlatformEvent};

use anyhow::{anyhow, Context, Result};
use libc::c_ulong;
use log::{debug, info, trace, warn};
use std::collections::{BTreeMap, VecDeque};
use std::mem;
use std::time::{Duration, Instant};

pub mod connection;
pub mod event;
pub mod graphics;
pub mod window;

use connection::Connection;
use graphics::{Graphics, SafeXftFont};
use window::Window;
use x11::xlib;

/// A registered repeating timeout.
#[derive(Debug, Clone, Copy)]
struct Timeout {
    period: Duration,
    deadline: Instant,
}

/// Drives one puzzle window on an X server.
///
/// Fonts handed out by [`XDriver::load_font`] borrow the display and must be
/// dropped before the driver.
pub struct XDriver {
    // Field order is drop order: server resources go before the display.
    graphics: Graphics,
    window: Option<Window>,
    connection: Connection,
    pending: VecDeque<PlatformEvent>,
    timers: BTreeMap<TimerId, Timeout>,
    next_timer: u64,
}

impl XDriver {
    /// Connects to the display named by `DISPLAY` and allocates the window
    /// background. The window itself is created by `create_window`.
    pub fn new(background: Rgb16) -> Result<Self> {
        let connection = Connection::new().context("connecting to the X server")?;
        let graphics = Graphics::new(&connection, background)?;
        info!("X11 driver ready on screen {}", connection.screen());
        Ok(Self {
            graphics,
            window: None,
            connection,
            pending: VecDeque::new(),
            timers: BTreeMap::new(),
            next_timer: 1,
        })
    }

    fn window_id(&self) -> Option<xlib::Window> {
        self.window.as_ref().map(Window::id)
    }

    /// Moves every event the server has sent into the pending queue.
    fn pump_x_events(&mut self) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let display = self.connection.display();
        while unsafe { xlib::XPending(display) } > 0 {
            let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
            unsafe { xlib::XNextEvent(display, &mut xevent) };
            if let Some(event) = event::translate(window, &mut xevent) {
                self.pending.push_back(event);
            }
        }
    }

    /// Fires the earliest overdue timer, if any, and schedules its next tick.
    fn fire_due_timer(&mut self, now: Instant) -> Option<TimerId> {
        let (&id, timeout) = self
            .timers
            .iter_mut()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| t.deadline)?;
        timeout.deadline += timeout.period;
        if timeout.deadline <= now {
            // Fell behind; don't replay missed ticks.
            timeout.deadline = now + timeout.period;
        }
        Some(id)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }
}

impl Driver for XDriver {
    type Font = SafeXftFont;

    fn create_window(&mut self, spec: &WindowSpec) -> Result<()> {
        if self.window.is_some() {
            return Err(anyhow!("the puzzle window already exists"));
        }
        let mut window = Window::new(
            &self.connection,
            spec.width,
            spec.height,
            c_ulong::from(self.graphics.background_pixel()),
        )?;
        window.setup_protocols_and_hints(&self.connection, &spec.title, spec.statusbar)?;
        self.graphics.attach_window(&self.connection, window.id())?;
        window.map_and_flush(&self.connection);

        for (label, action) in MenuItem::entries(&spec.menu) {
            match action {
                MenuAction::Key(command) => debug!("Menu '{}' on key {:?}", label, command),
                MenuAction::Preset(i) if i < 12 => debug!("Menu '{}' on F{}", label, i + 1),
                MenuAction::Preset(_) => warn!("Menu '{}' has no function key", label),
            }
        }

        self.window = Some(window);
        self.pending.push_back(PlatformEvent::Configure {
            width: spec.width,
            height: spec.height,
        });
        Ok(())
    }

    fn destroy_window(&mut self) {
        self.timers.clear();
        self.pending.clear();
        self.graphics.cleanup(&self.connection);
        if let Some(mut window) = self.window.take() {
            window.cleanup(&self.connection);
        }
    }

    fn resize_canvas(&mut self, width: i32, height: i32) -> Result<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| anyhow!("no window to resize"))?;
        window.resize(&self.connection, width, height)?;
        // The server's ConfigureNotify will match the cached size and be
        // dropped, so announce the new size here.
        self.pending
            .push_back(PlatformEvent::Configure { width, height });
        Ok(())
    }

    fn set_status_text(&mut self, text: &str) {
        let Some(window) = &self.window else {
            return;
        };
        if let Err(e) = window.set_status(&self.connection, text) {
            warn!("Failed to set status text: {:#}", e);
        }
    }

    fn queue_repaint(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let (width, height) = window.dimensions();
        self.pending.push_back(PlatformEvent::Expose {
            area: PixelRect::new(0, 0, width, height),
        });
    }

    fn alloc_colours(&mut self, colours: &[Rgb16]) -> Vec<Option<Pixel>> {
        self.graphics.alloc_colours(&self.connection, colours)
    }

    fn default_background(&self) -> Rgb16 {
        self.graphics.background()
    }

    fn create_buffer(&mut self, width: i32, height: i32, fill: Pixel) -> Result<()> {
        let window = self
            .window_id()
            .ok_or_else(|| anyhow!("no window to create a buffer for"))?;
        self.graphics
            .create_buffer(&self.connection, window, width, height, fill)
    }

    fn has_buffer(&self) -> bool {
        self.graphics.has_buffer()
    }

    fn begin_context(&mut self) -> Result<()> {
        self.graphics.begin_context(&self.connection)
    }

    fn end_context(&mut self) {
        self.graphics.end_context();
    }

    fn set_clip(&mut self, rect: PixelRect) {
        self.graphics.set_clip(&self.connection, rect);
    }

    fn fill_rect(&mut self, rect: PixelRect, pixel: Pixel) {
        self.graphics.fill_rect(&self.connection, rect, pixel);
    }

    fn draw_line(&mut self, from: Point, to: Point, pixel: Pixel) {
        self.graphics.draw_line(&self.connection, from, to, pixel);
    }

    fn draw_polygon(&mut self, points: &[Point], filled: bool, pixel: Pixel) {
        self.graphics
            .draw_polygon(&self.connection, points, filled, pixel);
    }

    fn load_font(&mut self, face: &str, size: i32) -> Result<Self::Font> {
        self.graphics.load_font(&self.connection, face, size)
    }

    fn text_extents(&mut self, font: &Self::Font, text: &str) -> TextExtents {
        self.graphics.text_extents(&self.connection, font, text)
    }

    fn draw_text(&mut self, font: &Self::Font, origin: Point, text: &str, pixel: Pixel) {
        self.graphics.draw_text(font, origin, text, pixel);
    }

    fn blit(&mut self, rect: PixelRect) {
        let Some(window) = self.window_id() else {
            return;
        };
        self.graphics.blit(&self.connection, window, rect);
    }

    fn add_timeout(&mut self, period: Duration) -> Result<TimerId> {
        if period.is_zero() {
            return Err(anyhow!("refusing a zero-length timeout"));
        }
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            id,
            Timeout {
                period,
                deadline: Instant::now() + period,
            },
        );
        trace!("Timeout {:?} every {:?}", id, period);
        Ok(id)
    }

    fn remove_timeout(&mut self, id: TimerId) {
        if self.timers.remove(&id).is_some() {
            trace!("Timeout {:?} removed", id);
        }
    }

    fn next_event(&mut self) -> Result<Option<PlatformEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.window.is_none() {
                return Ok(None);
            }
            self.pump_x_events();
            if !self.pending.is_empty() {
                continue;
            }
            let now = Instant::now();
            if let Some(id) = self.fire_due_timer(now) {
                return Ok(Some(PlatformEvent::Timer(id)));
            }
            let wait = self
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(now));
            let fd = self
                .connection
                .event_fd()
                .ok_or_else(|| anyhow!("X connection closed"))?;
            self.connection.flush();
            event::wait_readable(fd, wait)?;
        }
    }
}

impl Drop for XDriver {
    fn drop(&mut self) {
        self.destroy_window();
        self.connection.cleanup();
    }
}
