// src/platform/backends/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::os::unix::io::RawFd;
use std::ptr;

use libc::c_int;
use x11::xlib;

/// Manages an X11 Display connection, ensuring it's closed on drop.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens the display named by `DISPLAY`.
    fn new() -> Result<Self> {
        let display_ptr = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display_ptr.is_null() {
            Err(anyhow!(
                "Failed to open X display. Check DISPLAY environment variable or X server status."
            ))
        } else {
            debug!("X display opened: {:p}", display_ptr);
            Ok(Self { ptr: display_ptr })
        }
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }

    /// Closes the display now. Safe to call more than once.
    fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        info!("Closing X11 display connection: {:p}", self.ptr);
        let status = unsafe { xlib::XCloseDisplay(self.ptr) };
        if status != 0 {
            warn!("XCloseDisplay returned non-zero status: {}", status);
        }
        self.ptr = ptr::null_mut();
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

/// The X server connection plus the screen-level defaults every other
/// resource is created against.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    colormap: xlib::Colormap,
    visual: *mut xlib::Visual,
    depth: c_int,
}

impl Connection {
    pub fn new() -> Result<Self> {
        info!("Establishing X11 server connection.");
        let managed_display = ManagedDisplay::new()?;
        let display = managed_display.raw();

        let screen = unsafe { xlib::XDefaultScreen(display) };
        let colormap = unsafe { xlib::XDefaultColormap(display, screen) };
        let visual = unsafe { xlib::XDefaultVisual(display, screen) };
        if visual.is_null() {
            return Err(anyhow!(
                "Failed to get default visual for screen {}.",
                screen
            ));
        }
        let depth = unsafe { xlib::XDefaultDepth(display, screen) };
        debug!(
            "Screen {}: colormap {}, visual {:p}, depth {}",
            screen, colormap, visual, depth
        );

        Ok(Connection {
            managed_display,
            screen,
            colormap,
            visual,
            depth,
        })
    }

    /// Closes the display. Every resource created on it must already be gone.
    pub fn cleanup(&mut self) {
        if self.managed_display.raw().is_null() {
            debug!("X11 display connection already closed; cleanup skipped.");
            return;
        }
        self.managed_display.close();
    }

    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.raw()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.managed_display.raw().is_null()
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn colormap(&self) -> xlib::Colormap {
        self.colormap
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    #[inline]
    pub fn depth(&self) -> c_int {
        self.depth
    }

    /// The file descriptor the X protocol stream arrives on.
    pub fn event_fd(&self) -> Option<RawFd> {
        if !self.is_open() {
            warn!("event_fd called on a closed X display.");
            None
        } else {
            Some(unsafe { xlib::XConnectionNumber(self.display()) })
        }
    }

    /// Sends every buffered request to the server.
    pub fn flush(&self) {
        if self.is_open() {
            unsafe { xlib::XFlush(self.display()) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_connection() -> Connection {
        Connection {
            managed_display: ManagedDisplay {
                ptr: ptr::null_mut(),
            },
            screen: 0,
            colormap: 0,
            visual: ptr::null_mut(),
            depth: 0,
        }
    }

    #[test]
    fn it_should_tolerate_repeated_cleanup() {
        let mut conn = closed_connection();
        conn.cleanup();
        conn.cleanup();
        assert!(!conn.is_open());
    }

    #[test]
    fn it_should_have_no_event_fd_once_closed() {
        let conn = closed_connection();
        assert!(conn.event_fd().is_none());
    }
}
