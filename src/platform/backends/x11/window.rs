// src/platform/backends/x11/window.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use super::connection::Connection;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, trace, warn};
use std::ffi::CString;
use std::mem;

use libc::{c_char, c_int, c_uint, c_ulong};
use x11::xlib;

/// Events the puzzle window listens for.
const EVENT_MASK: std::os::raw::c_long = xlib::ExposureMask
    | xlib::KeyPressMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::PointerMotionMask
    | xlib::StructureNotifyMask;

/// The top-level puzzle window.
///
/// The window is exactly the size of the drawing area and is not resizable
/// by the user; only [`Window::resize`] changes it. The status line, when
/// requested, is shown after the title as `title : status`.
#[derive(Debug)]
pub struct Window {
    id: xlib::Window,
    wm_delete_window: xlib::Atom,
    protocols_atom: xlib::Atom,
    width: i32,
    height: i32,
    title: String,
    statusbar: bool,
}

impl Window {
    pub fn new(
        connection: &Connection,
        width: i32,
        height: i32,
        bg_pixel: c_ulong,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(anyhow!("refusing to create a {}x{} window", width, height));
        }
        info!("Creating X11 window: {}x{}px, bg_pixel: {}", width, height, bg_pixel);
        let display = connection.display();
        let screen = connection.screen();

        let window_id = unsafe {
            let root_window = xlib::XRootWindow(display, screen);
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.colormap = connection.colormap();
            attributes.background_pixel = bg_pixel;
            attributes.border_pixel = bg_pixel;
            attributes.event_mask = EVENT_MASK;

            xlib::XCreateWindow(
                display,
                root_window,
                0,
                0,
                width as c_uint,
                height as c_uint,
                0,
                connection.depth(),
                xlib::InputOutput as c_uint,
                connection.visual(),
                xlib::CWColormap | xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWEventMask,
                &mut attributes,
            )
        };

        if window_id == 0 {
            return Err(anyhow!("XCreateWindow failed"));
        }
        debug!("X window created (ID: {}), size {}x{}", window_id, width, height);

        Ok(Self {
            id: window_id,
            wm_delete_window: 0,
            protocols_atom: 0,
            width,
            height,
            title: String::new(),
            statusbar: false,
        })
    }

    /// Registers for `WM_DELETE_WINDOW`, pins the size and sets the title.
    pub fn setup_protocols_and_hints(
        &mut self,
        connection: &Connection,
        title: &str,
        statusbar: bool,
    ) -> Result<()> {
        if self.id == 0 {
            warn!("setup_protocols_and_hints called on a destroyed window. Skipping.");
            return Ok(());
        }
        let display = connection.display();
        unsafe {
            self.wm_delete_window = intern(display, b"WM_DELETE_WINDOW\0");
            self.protocols_atom = intern(display, b"WM_PROTOCOLS\0");

            if self.wm_delete_window != 0 && self.protocols_atom != 0 {
                xlib::XSetWMProtocols(display, self.id, [self.wm_delete_window].as_mut_ptr(), 1);
                debug!("WM_PROTOCOLS (WM_DELETE_WINDOW) registered.");
            } else {
                warn!("Failed to get WM_DELETE_WINDOW or WM_PROTOCOLS atom. Window close events might not be received.");
            }
        }
        self.pin_size(connection);
        self.title = title.to_string();
        self.statusbar = statusbar;
        self.store_title(connection, title)
    }

    /// Fixes the window manager's idea of our size to the current one.
    fn pin_size(&self, connection: &Connection) {
        unsafe {
            let mut size_hints: xlib::XSizeHints = mem::zeroed();
            size_hints.flags = xlib::PSize | xlib::PMinSize | xlib::PMaxSize;
            size_hints.width = self.width as c_int;
            size_hints.height = self.height as c_int;
            size_hints.min_width = self.width as c_int;
            size_hints.min_height = self.height as c_int;
            size_hints.max_width = self.width as c_int;
            size_hints.max_height = self.height as c_int;
            xlib::XSetWMNormalHints(connection.display(), self.id, &mut size_hints);
        }
        debug!("WM size hints pinned to {}x{}.", self.width, self.height);
    }

    pub fn map_and_flush(&self, connection: &Connection) {
        if self.id == 0 {
            warn!("map_and_flush called on a destroyed window.");
            return;
        }
        info!("Mapping window ID: {}", self.id);
        unsafe {
            xlib::XMapWindow(connection.display(), self.id);
            xlib::XFlush(connection.display());
        }
    }

    /// Shows `status` next to the title. Ignored when no status line was requested.
    pub fn set_status(&self, connection: &Connection, status: &str) -> Result<()> {
        if !self.statusbar {
            trace!("No status line on this window; dropping {:?}", status);
            return Ok(());
        }
        let full = if status.is_empty() {
            self.title.clone()
        } else {
            format!("{} : {}", self.title, status)
        };
        self.store_title(connection, &full)
    }

    fn store_title(&self, connection: &Connection, title: &str) -> Result<()> {
        if self.id == 0 {
            return Ok(());
        }
        let display = connection.display();
        let title_c_str = CString::new(title).context("Failed to create CString for title")?;
        unsafe {
            xlib::XStoreName(display, self.id, title_c_str.as_ptr() as *mut c_char);

            let net_wm_name_atom = intern(display, b"_NET_WM_NAME\0");
            let utf8_string_atom = intern(display, b"UTF8_STRING\0");
            if net_wm_name_atom != 0 && utf8_string_atom != 0 {
                xlib::XChangeProperty(
                    display,
                    self.id,
                    net_wm_name_atom,
                    utf8_string_atom,
                    8,
                    xlib::PropModeReplace,
                    title_c_str.as_ptr() as *const u8,
                    title_c_str.as_bytes().len() as c_int,
                );
            }
            xlib::XFlush(display);
        }
        trace!("Window title set to: {}", title);
        Ok(())
    }

    /// Resizes the window and re-pins the size hints.
    pub fn resize(&mut self, connection: &Connection, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(anyhow!("refusing to resize window to {}x{}", width, height));
        }
        self.width = width;
        self.height = height;
        self.pin_size(connection);
        unsafe {
            xlib::XResizeWindow(connection.display(), self.id, width as c_uint, height as c_uint);
            xlib::XFlush(connection.display());
        }
        debug!("Requested window resize to {}x{}", width, height);
        Ok(())
    }

    pub fn cleanup(&mut self, connection: &Connection) {
        if self.id != 0 && connection.is_open() {
            info!("Destroying X11 window (ID: {}).", self.id);
            unsafe {
                xlib::XDestroyWindow(connection.display(), self.id);
                xlib::XFlush(connection.display());
            }
            self.id = 0;
        } else {
            debug!("Window already destroyed or connection closed; cleanup skipped.");
        }
    }

    #[inline]
    pub fn id(&self) -> xlib::Window {
        self.id
    }

    #[inline]
    pub fn wm_delete_window_atom(&self) -> xlib::Atom {
        self.wm_delete_window
    }

    #[inline]
    pub fn protocols_atom(&self) -> xlib::Atom {
        self.protocols_atom
    }

    /// The size last requested or reported for the window.
    #[inline]
    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Records a size reported by the server. Returns true if it changed.
    pub fn update_dimensions(&mut self, width: i32, height: i32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        debug!(
            "Updating cached window dimensions from {}x{} to {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;
        true
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.id != 0 {
            error!(
                "Window (ID: {}) dropped without explicit cleanup. Server resources may leak.",
                self.id
            );
        }
    }
}

/// Looks up an existing atom; 0 if the server does not know it.
unsafe fn intern(display: *mut xlib::Display, name: &[u8]) -> xlib::Atom {
    xlib::XInternAtom(display, name.as_ptr() as *const c_char, xlib::False)
}
