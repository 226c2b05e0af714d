// src/platform/backends/x11/graphics.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

//! Server-side drawing resources: colours, the off-screen pixmap, the
//! per-session graphics context and Xft text.

use super::connection::Connection;
use crate::color::Rgb16;
use crate::platform::backends::{Pixel, PixelRect, Point, TextExtents};

use anyhow::{anyhow, Context, Result};
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::ffi::CString;
use std::mem;
use std::ptr;

use libc::{c_char, c_int, c_uint, c_ulong};
use x11::xrender::{XGlyphInfo, XRenderColor};
use x11::{xft, xlib};

/// Alpha value for fully opaque colors in XRender.
const XRENDER_ALPHA_OPAQUE: u16 = 0xffff;

// --- RAII Wrappers for X11 Resources ---

/// Wraps an `XftFont` pointer to ensure it's closed via `XftFontClose` on drop.
#[derive(Debug)]
pub struct SafeXftFont {
    ptr: *mut xft::XftFont,
    display: *mut xlib::Display,
}

impl SafeXftFont {
    fn new(font_ptr: *mut xft::XftFont, display_ptr: *mut xlib::Display) -> Self {
        Self {
            ptr: font_ptr,
            display: display_ptr,
        }
    }

    #[inline]
    fn raw(&self) -> *mut xft::XftFont {
        self.ptr
    }

    fn ascent(&self) -> i32 {
        if self.ptr.is_null() {
            return 0;
        }
        unsafe { (*self.ptr).ascent }
    }

    fn descent(&self) -> i32 {
        if self.ptr.is_null() {
            return 0;
        }
        unsafe { (*self.ptr).descent }
    }
}

impl Drop for SafeXftFont {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            if self.display.is_null() {
                warn!("SafeXftFont::drop with a null display; leaking font {:p}.", self.ptr);
                return;
            }
            trace!("Closing XftFont {:p}", self.ptr);
            unsafe { xft::XftFontClose(self.display, self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

/// Wraps an `XftDraw` pointer to ensure it's destroyed via `XftDrawDestroy` on drop.
#[derive(Debug)]
struct SafeXftDraw {
    ptr: *mut xft::XftDraw,
}

impl SafeXftDraw {
    #[inline]
    fn raw(&self) -> *mut xft::XftDraw {
        self.ptr
    }
}

impl Drop for SafeXftDraw {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            trace!("Destroying XftDraw {:p}", self.ptr);
            unsafe { xft::XftDrawDestroy(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

/// Wraps an X11 `GC` to ensure it's freed via `XFreeGC` on drop.
#[derive(Debug)]
struct SafeGc {
    gc: xlib::GC,
    display: *mut xlib::Display,
}

impl SafeGc {
    fn create(display: *mut xlib::Display, drawable: xlib::Drawable) -> Result<Self> {
        let gc = unsafe { xlib::XCreateGC(display, drawable, 0, ptr::null_mut()) };
        if gc.is_null() {
            return Err(anyhow!("XCreateGC failed for drawable {}", drawable));
        }
        Ok(Self { gc, display })
    }

    #[inline]
    fn raw(&self) -> xlib::GC {
        self.gc
    }
}

impl Drop for SafeGc {
    fn drop(&mut self) {
        if !self.gc.is_null() && !self.display.is_null() {
            trace!("Freeing GC {:p}", self.gc);
            unsafe { xlib::XFreeGC(self.display, self.gc) };
            self.gc = ptr::null_mut();
        }
    }
}

/// Wraps a server-side `Pixmap` to ensure it's freed via `XFreePixmap` on drop.
#[derive(Debug)]
struct SafePixmap {
    id: xlib::Pixmap,
    display: *mut xlib::Display,
    width: i32,
    height: i32,
}

impl Drop for SafePixmap {
    fn drop(&mut self) {
        if self.id != 0 && !self.display.is_null() {
            trace!("Freeing {}x{} pixmap {}", self.width, self.height, self.id);
            unsafe { xlib::XFreePixmap(self.display, self.id) };
            self.id = 0;
        }
    }
}

/// The off-screen buffer together with the Xft surface bound to it.
#[derive(Debug)]
struct Buffer {
    // Declared first so the Xft surface goes before its pixmap.
    xft_draw: SafeXftDraw,
    pixmap: SafePixmap,
}

/// Colours granted by the server, released together on cleanup.
#[derive(Debug, Default)]
struct ColourPool {
    pixels: Vec<c_ulong>,
    render: HashMap<Pixel, XRenderColor>,
}

/// All server-side drawing state of the puzzle window.
#[derive(Debug)]
pub struct Graphics {
    colours: ColourPool,
    background: Rgb16,
    background_pixel: Pixel,
    buffer: Option<Buffer>,
    session_gc: Option<SafeGc>,
    blit_gc: Option<SafeGc>,
}

impl Graphics {
    /// Allocates the window background colour. Everything else waits for
    /// the window.
    pub fn new(connection: &Connection, background: Rgb16) -> Result<Self> {
        let mut colours = ColourPool::default();
        let (pixel, granted) = alloc_colour(connection, background).ok_or_else(|| {
            let [r, g, b] = background.to_rgb8();
            anyhow!("couldn't allocate window background #{:02x}{:02x}{:02x}", r, g, b)
        })?;
        colours.remember(pixel, granted);
        debug!("Window background {:?} granted as pixel {}", granted, pixel);
        Ok(Self {
            colours,
            background: granted,
            background_pixel: pixel,
            buffer: None,
            session_gc: None,
            blit_gc: None,
        })
    }

    pub fn background(&self) -> Rgb16 {
        self.background
    }

    pub fn background_pixel(&self) -> Pixel {
        self.background_pixel
    }

    /// Creates the graphics context used to copy the buffer onto `window`.
    pub fn attach_window(&mut self, connection: &Connection, window: xlib::Window) -> Result<()> {
        self.blit_gc = Some(SafeGc::create(connection.display(), window)?);
        Ok(())
    }

    pub fn alloc_colours(&mut self, connection: &Connection, colours: &[Rgb16]) -> Vec<Option<Pixel>> {
        colours
            .iter()
            .map(|&rgb| {
                let (pixel, granted) = alloc_colour(connection, rgb)?;
                self.colours.remember(pixel, granted);
                Some(pixel)
            })
            .collect()
    }

    // --- Off-screen buffer ---

    pub fn create_buffer(
        &mut self,
        connection: &Connection,
        window: xlib::Window,
        width: i32,
        height: i32,
        fill: Pixel,
    ) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(anyhow!("invalid buffer size {}x{}", width, height));
        }
        if self.session_gc.is_some() {
            warn!("Recreating the buffer inside a drawing session; closing the session.");
            self.session_gc = None;
        }
        self.buffer = None;

        let display = connection.display();
        let id = unsafe {
            xlib::XCreatePixmap(
                display,
                window,
                width as c_uint,
                height as c_uint,
                connection.depth() as c_uint,
            )
        };
        if id == 0 {
            return Err(anyhow!("XCreatePixmap failed for {}x{}", width, height));
        }
        let pixmap = SafePixmap {
            id,
            display,
            width,
            height,
        };

        let draw = unsafe {
            xft::XftDrawCreate(display, id, connection.visual(), connection.colormap())
        };
        if draw.is_null() {
            return Err(anyhow!("XftDrawCreate failed on pixmap {}", id));
        }
        let xft_draw = SafeXftDraw { ptr: draw };

        let gc = SafeGc::create(display, id).context("clearing new buffer")?;
        unsafe {
            xlib::XSetForeground(display, gc.raw(), fill as c_ulong);
            xlib::XFillRectangle(display, id, gc.raw(), 0, 0, width as c_uint, height as c_uint);
        }
        info!("Off-screen buffer {} created at {}x{}", id, width, height);
        self.buffer = Some(Buffer { xft_draw, pixmap });
        Ok(())
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    // --- Drawing context ---

    pub fn begin_context(&mut self, connection: &Connection) -> Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| anyhow!("no off-screen buffer to draw on"))?;
        self.session_gc = Some(SafeGc::create(connection.display(), buffer.pixmap.id)?);
        Ok(())
    }

    pub fn end_context(&mut self) {
        if self.session_gc.take().is_none() {
            trace!("end_context without an open context");
        }
        if let Some(buffer) = &self.buffer {
            unsafe { xft::XftDrawSetClip(buffer.xft_draw.raw(), ptr::null_mut()) };
        }
    }

    pub fn set_clip(&mut self, connection: &Connection, rect: PixelRect) {
        let (Some(gc), Some(buffer)) = (&self.session_gc, &self.buffer) else {
            return;
        };
        let mut xrect = to_xrect(rect);
        unsafe {
            xlib::XSetClipRectangles(connection.display(), gc.raw(), 0, 0, &mut xrect, 1, xlib::Unsorted);
            xft::XftDrawSetClipRectangles(buffer.xft_draw.raw(), 0, 0, &xrect, 1);
        }
    }

    /// The graphics context, drawable and display for a primitive.
    fn target(&self, connection: &Connection, pixel: Pixel) -> Option<(*mut xlib::Display, xlib::Drawable, xlib::GC)> {
        let (Some(gc), Some(buffer)) = (&self.session_gc, &self.buffer) else {
            warn!("Drawing without an open context; ignored");
            return None;
        };
        let display = connection.display();
        unsafe { xlib::XSetForeground(display, gc.raw(), pixel as c_ulong) };
        Some((display, buffer.pixmap.id, gc.raw()))
    }

    pub fn fill_rect(&mut self, connection: &Connection, rect: PixelRect, pixel: Pixel) {
        if rect.is_empty() {
            return;
        }
        let Some((display, drawable, gc)) = self.target(connection, pixel) else {
            return;
        };
        unsafe {
            xlib::XFillRectangle(
                display,
                drawable,
                gc,
                rect.x,
                rect.y,
                rect.width as c_uint,
                rect.height as c_uint,
            );
        }
    }

    pub fn draw_line(&mut self, connection: &Connection, from: Point, to: Point, pixel: Pixel) {
        let Some((display, drawable, gc)) = self.target(connection, pixel) else {
            return;
        };
        unsafe { xlib::XDrawLine(display, drawable, gc, from.x, from.y, to.x, to.y) };
    }

    /// Fills (optionally) and then outlines a closed polygon.
    pub fn draw_polygon(&mut self, connection: &Connection, points: &[Point], filled: bool, pixel: Pixel) {
        if points.is_empty() {
            return;
        }
        let Some((display, drawable, gc)) = self.target(connection, pixel) else {
            return;
        };
        let mut xpoints: Vec<xlib::XPoint> = points.iter().map(|p| to_xpoint(*p)).collect();
        unsafe {
            if filled {
                xlib::XFillPolygon(
                    display,
                    drawable,
                    gc,
                    xpoints.as_mut_ptr(),
                    xpoints.len() as c_int,
                    xlib::Complex,
                    xlib::CoordModeOrigin,
                );
            }
            xpoints.push(to_xpoint(points[0]));
            xlib::XDrawLines(
                display,
                drawable,
                gc,
                xpoints.as_mut_ptr(),
                xpoints.len() as c_int,
                xlib::CoordModeOrigin,
            );
        }
    }

    // --- Text ---

    pub fn load_font(&mut self, connection: &Connection, face: &str, size: i32) -> Result<SafeXftFont> {
        let pattern = format!("{}:pixelsize={}", face, size.max(1));
        let name = CString::new(pattern.as_str())
            .with_context(|| format!("font name {:?} contains a NUL byte", face))?;
        let font = unsafe { xft::XftFontOpenName(connection.display(), connection.screen(), name.as_ptr()) };
        if font.is_null() {
            return Err(anyhow!("XftFontOpenName failed for '{}'", pattern));
        }
        debug!("Loaded font '{}' ({:p})", pattern, font);
        Ok(SafeXftFont::new(font, connection.display()))
    }

    pub fn text_extents(&self, connection: &Connection, font: &SafeXftFont, text: &str) -> TextExtents {
        let mut info: XGlyphInfo = unsafe { mem::zeroed() };
        if !text.is_empty() {
            unsafe {
                xft::XftTextExtentsUtf8(
                    connection.display(),
                    font.raw(),
                    text.as_ptr(),
                    text.len() as c_int,
                    &mut info,
                );
            }
        }
        TextExtents {
            lbearing: -i32::from(info.x),
            rbearing: i32::from(info.width) - i32::from(info.x),
            width: i32::from(info.xOff),
            ascent: font.ascent(),
            descent: font.descent(),
        }
    }

    pub fn draw_text(&mut self, font: &SafeXftFont, origin: Point, text: &str, pixel: Pixel) {
        if self.session_gc.is_none() {
            warn!("draw_text without an open context; ignored");
            return;
        }
        let Some(buffer) = &self.buffer else {
            return;
        };
        let Some(render) = self.colours.render.get(&pixel) else {
            warn!("draw_text with unallocated pixel {}; ignored", pixel);
            return;
        };
        let colour = xft::XftColor {
            pixel: pixel as c_ulong,
            color: *render,
        };
        unsafe {
            xft::XftDrawStringUtf8(
                buffer.xft_draw.raw(),
                &colour,
                font.raw(),
                origin.x,
                origin.y,
                text.as_ptr(),
                text.len() as c_int,
            );
        }
    }

    // --- Presentation ---

    pub fn blit(&mut self, connection: &Connection, window: xlib::Window, rect: PixelRect) {
        let (Some(gc), Some(buffer)) = (&self.blit_gc, &self.buffer) else {
            warn!("Blit without a window or buffer; ignored");
            return;
        };
        let bounds = PixelRect::new(0, 0, buffer.pixmap.width, buffer.pixmap.height);
        let Some(rect) = rect.intersect(&bounds) else {
            return;
        };
        trace!("Blit ({}, {}) {}x{}", rect.x, rect.y, rect.width, rect.height);
        unsafe {
            xlib::XCopyArea(
                connection.display(),
                buffer.pixmap.id,
                window,
                gc.raw(),
                rect.x,
                rect.y,
                rect.width as c_uint,
                rect.height as c_uint,
                rect.x,
                rect.y,
            );
        }
        connection.flush();
    }

    /// Frees every server resource. The connection must still be open.
    pub fn cleanup(&mut self, connection: &Connection) {
        self.session_gc = None;
        self.blit_gc = None;
        self.buffer = None;
        if !self.colours.pixels.is_empty() && connection.is_open() {
            debug!("Freeing {} allocated colours", self.colours.pixels.len());
            unsafe {
                xlib::XFreeColors(
                    connection.display(),
                    connection.colormap(),
                    self.colours.pixels.as_mut_ptr(),
                    self.colours.pixels.len() as c_int,
                    0,
                );
            }
        }
        self.colours = ColourPool::default();
    }
}

impl ColourPool {
    fn remember(&mut self, pixel: Pixel, rgb: Rgb16) {
        self.pixels.push(pixel as c_ulong);
        self.render.insert(
            pixel,
            XRenderColor {
                red: rgb.red,
                green: rgb.green,
                blue: rgb.blue,
                alpha: XRENDER_ALPHA_OPAQUE,
            },
        );
    }
}

/// Asks the server for the closest colour it has. Returns the pixel and the
/// colour actually granted.
fn alloc_colour(connection: &Connection, rgb: Rgb16) -> Option<(Pixel, Rgb16)> {
    let mut xcolor: xlib::XColor = unsafe { mem::zeroed() };
    xcolor.red = rgb.red;
    xcolor.green = rgb.green;
    xcolor.blue = rgb.blue;
    xcolor.flags = (xlib::DoRed | xlib::DoGreen | xlib::DoBlue) as c_char;
    let status = unsafe { xlib::XAllocColor(connection.display(), connection.colormap(), &mut xcolor) };
    if status == 0 {
        warn!("XAllocColor refused {:?}", rgb);
        return None;
    }
    let granted = Rgb16::new(xcolor.red, xcolor.green, xcolor.blue);
    Some((xcolor.pixel as Pixel, granted))
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn to_xpoint(p: Point) -> xlib::XPoint {
    xlib::XPoint {
        x: clamp_i16(p.x),
        y: clamp_i16(p.y),
    }
}

fn to_xrect(rect: PixelRect) -> xlib::XRectangle {
    xlib::XRectangle {
        x: clamp_i16(rect.x),
        y: clamp_i16(rect.y),
        width: rect.width.clamp(0, i32::from(u16::MAX)) as u16,
        height: rect.height.clamp(0, i32::from(u16::MAX)) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_clamp_points_into_protocol_range() {
        let p = to_xpoint(Point::new(40_000, -40_000));
        assert_eq!((p.x, p.y), (i16::MAX, i16::MIN));
    }

    #[test]
    fn it_should_never_produce_negative_clip_sizes() {
        let r = to_xrect(PixelRect::new(3, 4, -5, 10));
        assert_eq!((r.x, r.y, r.width, r.height), (3, 4, 0, 10));
    }
}
