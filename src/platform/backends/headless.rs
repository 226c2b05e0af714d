// src/platform/backends/headless.rs

//! A `Driver` with no display behind it.
//!
//! Both the off-screen buffer and the "visible" surface are plain pixel
//! arrays, text is drawn as solid blocks with fixed metrics, timers run on a
//! virtual clock and events come from a scripted queue. Every blit is logged
//! so callers can check exactly what reached the screen.

use crate::color::Rgb16;
use crate::platform::backends::{Driver, Pixel, PixelRect, Point, TextExtents, TimerId, WindowSpec};
use crate::platform::PlatformEvent;
use anyhow::{anyhow, bail, Result};
use log::{debug, trace};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// Timer ticks delivered before the virtual clock gives up.
const DEFAULT_TICK_BUDGET: usize = 10_000;

/// A width × height array of pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: i32,
    height: i32,
    pixels: Vec<Pixel>,
}

impl Surface {
    pub fn new(width: i32, height: i32, fill: Pixel) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Pixel> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn set(&mut self, x: i32, y: i32, pixel: Pixel) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = pixel;
        }
    }
}

/// Fixed-metric stand-in for a platform font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessFont {
    pub face: String,
    pub size: i32,
    pub advance: i32,
    pub ascent: i32,
    pub descent: i32,
}

impl HeadlessFont {
    fn new(face: &str, size: i32) -> Self {
        Self {
            face: face.to_string(),
            size,
            advance: (size / 2).max(1),
            ascent: size - size / 4,
            descent: size / 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VirtualTimer {
    period: Duration,
    due: Duration,
}

/// Software implementation of [`Driver`].
pub struct HeadlessDriver {
    window: Option<WindowSpec>,
    destroyed: bool,
    buffer: Option<Surface>,
    visible: Surface,
    context_open: bool,
    contexts_begun: usize,
    clip: Option<PixelRect>,
    blits: Vec<PixelRect>,
    background: Rgb16,
    colour_capacity: Option<usize>,
    colours_granted: usize,
    missing_faces: Vec<String>,
    font_loads: Vec<(String, i32)>,
    status_text: String,
    events: VecDeque<PlatformEvent>,
    timers: BTreeMap<TimerId, VirtualTimer>,
    next_timer_id: u64,
    timer_registrations: usize,
    clock: Duration,
    tick_budget: usize,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self {
            window: None,
            destroyed: false,
            buffer: None,
            visible: Surface::new(0, 0, 0),
            context_open: false,
            contexts_begun: 0,
            clip: None,
            blits: Vec::new(),
            background: Rgb16::from_rgb8([0xdc, 0xda, 0xd5]),
            colour_capacity: None,
            colours_granted: 0,
            missing_faces: Vec::new(),
            font_loads: Vec::new(),
            status_text: String::new(),
            events: VecDeque::new(),
            timers: BTreeMap::new(),
            next_timer_id: 1,
            timer_registrations: 0,
            clock: Duration::ZERO,
            tick_budget: DEFAULT_TICK_BUDGET,
        }
    }

    /// Sets the colour reported by `default_background`.
    pub fn with_background(mut self, background: Rgb16) -> Self {
        self.background = background;
        self
    }

    /// Refuses every colour requested after the first `capacity` grants.
    pub fn with_colour_capacity(mut self, capacity: usize) -> Self {
        self.colour_capacity = Some(capacity);
        self
    }

    /// Makes `load_font` fail for this face.
    pub fn with_missing_face(mut self, face: &str) -> Self {
        self.missing_faces.push(face.to_string());
        self
    }

    /// Caps the number of timer ticks the virtual clock will deliver.
    pub fn with_tick_budget(mut self, ticks: usize) -> Self {
        self.tick_budget = ticks;
        self
    }

    /// The pixel value a colour packs to: `0x00RRGGBB` from the high bytes.
    pub fn pixel_for(rgb: Rgb16) -> Pixel {
        let [r, g, b] = rgb.to_rgb8();
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    pub fn push_event(&mut self, event: PlatformEvent) {
        self.events.push_back(event);
    }

    /// Removes and returns every queued event.
    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        self.events.drain(..).collect()
    }

    pub fn window(&self) -> Option<&WindowSpec> {
        self.window.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn buffer(&self) -> Option<&Surface> {
        self.buffer.as_ref()
    }

    pub fn visible(&self) -> &Surface {
        &self.visible
    }

    pub fn buffer_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        self.buffer.as_ref().and_then(|b| b.get(x, y))
    }

    pub fn visible_pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        self.visible.get(x, y)
    }

    /// Every rectangle passed to `blit`, oldest first.
    pub fn blits(&self) -> &[PixelRect] {
        &self.blits
    }

    pub fn clear_blits(&mut self) {
        self.blits.clear();
    }

    pub fn is_context_open(&self) -> bool {
        self.context_open
    }

    pub fn contexts_begun(&self) -> usize {
        self.contexts_begun
    }

    pub fn clip(&self) -> Option<PixelRect> {
        self.clip
    }

    pub fn font_loads(&self) -> &[(String, i32)] {
        &self.font_loads
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Total number of `add_timeout` calls that succeeded.
    pub fn timer_registrations(&self) -> usize {
        self.timer_registrations
    }

    /// Virtual time elapsed through timer ticks.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Region drawing may touch: the clip, cut to the buffer.
    fn drawable_area(&self) -> Option<PixelRect> {
        let buffer = self.buffer.as_ref()?;
        match self.clip {
            Some(clip) => clip.intersect(&buffer.bounds()),
            None => Some(buffer.bounds()),
        }
    }

    fn plot(&mut self, area: PixelRect, x: i32, y: i32, pixel: Pixel) {
        if !area.contains(x, y) {
            return;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.set(x, y, pixel);
        }
    }

    fn fill_span(&mut self, area: PixelRect, rect: PixelRect, pixel: Pixel) {
        let Some(target) = rect.intersect(&area) else {
            return;
        };
        if let Some(buffer) = self.buffer.as_mut() {
            for y in target.y..target.bottom() {
                for x in target.x..target.right() {
                    buffer.set(x, y, pixel);
                }
            }
        }
    }

    fn line(&mut self, area: PixelRect, from: Point, to: Point, pixel: Pixel) {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let (mut x, mut y) = (from.x, from.y);
        let mut err = dx + dy;
        loop {
            self.plot(area, x, y, pixel);
            if x == to.x && y == to.y {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Even-odd scanline fill sampled at pixel centres.
    fn fill_polygon(&mut self, area: PixelRect, points: &[Point], pixel: Pixel) {
        let Some(min_y) = points.iter().map(|p| p.y).min() else {
            return;
        };
        let max_y = points.iter().map(|p| p.y).max().unwrap_or(min_y);
        let mut crossings: Vec<f64> = Vec::new();
        for y in min_y..=max_y {
            let sample = f64::from(y) + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                let (ay, by) = (f64::from(a.y), f64::from(b.y));
                if (ay <= sample && by > sample) || (by <= sample && ay > sample) {
                    let t = (sample - ay) / (by - ay);
                    crossings.push(f64::from(a.x) + t * f64::from(b.x - a.x));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let start = (pair[0] - 0.5).ceil() as i32;
                let end = (pair[1] - 0.5).ceil() as i32;
                self.fill_span(area, PixelRect::new(start, y, end - start, 1), pixel);
            }
        }
    }
}

impl Driver for HeadlessDriver {
    type Font = HeadlessFont;

    fn create_window(&mut self, spec: &WindowSpec) -> Result<()> {
        if self.window.is_some() {
            bail!("window already created");
        }
        debug!(
            "Headless window '{}' {}x{} (statusbar: {}, {} menu items)",
            spec.title,
            spec.width,
            spec.height,
            spec.statusbar,
            spec.menu.len()
        );
        self.visible = Surface::new(spec.width, spec.height, Self::pixel_for(self.background));
        self.window = Some(spec.clone());
        self.destroyed = false;
        self.events.push_back(PlatformEvent::Configure {
            width: spec.width,
            height: spec.height,
        });
        self.events.push_back(PlatformEvent::Map);
        Ok(())
    }

    fn destroy_window(&mut self) {
        debug!("Headless window destroyed");
        self.window = None;
        self.destroyed = true;
        self.buffer = None;
        self.context_open = false;
        self.clip = None;
        self.events.clear();
        self.timers.clear();
    }

    fn resize_canvas(&mut self, width: i32, height: i32) -> Result<()> {
        let window = self
            .window
            .as_mut()
            .ok_or_else(|| anyhow!("resize_canvas called without a window"))?;
        window.width = width;
        window.height = height;
        self.events
            .push_back(PlatformEvent::Configure { width, height });
        Ok(())
    }

    fn set_status_text(&mut self, text: &str) {
        self.status_text = text.to_string();
    }

    fn queue_repaint(&mut self) {
        let area = self.visible.bounds();
        self.events.push_back(PlatformEvent::Expose { area });
    }

    fn alloc_colours(&mut self, colours: &[Rgb16]) -> Vec<Option<Pixel>> {
        colours
            .iter()
            .map(|rgb| {
                if self
                    .colour_capacity
                    .is_some_and(|cap| self.colours_granted >= cap)
                {
                    return None;
                }
                self.colours_granted += 1;
                Some(Self::pixel_for(*rgb))
            })
            .collect()
    }

    fn default_background(&self) -> Rgb16 {
        self.background
    }

    fn create_buffer(&mut self, width: i32, height: i32, fill: Pixel) -> Result<()> {
        if width <= 0 || height <= 0 {
            bail!("invalid buffer size {}x{}", width, height);
        }
        self.buffer = Some(Surface::new(width, height, fill));
        if self.visible.width() != width || self.visible.height() != height {
            self.visible = Surface::new(width, height, Self::pixel_for(self.background));
        }
        Ok(())
    }

    fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    fn begin_context(&mut self) -> Result<()> {
        if self.buffer.is_none() {
            bail!("no off-screen buffer to draw into");
        }
        if self.context_open {
            bail!("drawing context already open");
        }
        self.context_open = true;
        self.contexts_begun += 1;
        self.clip = None;
        Ok(())
    }

    fn end_context(&mut self) {
        self.context_open = false;
        self.clip = None;
    }

    fn set_clip(&mut self, rect: PixelRect) {
        self.clip = Some(rect);
    }

    fn fill_rect(&mut self, rect: PixelRect, pixel: Pixel) {
        if let Some(area) = self.drawable_area() {
            self.fill_span(area, rect, pixel);
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, pixel: Pixel) {
        if let Some(area) = self.drawable_area() {
            self.line(area, from, to, pixel);
        }
    }

    fn draw_polygon(&mut self, points: &[Point], filled: bool, pixel: Pixel) {
        let Some(area) = self.drawable_area() else {
            return;
        };
        if points.is_empty() {
            return;
        }
        if filled {
            self.fill_polygon(area, points, pixel);
        }
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.line(area, *a, b, pixel);
        }
    }

    fn load_font(&mut self, face: &str, size: i32) -> Result<Self::Font> {
        if size <= 0 {
            bail!("font size must be positive, got {}", size);
        }
        if self.missing_faces.iter().any(|f| f == face) {
            bail!("no such face '{}'", face);
        }
        self.font_loads.push((face.to_string(), size));
        Ok(HeadlessFont::new(face, size))
    }

    fn text_extents(&mut self, font: &Self::Font, text: &str) -> TextExtents {
        let width = font.advance * text.chars().count() as i32;
        TextExtents {
            lbearing: 0,
            rbearing: width,
            width,
            ascent: font.ascent,
            descent: font.descent,
        }
    }

    fn draw_text(&mut self, font: &Self::Font, origin: Point, text: &str, pixel: Pixel) {
        let Some(area) = self.drawable_area() else {
            return;
        };
        trace!("Headless text '{}' at ({}, {})", text, origin.x, origin.y);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let glyph = PixelRect::new(
                origin.x + i as i32 * font.advance,
                origin.y - font.ascent,
                (font.advance - 1).max(1),
                font.ascent,
            );
            self.fill_span(area, glyph, pixel);
        }
    }

    fn blit(&mut self, rect: PixelRect) {
        self.blits.push(rect);
        let Some(buffer) = self.buffer.as_ref() else {
            return;
        };
        let Some(target) = rect
            .intersect(&buffer.bounds())
            .and_then(|r| r.intersect(&self.visible.bounds()))
        else {
            return;
        };
        for y in target.y..target.bottom() {
            for x in target.x..target.right() {
                if let Some(p) = buffer.get(x, y) {
                    self.visible.set(x, y, p);
                }
            }
        }
    }

    fn add_timeout(&mut self, period: Duration) -> Result<TimerId> {
        if period.is_zero() {
            bail!("timer period must be non-zero");
        }
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        self.timers.insert(
            id,
            VirtualTimer {
                period,
                due: self.clock + period,
            },
        );
        self.timer_registrations += 1;
        Ok(id)
    }

    fn remove_timeout(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn next_event(&mut self) -> Result<Option<PlatformEvent>> {
        if let Some(event) = self.events.pop_front() {
            return Ok(Some(event));
        }
        if self.destroyed || self.tick_budget == 0 {
            return Ok(None);
        }
        let next = self
            .timers
            .iter()
            .min_by_key(|(id, t)| (t.due, **id))
            .map(|(id, _)| *id);
        let Some(id) = next else {
            return Ok(None);
        };
        if let Some(timer) = self.timers.get_mut(&id) {
            self.clock = timer.due;
            timer.due += timer.period;
        }
        self.tick_budget -= 1;
        Ok(Some(PlatformEvent::Timer(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_with_buffer(w: i32, h: i32) -> HeadlessDriver {
        let mut driver = HeadlessDriver::new();
        driver.create_buffer(w, h, 0).unwrap();
        driver
    }

    #[test_log::test]
    fn it_should_clip_fills_to_the_clip_rect() {
        let mut driver = driver_with_buffer(20, 20);
        driver.begin_context().unwrap();
        driver.set_clip(PixelRect::new(5, 5, 5, 5));
        driver.fill_rect(PixelRect::new(0, 0, 20, 20), 7);
        assert_eq!(driver.buffer_pixel(5, 5), Some(7));
        assert_eq!(driver.buffer_pixel(9, 9), Some(7));
        assert_eq!(driver.buffer_pixel(10, 10), Some(0));
        assert_eq!(driver.buffer_pixel(4, 5), Some(0));
    }

    #[test_log::test]
    fn it_should_drop_the_clip_with_the_context() {
        let mut driver = driver_with_buffer(10, 10);
        driver.begin_context().unwrap();
        driver.set_clip(PixelRect::new(0, 0, 1, 1));
        driver.end_context();
        assert_eq!(driver.clip(), None);
        driver.begin_context().unwrap();
        driver.fill_rect(PixelRect::new(0, 0, 10, 10), 3);
        assert_eq!(driver.buffer_pixel(9, 9), Some(3));
    }

    #[test_log::test]
    fn it_should_draw_lines_with_both_endpoints() {
        let mut driver = driver_with_buffer(10, 10);
        driver.draw_line(Point::new(1, 1), Point::new(6, 3), 9);
        assert_eq!(driver.buffer_pixel(1, 1), Some(9));
        assert_eq!(driver.buffer_pixel(6, 3), Some(9));
        assert_eq!(driver.buffer_pixel(7, 3), Some(0));
    }

    #[test_log::test]
    fn it_should_fill_polygon_interiors() {
        let mut driver = driver_with_buffer(10, 10);
        let square = [
            Point::new(2, 2),
            Point::new(7, 2),
            Point::new(7, 7),
            Point::new(2, 7),
        ];
        driver.draw_polygon(&square, true, 4);
        assert_eq!(driver.buffer_pixel(4, 4), Some(4));
        assert_eq!(driver.buffer_pixel(7, 7), Some(4));
        assert_eq!(driver.buffer_pixel(8, 8), Some(0));

        let mut outline = driver_with_buffer(10, 10);
        outline.draw_polygon(&square, false, 4);
        assert_eq!(outline.buffer_pixel(2, 5), Some(4));
        assert_eq!(outline.buffer_pixel(4, 4), Some(0));
    }

    #[test_log::test]
    fn it_should_copy_only_the_blitted_rect() {
        let mut driver = HeadlessDriver::new();
        driver.create_buffer(10, 10, 1).unwrap();
        let background = HeadlessDriver::pixel_for(driver.default_background());
        driver.blit(PixelRect::new(2, 2, 3, 3));
        assert_eq!(driver.visible_pixel(2, 2), Some(1));
        assert_eq!(driver.visible_pixel(4, 4), Some(1));
        assert_eq!(driver.visible_pixel(5, 5), Some(background));
        assert_eq!(driver.blits(), &[PixelRect::new(2, 2, 3, 3)]);
    }

    #[test_log::test]
    fn it_should_tick_timers_on_the_virtual_clock() {
        let mut driver = HeadlessDriver::new().with_tick_budget(3);
        let id = driver.add_timeout(Duration::from_millis(20)).unwrap();
        assert_eq!(driver.next_event().unwrap(), Some(PlatformEvent::Timer(id)));
        assert_eq!(driver.next_event().unwrap(), Some(PlatformEvent::Timer(id)));
        assert_eq!(driver.clock(), Duration::from_millis(40));
        driver.remove_timeout(id);
        assert_eq!(driver.next_event().unwrap(), None);
    }

    #[test_log::test]
    fn it_should_prefer_queued_events_over_timers() {
        let mut driver = HeadlessDriver::new();
        let id = driver.add_timeout(Duration::from_millis(20)).unwrap();
        driver.push_event(PlatformEvent::Map);
        assert_eq!(driver.next_event().unwrap(), Some(PlatformEvent::Map));
        assert_eq!(driver.next_event().unwrap(), Some(PlatformEvent::Timer(id)));
    }

    #[test_log::test]
    fn it_should_fail_font_loads_for_missing_faces() {
        let mut driver = HeadlessDriver::new().with_missing_face("variable");
        assert!(driver.load_font("variable", 12).is_err());
        assert!(driver.load_font("fixed", 12).is_ok());
        assert!(driver.load_font("fixed", 0).is_err());
    }
}
