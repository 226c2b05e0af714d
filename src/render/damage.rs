// src/render/damage.rs

//! Bounding-box accumulation for one render session.

use crate::platform::backends::{PixelRect, Point, TextExtents};

/// Union of everything drawn since the last reset, as edge coordinates.
///
/// `right` and `bottom` are exclusive. The reset state is inverted
/// (`left = w, right = 0, top = h, bottom = 0`) so the first widening sets
/// every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRect {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl DamageRect {
    pub fn empty(width: i32, height: i32) -> Self {
        Self {
            left: width,
            right: 0,
            top: height,
            bottom: 0,
        }
    }

    /// Widens to cover `(x, y, w, h)`. Never shrinks.
    pub fn include(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x.saturating_add(w));
        self.bottom = self.bottom.max(y.saturating_add(h));
    }

    pub fn include_rect(&mut self, rect: PixelRect) {
        self.include(rect.x, rect.y, rect.width, rect.height);
    }

    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// The damaged area, or `None` when nothing was drawn.
    pub fn bounds(&self) -> Option<PixelRect> {
        if self.is_empty() {
            return None;
        }
        Some(PixelRect::new(
            self.left,
            self.top,
            self.right.saturating_sub(self.left),
            self.bottom.saturating_sub(self.top),
        ))
    }
}

/// Pixels touched by a line, endpoints included.
pub fn line_bounds(from: Point, to: Point) -> PixelRect {
    PixelRect::new(
        from.x.min(to.x),
        from.y.min(to.y),
        span(from.x, to.x),
        span(from.y, to.y),
    )
}

/// Pixels touched by a closed polygon through `points`.
pub fn polygon_bounds(points: &[Point]) -> Option<PixelRect> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(PixelRect::new(
        min_x,
        min_y,
        span(min_x, max_x),
        span(min_y, max_y),
    ))
}

/// Area covered by text drawn with its baseline origin at `origin`: the ink
/// box, widened to the advance width.
pub fn text_bounds(origin: Point, extents: &TextExtents) -> PixelRect {
    let left = origin.x.saturating_add(extents.lbearing).min(origin.x);
    let right = origin
        .x
        .saturating_add(extents.rbearing)
        .max(origin.x.saturating_add(extents.width));
    PixelRect::new(
        left,
        origin.y.saturating_sub(extents.ascent),
        right.saturating_sub(left),
        extents.ascent.saturating_add(extents.descent),
    )
}

/// Inclusive pixel count between two coordinates, saturating at `i32::MAX`.
fn span(a: i32, b: i32) -> i32 {
    b.saturating_sub(a).saturating_abs().saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state_is_empty() {
        let damage = DamageRect::empty(400, 300);
        assert!(damage.is_empty());
        assert_eq!(damage.bounds(), None);
    }

    #[test]
    fn union_of_rects() {
        let mut damage = DamageRect::empty(400, 400);
        damage.include(10, 10, 50, 50);
        damage.include(100, 5, 10, 10);
        assert_eq!(damage.bounds(), Some(PixelRect::new(10, 5, 100, 55)));
    }

    #[test]
    fn contained_or_repeated_rects_change_nothing() {
        let mut damage = DamageRect::empty(400, 400);
        damage.include(10, 10, 50, 50);
        let before = damage;
        damage.include(10, 10, 50, 50);
        damage.include(20, 20, 5, 5);
        assert_eq!(damage, before);
    }

    #[test]
    fn zero_sized_update_on_empty_damage_stays_empty() {
        let mut damage = DamageRect::empty(100, 100);
        damage.include(50, 50, 0, 0);
        assert!(damage.is_empty());
    }

    #[test]
    fn line_bounds_include_both_endpoints() {
        assert_eq!(
            line_bounds(Point::new(30, 5), Point::new(10, 25)),
            PixelRect::new(10, 5, 21, 21)
        );
        assert_eq!(
            line_bounds(Point::new(3, 3), Point::new(3, 3)),
            PixelRect::new(3, 3, 1, 1)
        );
    }

    #[test]
    fn polygon_bounds_cover_every_vertex() {
        let tri = [Point::new(5, 0), Point::new(10, 10), Point::new(0, 8)];
        assert_eq!(polygon_bounds(&tri), Some(PixelRect::new(0, 0, 11, 11)));
        assert_eq!(polygon_bounds(&[]), None);
    }

    #[test]
    fn updates_near_the_coordinate_limit_saturate() {
        let mut damage = DamageRect::empty(100, 100);
        damage.include(i32::MAX - 5, 0, 10, 10);
        assert_eq!(damage.right, i32::MAX);
        assert_eq!(damage.bottom, 10);

        let mut wide = DamageRect::empty(100, 100);
        wide.include(i32::MIN, i32::MIN, 1, 1);
        wide.include(i32::MAX - 1, i32::MAX - 1, 1, 1);
        let bounds = wide.bounds().unwrap();
        assert_eq!((bounds.width, bounds.height), (i32::MAX, i32::MAX));
    }

    #[test]
    fn extreme_line_and_polygon_bounds_saturate() {
        let far = [Point::new(i32::MIN, 0), Point::new(i32::MAX, 0)];
        assert_eq!(line_bounds(far[0], far[1]).width, i32::MAX);
        assert_eq!(polygon_bounds(&far).map(|r| r.width), Some(i32::MAX));
    }

    #[test]
    fn text_bounds_cover_ink_and_advance() {
        let extents = TextExtents {
            lbearing: -1,
            rbearing: 20,
            width: 22,
            ascent: 9,
            descent: 3,
        };
        assert_eq!(
            text_bounds(Point::new(100, 50), &extents),
            PixelRect::new(99, 41, 23, 12)
        );
    }
}
