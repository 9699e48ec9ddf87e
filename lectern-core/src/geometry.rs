//! Plain geometry shared by the wire protocol and the page model.
//!
//! Pointer samples travel as `f32` triples, while page-level geometry
//! (view rectangles, text positions, highlight boxes) uses `f64`.

use serde::{Deserialize, Serialize};

/// A sampled pointer position with pen pressure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PenPoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

impl PenPoint {
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure }
    }

    /// Euclidean distance to another sample, ignoring pressure.
    pub fn distance(&self, other: &PenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_point(&self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

/// 2D position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full page in normalized coordinates.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Rectangle spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive containment test, so degenerate rectangles still hit.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.max_x()
            && other.x <= self.max_x()
            && self.y <= other.max_y()
            && other.y <= self.max_y()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.max_x().max(other.max_x()) - x,
            self.max_y().max(other.max_y()) - y,
        )
    }

    /// Grow by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Bounding box of a sequence of pointer samples.
pub fn bounds_of(points: &[PenPoint]) -> Option<Rect> {
    let first = points.first()?.to_point();
    let initial = Rect::new(first.x, first.y, 0.0, 0.0);
    Some(points[1..].iter().fold(initial, |acc, p| {
        let p = p.to_point();
        acc.union(&Rect::new(p.x, p.y, 0.0, 0.0))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(10.0, 20.0), Point::new(2.0, 4.0));
        assert_eq!(r, Rect::new(2.0, 4.0, 8.0, 16.0));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let r = Rect::new(0.0, 0.0, 0.0, 0.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(0.1, 0.0)));
    }

    #[test]
    fn test_intersects_and_union() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(1.0, 1.0, 2.0, 2.0);
        let c = Rect::new(5.0, 5.0, 1.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c), Rect::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_bounds_of_points() {
        assert!(bounds_of(&[]).is_none());
        let points = [
            PenPoint::new(1.0, 5.0, 1.0),
            PenPoint::new(3.0, 2.0, 1.0),
            PenPoint::new(2.0, 7.0, 1.0),
        ];
        assert_eq!(bounds_of(&points), Some(Rect::new(1.0, 2.0, 2.0, 5.0)));
    }

    #[test]
    fn test_pen_point_distance() {
        let a = PenPoint::new(0.0, 0.0, 0.5);
        let b = PenPoint::new(3.0, 4.0, 1.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
