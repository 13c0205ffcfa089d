//! Geometry helpers shared by hit-testing, bounds and layout.
//!
//! Every function here is total over finite inputs.

use kurbo::{Point, Rect, Vec2};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Shortest distance from `p` to the segment `a`–`b`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond either
/// end measure to that endpoint. A zero-length segment degrades to
/// `distance(p, a)`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let seg: Vec2 = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return distance(p, a);
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    distance(p, a + seg * t)
}

/// Minimum distance from `p` to a polyline.
///
/// A single point measures directly to that point; an empty polyline is
/// infinitely far away.
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => distance(p, *only),
        _ => points
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Inclusive containment test against a normalized rectangle.
pub fn is_point_in_rectangle(x: f64, y: f64, rx: f64, ry: f64, rw: f64, rh: f64) -> bool {
    x >= rx && x <= rx + rw && y >= ry && y <= ry + rh
}

/// Build a rectangle with non-negative extents from a possibly flipped
/// origin/size pair.
pub fn normalize_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height).abs()
}

/// Strict axis-aligned overlap. Rectangles that only share an edge do not
/// overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Axis-aligned bounds of a point set. Empty input yields a zero box at the
/// origin.
pub fn points_bounds(points: impl IntoIterator<Item = Point>) -> Rect {
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(first, first), |acc, p| acc.union_pt(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert!((distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_segment_matches_point_distance() {
        let a = Point::new(7.0, -2.0);
        for p in [Point::new(0.0, 0.0), Point::new(7.0, -2.0), Point::new(-30.5, 12.25)] {
            assert!((distance_to_segment(p, a, a) - distance(p, a)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_segment_projection_is_clamped() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // Beyond the end: measures to the endpoint, not the infinite line.
        assert!((distance_to_segment(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(-3.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(5.0, 2.0), a, b) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_polyline_distance() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        assert!((distance_to_polyline(Point::new(12.0, 5.0), &pts) - 2.0).abs() < 1e-12);
        assert!((distance_to_polyline(Point::new(3.0, 4.0), &pts[..1]) - 5.0).abs() < 1e-12);
        assert!(distance_to_polyline(Point::ZERO, &[]).is_infinite());
    }

    #[test]
    fn test_point_in_rectangle_center_and_outside_edges() {
        let (rx, ry, rw, rh) = (10.0, 20.0, 40.0, 30.0);
        assert!(is_point_in_rectangle(30.0, 35.0, rx, ry, rw, rh));
        // One unit outside each edge midpoint.
        assert!(!is_point_in_rectangle(9.0, 35.0, rx, ry, rw, rh));
        assert!(!is_point_in_rectangle(51.0, 35.0, rx, ry, rw, rh));
        assert!(!is_point_in_rectangle(30.0, 19.0, rx, ry, rw, rh));
        assert!(!is_point_in_rectangle(30.0, 51.0, rx, ry, rw, rh));
    }

    #[test]
    fn test_normalize_rect() {
        let r = normalize_rect(100.0, 100.0, -50.0, -30.0);
        assert_eq!(r, Rect::new(50.0, 70.0, 100.0, 100.0));
        assert!((r.width() - 50.0).abs() < f64::EPSILON);
        assert!((r.height() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rects_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 200.0, 150.0);
        assert!(rects_overlap(a, Rect::new(199.0, 0.0, 400.0, 150.0)));
        assert!(!rects_overlap(a, Rect::new(200.0, 0.0, 400.0, 150.0)));
        assert!(!rects_overlap(a, Rect::new(0.0, 150.0, 200.0, 300.0)));
    }

    #[test]
    fn test_points_bounds() {
        assert_eq!(points_bounds(Vec::new()), Rect::ZERO);
        let r = points_bounds([Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(-3.0, 8.0)]);
        assert_eq!(r, Rect::new(-3.0, 0.0, 10.0, 8.0));
    }
}
