//! Grid snapping.

use kurbo::Point;

/// Default grid spacing in world units.
pub const GRID_SIZE: f64 = 20.0;

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        let snapped = snap_to_grid(Point::new(15.0, 23.0), GRID_SIZE);
        assert!((snapped.x - 20.0).abs() < f64::EPSILON);
        assert!((snapped.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_negative() {
        let snapped = snap_to_grid(Point::new(-9.0, -11.0), GRID_SIZE);
        assert!(snapped.x.abs() < f64::EPSILON);
        assert!((snapped.y + 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_positive_grid_is_identity() {
        let p = Point::new(3.3, 4.4);
        assert_eq!(snap_to_grid(p, 0.0), p);
    }
}
