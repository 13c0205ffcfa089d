//! Fill pattern geometry: hachure lines, cross-hatch, zigzag and dots,
//! clipped to a shape's outline.

use kurbo::{BezPath, PathEl, Point};

/// Flatten tolerance used when turning outlines into polygons.
const FLATTEN_TOLERANCE: f64 = 0.5;

/// Closed polygons approximating a path's subpaths. Open subpaths are
/// closed implicitly; subpaths with fewer than three vertices are dropped.
pub fn outline_polygons(path: &BezPath) -> Vec<Vec<Point>> {
    let mut polygons = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            if current.len() >= 3 {
                polygons.push(std::mem::take(&mut current));
            }
            current.clear();
            current.push(p);
        }
        PathEl::LineTo(p) => current.push(p),
        PathEl::ClosePath => {
            if current.len() >= 3 {
                polygons.push(std::mem::take(&mut current));
            }
            current.clear();
        }
        // flatten only emits lines
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    if current.len() >= 3 {
        polygons.push(current);
    }
    polygons
}

/// Even-odd point-in-polygon test across all polygons.
pub fn point_in_polygons(p: Point, polygons: &[Vec<Point>]) -> bool {
    let mut inside = false;
    for poly in polygons {
        let n = poly.len();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

/// Parallel fill segments at `angle_deg` spaced `gap` apart, clipped to the
/// polygons (even-odd). Segments come back ordered scanline by scanline.
pub fn hachure_segments(polygons: &[Vec<Point>], angle_deg: f64, gap: f64) -> Vec<(Point, Point)> {
    if gap <= 0.0 || polygons.is_empty() {
        return Vec::new();
    }
    // Rotate so hatch lines are horizontal, scan, then rotate back.
    let angle = angle_deg.to_radians();
    let (sin, cos) = angle.sin_cos();
    let to_local = |p: Point| Point::new(p.x * cos + p.y * sin, -p.x * sin + p.y * cos);
    let to_world = |p: Point| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);

    let local: Vec<Vec<Point>> = polygons
        .iter()
        .map(|poly| poly.iter().copied().map(to_local).collect())
        .collect();

    let (min_y, max_y) = local
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

    let mut segments = Vec::new();
    let mut y = min_y + gap / 2.0;
    while y < max_y {
        let mut xs: Vec<f64> = Vec::new();
        for poly in &local {
            let n = poly.len();
            for i in 0..n {
                let a = poly[i];
                let b = poly[(i + 1) % n];
                if (a.y > y) != (b.y > y) {
                    xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            segments.push((to_world(Point::new(pair[0], y)), to_world(Point::new(pair[1], y))));
        }
        y += gap;
    }
    segments
}

/// Path of independent hatch segments.
pub fn segments_path(segments: &[(Point, Point)]) -> BezPath {
    let mut path = BezPath::new();
    for (a, b) in segments {
        path.move_to(*a);
        path.line_to(*b);
    }
    path
}

/// Join consecutive hatch segments into one back-and-forth polyline.
pub fn zigzag_path(segments: &[(Point, Point)]) -> BezPath {
    let mut path = BezPath::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        let (from, to) = if i % 2 == 0 { (*a, *b) } else { (*b, *a) };
        if i == 0 {
            path.move_to(from);
        } else {
            path.line_to(from);
        }
        path.line_to(to);
    }
    path
}

/// Centers of a dot grid spaced `gap` apart that fall inside the polygons.
pub fn dot_centers(polygons: &[Vec<Point>], gap: f64) -> Vec<Point> {
    if gap <= 0.0 {
        return Vec::new();
    }
    let Some(bounds) = polygons
        .iter()
        .flatten()
        .map(|p| kurbo::Rect::from_points(*p, *p))
        .reduce(|acc, r| acc.union(r))
    else {
        return Vec::new();
    };

    let mut centers = Vec::new();
    let mut y = bounds.y0 + gap / 2.0;
    while y < bounds.y1 {
        let mut x = bounds.x0 + gap / 2.0;
        while x < bounds.x1 {
            let p = Point::new(x, y);
            if point_in_polygons(p, polygons) {
                centers.push(p);
            }
            x += gap;
        }
        y += gap;
    }
    centers
}

/// Small filled circles at each center.
pub fn dots_path(centers: &[Point], radius: f64) -> BezPath {
    let mut path = BezPath::new();
    for c in centers {
        let circle = kurbo::Circle::new(*c, radius);
        path.extend(kurbo::Shape::path_elements(&circle, 0.1));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape as KurboShape};

    fn square(size: f64) -> Vec<Vec<Point>> {
        outline_polygons(&Rect::new(0.0, 0.0, size, size).to_path(0.1))
    }

    #[test]
    fn test_outline_polygons_of_rect() {
        let polys = square(10.0);
        assert_eq!(polys.len(), 1);
        assert!(polys[0].len() >= 4);
    }

    #[test]
    fn test_point_in_polygons() {
        let polys = square(10.0);
        assert!(point_in_polygons(Point::new(5.0, 5.0), &polys));
        assert!(!point_in_polygons(Point::new(15.0, 5.0), &polys));
    }

    #[test]
    fn test_hachure_segments_stay_inside() {
        let polys = square(100.0);
        let segments = hachure_segments(&polys, 45.0, 10.0);
        assert!(!segments.is_empty());
        for (a, b) in &segments {
            for p in [*a, *b] {
                assert!(p.x > -1e-6 && p.x < 100.0 + 1e-6);
                assert!(p.y > -1e-6 && p.y < 100.0 + 1e-6);
            }
            assert!(point_in_polygons(a.midpoint(*b), &polys));
        }
    }

    #[test]
    fn test_hachure_horizontal_count() {
        let polys = square(100.0);
        let segments = hachure_segments(&polys, 0.0, 10.0);
        assert_eq!(segments.len(), 10);
    }

    #[test]
    fn test_dot_centers_inside() {
        let polys = square(40.0);
        let centers = dot_centers(&polys, 10.0);
        assert_eq!(centers.len(), 16);
        assert!(centers.iter().all(|c| point_in_polygons(*c, &polys)));
    }

    #[test]
    fn test_zigzag_is_single_subpath() {
        let polys = square(50.0);
        let segments = hachure_segments(&polys, 45.0, 10.0);
        let path = zigzag_path(&segments);
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 1);
    }
}
