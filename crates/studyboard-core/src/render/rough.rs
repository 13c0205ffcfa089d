//! Hand-drawn stroke jitter.

use kurbo::{BezPath, PathEl, Point, Vec2};

/// Simple seeded random number generator (xorshift32).
/// Used for deterministic hand-drawn effects.
pub(crate) struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub(crate) fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Random float in range [-1, 1]
    fn next_f64(&mut self) -> f64 {
        (f64::from(self.next_u32()) / f64::from(u32::MAX)) * 2.0 - 1.0
    }

    /// Random offset scaled by amount
    pub(crate) fn offset(&mut self, amount: f64) -> f64 {
        self.next_f64() * amount
    }

    fn jitter(&mut self, p: Point, amount: f64) -> Point {
        Point::new(p.x + self.offset(amount), p.y + self.offset(amount))
    }
}

/// Perturb a path so it looks sketched by hand.
///
/// Endpoints are offset (lines overshoot at corners) and straight segments
/// bow slightly. `pass` selects an independent random sequence so two passes
/// over the same path differ. The result depends only on the inputs, so a
/// shape keeps the same wobble across frames.
///
/// roughness: 0 = clean, 1 = slight wobble, 2 = very sketchy
pub fn apply_hand_drawn_effect(
    path: &BezPath,
    roughness: f64,
    zoom: f64,
    seed: u32,
    pass: u32,
) -> BezPath {
    if roughness <= 0.0 {
        return path.clone();
    }

    // Keep the wobble a similar on-screen size at every zoom level.
    let scale = 1.0 / zoom.max(f64::EPSILON).sqrt();
    let max_offset = roughness * 2.0 * scale;
    let bowing = roughness;

    let mut rng = SimpleRng::new(seed.wrapping_add(pass.wrapping_mul(99991)));

    let mut result = BezPath::new();
    let mut last = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                result.move_to(rng.jitter(p, max_offset));
                last = p;
            }
            PathEl::LineTo(p) => {
                let d = p - last;
                let len = d.hypot();
                let bow = rng.offset(bowing * roughness * len / 200.0) * scale;
                let perp = if len > 0.001 {
                    Vec2::new(-d.y / len, d.x / len)
                } else {
                    Vec2::ZERO
                };
                let mid = last.midpoint(p) + perp * bow;
                result.quad_to(mid, rng.jitter(p, max_offset));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                let c = rng.jitter(p1, max_offset * 0.7);
                result.quad_to(c, rng.jitter(p2, max_offset));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                let c1 = rng.jitter(p1, max_offset * 0.5);
                let c2 = rng.jitter(p2, max_offset * 0.5);
                result.curve_to(c1, c2, rng.jitter(p3, max_offset));
                last = p3;
            }
            PathEl::ClosePath => result.close_path(),
        }
    }

    result
}
