//! Two-circle intersection on the floor plane

use crate::core::Point;

/// Distance circle around a beacon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// Intersection points of two circles.
///
/// Returns no points when the circles are too far apart, when one lies
/// inside the other without touching, or when they coincide. Tangent circles
/// give a single point. Radii large enough to overflow the construction
/// yield no points rather than non-finite ones.
pub fn intersect(c1: &Circle, c2: &Circle) -> Vec<Point> {
    let p1 = c1.center.to_vector();
    let p2 = c2.center.to_vector();
    let (r1, r2) = (c1.radius, c2.radius);

    let delta = p2 - p1;
    let d = delta.norm();

    if d > r1 + r2 || d < (r1 - r2).abs() {
        return Vec::new();
    }
    if d == 0.0 && r1 == r2 {
        return Vec::new();
    }

    // Distance from c1 to the chord midpoint along the center line
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    // Half chord length; rounding can push the radicand just below zero at tangency
    let h = (r1 * r1 - a * a).max(0.0).sqrt();

    let mid = p1 + delta * (a / d);
    let mut points = if h == 0.0 {
        vec![Point::from_vector(mid)]
    } else {
        let offset_x = h * delta.y / d;
        let offset_y = h * delta.x / d;
        vec![
            Point::new(mid.x + offset_x, mid.y - offset_y),
            Point::new(mid.x - offset_x, mid.y + offset_y),
        ]
    };

    points.retain(Point::is_finite);
    points
}
