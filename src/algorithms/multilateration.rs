//! 2-D multilateration from beacon distances
//!
//! Every usable beacon contributes a circle (known position, modeled
//! distance). Each unordered pair of circles is intersected and the position
//! estimate is the centroid of the collected intersection points.

use crate::algorithms::circles::{intersect, Circle};
use crate::core::{BeaconId, DistanceSet, Point, MIN_BEACONS};
use crate::validation::{PositioningError, PositioningResult};
use log::{debug, trace};
use nalgebra::Vector2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Known floor-plan position of every installed beacon
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeaconRegistry {
    positions: HashMap<BeaconId, Point>,
}

impl BeaconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, beacon_id: &str) -> Option<Point> {
        self.positions.get(beacon_id).copied()
    }

    /// Insert or overwrite a beacon position
    pub fn insert(&mut self, beacon_id: impl Into<BeaconId>, position: Point) -> Option<Point> {
        self.positions.insert(beacon_id.into(), position)
    }

    pub fn remove(&mut self, beacon_id: &str) -> Option<Point> {
        self.positions.remove(beacon_id)
    }

    pub fn contains(&self, beacon_id: &str) -> bool {
        self.positions.contains_key(beacon_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BeaconId, &Point)> + '_ {
        self.positions.iter()
    }

    pub fn to_map(&self) -> HashMap<BeaconId, Point> {
        self.positions.clone()
    }
}

impl<I: Into<BeaconId>> FromIterator<(I, Point)> for BeaconRegistry {
    fn from_iter<T: IntoIterator<Item = (I, Point)>>(iter: T) -> Self {
        let mut registry = BeaconRegistry::new();
        for (id, position) in iter {
            registry.insert(id, position);
        }
        registry
    }
}

/// Which pairwise intersection points feed the centroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntersectionPolicy {
    /// Every intersection point of every pair, unweighted
    #[default]
    AllPoints,
    /// Per pair, only the point that best agrees with the remaining circles.
    /// Changes numeric output relative to `AllPoints`.
    ConsistentPoints,
}

/// Position solver owning the beacon layout.
///
/// The registry is read-mostly shared state: solves take an immutable
/// snapshot and writers swap in a modified copy, so a solve never sees a
/// half-applied update.
#[derive(Debug)]
pub struct PositionSolver {
    registry: RwLock<Arc<BeaconRegistry>>,
    policy: IntersectionPolicy,
}

impl Default for PositionSolver {
    fn default() -> Self {
        Self::new(BeaconRegistry::new())
    }
}

impl PositionSolver {
    pub fn new(registry: BeaconRegistry) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            policy: IntersectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IntersectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> IntersectionPolicy {
        self.policy
    }

    /// Known position of a beacon
    pub fn get(&self, beacon_id: &str) -> Option<Point> {
        self.registry.read().get(beacon_id)
    }

    /// Insert or overwrite a beacon position (e.g. field recalibration)
    pub fn set(&self, beacon_id: impl Into<BeaconId>, position: Point) {
        let mut guard = self.registry.write();
        Arc::make_mut(&mut guard).insert(beacon_id, position);
    }

    pub fn remove(&self, beacon_id: &str) -> Option<Point> {
        let mut guard = self.registry.write();
        Arc::make_mut(&mut guard).remove(beacon_id)
    }

    /// Swap in a whole new layout at once
    pub fn replace_registry(&self, registry: BeaconRegistry) {
        *self.registry.write() = Arc::new(registry);
    }

    /// Owned copy of every beacon position; editing it never touches the solver
    pub fn all_positions(&self) -> HashMap<BeaconId, Point> {
        self.registry.read().to_map()
    }

    /// Immutable view of the layout as of now
    pub fn snapshot(&self) -> Arc<BeaconRegistry> {
        self.registry.read().clone()
    }

    /// Estimate the receiver position from the latest distance per beacon.
    ///
    /// Beacons missing from the registry, and distances that are negative or
    /// not finite, are dropped silently before counting.
    pub fn solve(&self, distances: &DistanceSet) -> PositioningResult<Point> {
        let registry = self.snapshot();
        let circles = usable_circles(&registry, distances);

        if circles.len() < MIN_BEACONS {
            return Err(PositioningError::InsufficientBeacons {
                available: circles.len(),
                required: MIN_BEACONS,
            });
        }

        let pairs_checked = circles.len() * (circles.len() - 1) / 2;
        let points = pairwise_intersections(&circles, self.policy);
        if points.is_empty() {
            return Err(PositioningError::NoIntersection { pairs_checked });
        }

        let position = centroid(&points);
        if !position.is_finite() {
            debug!("Centroid of {} points overflowed", points.len());
            return Err(PositioningError::NoIntersection { pairs_checked });
        }
        Ok(position)
    }
}

/// Circles for beacons that are both registered and carry a sane distance,
/// ordered by identity so the result does not depend on map iteration order.
fn usable_circles(registry: &BeaconRegistry, distances: &DistanceSet) -> Vec<Circle> {
    let mut usable: Vec<(&BeaconId, Circle)> = distances
        .iter()
        .filter_map(|(id, distance_m)| {
            if !distance_m.is_finite() || distance_m < 0.0 {
                debug!("Dropping beacon {} with unusable distance {}", id, distance_m);
                return None;
            }
            match registry.get(id.as_str()) {
                Some(center) => Some((id, Circle::new(center, distance_m))),
                None => {
                    debug!("Ignoring beacon {} not present in the layout", id);
                    None
                }
            }
        })
        .collect();

    usable.sort_by(|a, b| a.0.cmp(b.0));
    usable.into_iter().map(|(_, circle)| circle).collect()
}

fn pairwise_intersections(circles: &[Circle], policy: IntersectionPolicy) -> Vec<Point> {
    let mut points = Vec::new();

    for i in 0..circles.len() {
        for j in (i + 1)..circles.len() {
            let pair_points = intersect(&circles[i], &circles[j]);
            trace!("Pair ({}, {}) intersects at {} point(s)", i, j, pair_points.len());

            if pair_points.is_empty() {
                debug!(
                    "Circles around {:?} and {:?} do not intersect",
                    circles[i].center, circles[j].center
                );
                continue;
            }

            match policy {
                IntersectionPolicy::AllPoints => points.extend(pair_points),
                IntersectionPolicy::ConsistentPoints => {
                    let others: Vec<&Circle> = circles
                        .iter()
                        .enumerate()
                        .filter(|(k, _)| *k != i && *k != j)
                        .map(|(_, c)| c)
                        .collect();
                    if let Some(best) = most_consistent(&pair_points, &others) {
                        points.push(best);
                    }
                }
            }
        }
    }

    points
}

/// Candidate with the smallest squared range residual against `others`;
/// ties keep the earlier candidate.
fn most_consistent(candidates: &[Point], others: &[&Circle]) -> Option<Point> {
    let residual = |p: &Point| -> f64 {
        others
            .iter()
            .map(|c| {
                let e = p.distance_to(&c.center) - c.radius;
                e * e
            })
            .sum()
    };

    let mut best: Option<(Point, f64)> = None;
    for candidate in candidates {
        let score = residual(candidate);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((*candidate, score)),
        }
    }
    best.map(|(p, _)| p)
}

fn centroid(points: &[Point]) -> Point {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.to_vector());
    Point::from_vector(sum / points.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const B1: &str = "58:06:24:08:02:f5";
    const B2: &str = "58:06:24:08:02:f6";
    const B3: &str = "58:06:24:08:02:f7";

    fn triangle_registry() -> BeaconRegistry {
        vec![
            (B1, Point::new(0.0, 0.0)),
            (B2, Point::new(10.0, 0.0)),
            (B3, Point::new(5.0, 8.0)),
        ]
        .into_iter()
        .collect()
    }

    fn exact_distances(registry: &BeaconRegistry, truth: Point) -> DistanceSet {
        registry
            .iter()
            .map(|(id, p)| (id.clone(), p.distance_to(&truth)))
            .collect()
    }

    #[test]
    fn test_noise_free_fix_with_consistent_points() {
        let registry = triangle_registry();
        let distances = exact_distances(&registry, Point::new(5.0, 3.0));
        let solver = PositionSolver::new(registry).with_policy(IntersectionPolicy::ConsistentPoints);

        let p = solver.solve(&distances).unwrap();
        assert!((p.x - 5.0).abs() < 1e-6, "x = {}", p.x);
        assert!((p.y - 3.0).abs() < 1e-6, "y = {}", p.y);
    }

    #[test]
    fn test_noise_free_fix_with_all_points() {
        // Pairs contribute (5,3) plus the mirror images (5,-3),
        // (45/89, 517/89) and (845/89, 517/89), so the centroid lands below
        // the true point.
        let registry = triangle_registry();
        let distances = exact_distances(&registry, Point::new(5.0, 3.0));
        let solver = PositionSolver::new(registry);
        assert_eq!(solver.policy(), IntersectionPolicy::AllPoints);

        let p = solver.solve(&distances).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9, "x = {}", p.x);
        assert!((p.y - 784.0 / 267.0).abs() < 1e-9, "y = {}", p.y);
    }

    #[test]
    fn test_two_beacons_is_insufficient() {
        let solver = PositionSolver::new(triangle_registry());
        let distances: DistanceSet = vec![(B1, 5.0), (B2, 5.0)].into_iter().collect();
        assert_eq!(
            solver.solve(&distances),
            Err(PositioningError::InsufficientBeacons { available: 2, required: 3 })
        );
    }

    #[test]
    fn test_unknown_beacons_do_not_count() {
        let solver = PositionSolver::new(triangle_registry());
        let distances: DistanceSet = vec![(B1, 5.0), (B2, 5.0), ("aa:bb:cc:dd:ee:ff", 3.0)]
            .into_iter()
            .collect();
        assert_eq!(
            solver.solve(&distances),
            Err(PositioningError::InsufficientBeacons { available: 2, required: 3 })
        );
    }

    #[test]
    fn test_unusable_distances_are_dropped() {
        let solver = PositionSolver::new(triangle_registry());
        let distances: DistanceSet = vec![(B1, 5.0), (B2, f64::NAN), (B3, -1.0)].into_iter().collect();
        assert_eq!(
            solver.solve(&distances),
            Err(PositioningError::InsufficientBeacons { available: 1, required: 3 })
        );
    }

    #[test]
    fn test_no_pair_intersects() {
        let registry: BeaconRegistry = vec![
            ("a", Point::new(0.0, 0.0)),
            ("b", Point::new(10.0, 0.0)),
            ("c", Point::new(0.0, 10.0)),
        ]
        .into_iter()
        .collect();
        let solver = PositionSolver::new(registry);
        let distances: DistanceSet = vec![("a", 1.0), ("b", 1.0), ("c", 1.0)].into_iter().collect();
        assert_eq!(
            solver.solve(&distances),
            Err(PositioningError::NoIntersection { pairs_checked: 3 })
        );
    }

    #[test]
    fn test_overflowing_radii_are_no_intersection() {
        let solver = PositionSolver::new(triangle_registry());
        let huge: DistanceSet = vec![(B1, 1e160), (B2, 1e160), (B3, 1e160)].into_iter().collect();
        assert_eq!(
            solver.solve(&huge),
            Err(PositioningError::NoIntersection { pairs_checked: 3 })
        );

        let saturated: DistanceSet = vec![(B1, f64::MAX), (B2, f64::MAX), (B3, f64::MAX)]
            .into_iter()
            .collect();
        assert_eq!(
            solver.solve(&saturated),
            Err(PositioningError::NoIntersection { pairs_checked: 3 })
        );
    }

    #[test]
    fn test_single_intersecting_pair_is_enough() {
        // Only a-b intersect; c is far from both
        let registry: BeaconRegistry = vec![
            ("a", Point::new(0.0, 0.0)),
            ("b", Point::new(8.0, 0.0)),
            ("c", Point::new(100.0, 100.0)),
        ]
        .into_iter()
        .collect();
        let solver = PositionSolver::new(registry);
        let distances: DistanceSet = vec![("a", 5.0), ("b", 5.0), ("c", 1.0)].into_iter().collect();

        let p = solver.solve(&distances).unwrap();
        assert!((p.x - 4.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let registry = triangle_registry();
        let distances: DistanceSet = vec![(B1, 6.1), (B2, 5.4), (B3, 4.7)].into_iter().collect();
        let solver = PositionSolver::new(registry);

        let first = solver.solve(&distances).unwrap();
        let second = solver.solve(&distances).unwrap();
        assert_eq!(first.x.to_bits(), second.x.to_bits());
        assert_eq!(first.y.to_bits(), second.y.to_bits());
    }

    #[test]
    fn test_unknown_beacons_do_not_change_result() {
        let solver = PositionSolver::new(triangle_registry());
        let without: DistanceSet = vec![(B1, 6.1), (B2, 5.4), (B3, 4.7)].into_iter().collect();
        let mut with = without.clone();
        with.insert("11:22:33:44:55:66", 2.0);
        with.insert("77:88:99:aa:bb:cc", 0.3);

        let a = solver.solve(&without).unwrap();
        let b = solver.solve(&with).unwrap();
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
    }

    #[test]
    fn test_registry_round_trip_and_snapshot_isolation() {
        let solver = PositionSolver::new(triangle_registry());
        let moved = Point::new(12.25, -3.5);
        solver.set(B3, moved);
        assert_eq!(solver.get(B3), Some(moved));

        solver.set("new-beacon", Point::new(1.0, 1.0));
        assert_eq!(solver.get("new-beacon"), Some(Point::new(1.0, 1.0)));
        assert_eq!(solver.get("missing"), None);

        let mut copy = solver.all_positions();
        assert_eq!(copy.len(), 4);
        copy.insert(BeaconId::from(B1), Point::new(99.0, 99.0));
        copy.remove(B2);
        assert_eq!(solver.get(B1), Some(Point::new(0.0, 0.0)));
        assert_eq!(solver.get(B2), Some(Point::new(10.0, 0.0)));

        assert_eq!(solver.remove("new-beacon"), Some(Point::new(1.0, 1.0)));
        assert_eq!(solver.snapshot().len(), 3);
    }

    #[test]
    fn test_snapshot_survives_later_updates() {
        let solver = PositionSolver::new(triangle_registry());
        let before = solver.snapshot();
        solver.set(B1, Point::new(-1.0, -1.0));
        assert_eq!(before.get(B1), Some(Point::new(0.0, 0.0)));
        assert_eq!(solver.get(B1), Some(Point::new(-1.0, -1.0)));
    }

    #[test]
    fn test_concurrent_solves_see_whole_layouts() {
        let base = triangle_registry();
        let shifted: BeaconRegistry = base
            .iter()
            .map(|(id, p)| (id.clone(), Point::new(p.x + 100.0, p.y)))
            .collect();
        let distances = exact_distances(&base, Point::new(5.0, 3.0));

        let solver = Arc::new(PositionSolver::new(base.clone()));
        let expected = solver.solve(&distances).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let solver = Arc::clone(&solver);
                let distances = distances.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let p = solver.solve(&distances).unwrap();
                        let dx = (p.x - expected.x).abs().min((p.x - expected.x - 100.0).abs());
                        assert!(dx < 1e-6, "torn layout produced x = {}", p.x);
                        assert!((p.y - expected.y).abs() < 1e-6);
                    }
                })
            })
            .collect();

        for i in 0..200 {
            if i % 2 == 0 {
                solver.replace_registry(shifted.clone());
            } else {
                solver.replace_registry(base.clone());
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_concurrent_solves_with_incremental_updates() {
        let base = triangle_registry();
        let distances = exact_distances(&base, Point::new(5.0, 3.0));
        let moved_b1 = Point::new(-0.5, 0.0);

        let mut moved = base.clone();
        moved.insert(B1, moved_b1);
        let expected = PositionSolver::new(base.clone()).solve(&distances).unwrap();
        let expected_moved = PositionSolver::new(moved).solve(&distances).unwrap();

        let solver = Arc::new(PositionSolver::new(base));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let solver = Arc::clone(&solver);
                let distances = distances.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        match solver.solve(&distances) {
                            Ok(p) => {
                                let close = |q: Point| (p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9;
                                assert!(close(expected) || close(expected_moved), "partial layout produced {:?}", p);
                            }
                            // B3 is briefly absent
                            Err(e) => assert_eq!(
                                e,
                                PositioningError::InsufficientBeacons { available: 2, required: 3 }
                            ),
                        }
                    }
                })
            })
            .collect();

        let mover = {
            let solver = Arc::clone(&solver);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    solver.set(B1, moved_b1);
                    solver.set(B1, Point::new(0.0, 0.0));
                }
            })
        };
        let remover = {
            let solver = Arc::clone(&solver);
            std::thread::spawn(move || {
                for i in 0..200 {
                    solver.set("spare", Point::new(i as f64, 1.0));
                    solver.remove("spare");
                    if let Some(p) = solver.remove(B3) {
                        solver.set(B3, p);
                    }
                }
            })
        };

        mover.join().unwrap();
        remover.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(solver.get(B1), Some(Point::new(0.0, 0.0)));
        assert_eq!(solver.get(B3), Some(Point::new(5.0, 8.0)));
        assert_eq!(solver.get("spare"), None);
        assert_eq!(solver.snapshot().len(), 3);
    }
}
