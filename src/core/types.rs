//! Core data types for the positioning system

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a fixed beacon (typically its MAC address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeaconId(String);

impl BeaconId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BeaconId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BeaconId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for BeaconId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 2-D point on the floor plan, in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn from_vector(v: Vector2<f64>) -> Self {
        Self { x: v.x, y: v.y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One advertisement heard by the scanning collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconReading {
    pub beacon_id: BeaconId,
    /// Received signal strength (dBm); `None` when the radio did not report one
    #[serde(default)]
    pub signal_strength_dbm: Option<i32>,
    /// Arrival time (milliseconds, caller's clock)
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl BeaconReading {
    pub fn new(beacon_id: impl Into<BeaconId>, signal_strength_dbm: i32, timestamp_ms: u64) -> Self {
        Self {
            beacon_id: beacon_id.into(),
            signal_strength_dbm: Some(signal_strength_dbm),
            timestamp_ms,
        }
    }

    pub fn without_signal(beacon_id: impl Into<BeaconId>, timestamp_ms: u64) -> Self {
        Self {
            beacon_id: beacon_id.into(),
            signal_strength_dbm: None,
            timestamp_ms,
        }
    }
}

/// Modeled distance to a single beacon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceSample {
    pub beacon_id: BeaconId,
    pub distance_m: f64,
}

/// Latest modeled distance per beacon, keyed by identity.
///
/// Inserting for a beacon that already has an entry replaces it; no history
/// is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceSet {
    distances: HashMap<BeaconId, f64>,
}

impl DistanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a distance, returning the one it replaced
    pub fn insert(&mut self, beacon_id: impl Into<BeaconId>, distance_m: f64) -> Option<f64> {
        self.distances.insert(beacon_id.into(), distance_m)
    }

    pub fn insert_sample(&mut self, sample: DistanceSample) -> Option<f64> {
        self.distances.insert(sample.beacon_id, sample.distance_m)
    }

    pub fn get(&self, beacon_id: &str) -> Option<f64> {
        self.distances.get(beacon_id).copied()
    }

    pub fn remove(&mut self, beacon_id: &str) -> Option<f64> {
        self.distances.remove(beacon_id)
    }

    pub fn contains(&self, beacon_id: &str) -> bool {
        self.distances.contains_key(beacon_id)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn clear(&mut self) {
        self.distances.clear();
    }

    /// Keep only the beacons for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&BeaconId) -> bool) {
        self.distances.retain(|id, _| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BeaconId, f64)> + '_ {
        self.distances.iter().map(|(id, d)| (id, *d))
    }
}

impl<I: Into<BeaconId>> FromIterator<(I, f64)> for DistanceSet {
    fn from_iter<T: IntoIterator<Item = (I, f64)>>(iter: T) -> Self {
        let mut set = DistanceSet::new();
        for (id, distance_m) in iter {
            set.insert(id, distance_m);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_set_latest_wins() {
        let mut set = DistanceSet::new();
        assert_eq!(set.insert("a", 1.0), None);
        assert_eq!(set.insert("b", 2.0), None);
        assert_eq!(set.insert("a", 3.5), Some(1.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a"), Some(3.5));

        set.insert_sample(DistanceSample { beacon_id: "b".into(), distance_m: 0.5 });
        assert_eq!(set.get("b"), Some(0.5));
        assert_eq!(set.remove("b"), Some(0.5));
        assert!(!set.contains("b"));
    }

    #[test]
    fn test_distance_set_from_pairs() {
        let set: DistanceSet = vec![("a", 1.0), ("b", 2.0), ("a", 4.0)].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a"), Some(4.0));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
        assert_eq!(Point::from_vector(b.to_vector()), b);
    }

    #[test]
    fn test_beacon_id_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(BeaconId::from("58:06:24:08:02:f5"), 1);
        assert_eq!(map.get("58:06:24:08:02:f5"), Some(&1));
        assert_eq!(BeaconId::new("abc").to_string(), "abc");
    }

    #[test]
    fn test_reading_deserialization_without_signal() {
        let json = r#"{ "beacon_id": "58:06:24:08:02:f6", "timestamp_ms": 12 }"#;
        let reading: BeaconReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading, BeaconReading::without_signal("58:06:24:08:02:f6", 12));

        let json = r#"{ "beacon_id": "58:06:24:08:02:f6", "signal_strength_dbm": -70 }"#;
        let reading: BeaconReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.signal_strength_dbm, Some(-70));
        assert_eq!(reading.timestamp_ms, 0);
    }
}
