//! Latest-wins aggregation of beacon readings into distances

use crate::algorithms::PathLossModel;
use crate::core::{BeaconId, BeaconReading, DistanceSample, DistanceSet, DEFAULT_MISSING_RSSI_DBM};
use log::trace;

/// Converts each incoming reading to a distance and keeps the most recent
/// one per beacon. Callers filter readings for beacons outside the layout
/// before ingesting; `retain_beacons` drops entries that left it later.
#[derive(Debug, Clone)]
pub struct ReadingAggregator {
    model: PathLossModel,
    missing_rssi_dbm: i32,
    distances: DistanceSet,
    readings_seen: u64,
}

impl Default for ReadingAggregator {
    fn default() -> Self {
        Self::new(PathLossModel::default())
    }
}

impl ReadingAggregator {
    pub fn new(model: PathLossModel) -> Self {
        Self {
            model,
            missing_rssi_dbm: DEFAULT_MISSING_RSSI_DBM,
            distances: DistanceSet::new(),
            readings_seen: 0,
        }
    }

    /// Signal strength assumed for readings that carry none
    pub fn with_missing_rssi(mut self, rssi_dbm: i32) -> Self {
        self.missing_rssi_dbm = rssi_dbm;
        self
    }

    pub fn model(&self) -> &PathLossModel {
        &self.model
    }

    /// Convert one reading and store it, replacing any earlier value for the beacon
    pub fn ingest(&mut self, reading: &BeaconReading) -> DistanceSample {
        let rssi = reading.signal_strength_dbm.unwrap_or(self.missing_rssi_dbm);
        let sample = DistanceSample {
            beacon_id: reading.beacon_id.clone(),
            distance_m: self.model.distance_m(rssi),
        };
        trace!(
            "Beacon {} at {} dBm -> {:.2} m",
            sample.beacon_id,
            rssi,
            sample.distance_m
        );

        self.distances.insert_sample(sample.clone());
        self.readings_seen += 1;
        sample
    }

    pub fn distances(&self) -> &DistanceSet {
        &self.distances
    }

    /// Number of distinct beacons currently held
    pub fn beacon_count(&self) -> usize {
        self.distances.len()
    }

    pub fn readings_seen(&self) -> u64 {
        self.readings_seen
    }

    /// Forget all held distances
    pub fn clear(&mut self) {
        self.distances.clear();
    }

    /// Drop held distances for beacons `keep` rejects, returning how many went
    pub fn retain_beacons(&mut self, keep: impl FnMut(&BeaconId) -> bool) -> usize {
        let before = self.distances.len();
        self.distances.retain(keep);
        before - self.distances.len()
    }
}
