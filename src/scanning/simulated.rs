//! Simulated scanner for testing and demos
//!
//! Produces readings a receiver standing at a fixed point would hear, by
//! inverting the path-loss model. Optional uniform noise (in dB) is added
//! before rounding to whole dBm, like a real radio reports.

use crate::algorithms::{BeaconRegistry, PathLossModel};
use crate::core::{BeaconId, BeaconReading, Point};
use crate::scanning::{BeaconScanner, ScanError, ScanResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Closest modeled range, keeps log10 finite for a receiver on top of a beacon
const MIN_RANGE_M: f64 = 0.01;

pub struct SimulatedScanner {
    beacons: Vec<(BeaconId, Point)>,
    model: PathLossModel,
    receiver: Point,
    noise_db: f64,
    rounds_left: u32,
    cursor: usize,
    clock_ms: u64,
    interval_ms: u64,
    scanning: bool,
    connected: bool,
    rng: StdRng,
}

impl SimulatedScanner {
    /// Scanner that reports each registry beacon once per round for `rounds` rounds
    pub fn new(registry: &BeaconRegistry, model: PathLossModel, receiver: Point, rounds: u32) -> Self {
        let mut beacons: Vec<(BeaconId, Point)> =
            registry.iter().map(|(id, p)| (id.clone(), *p)).collect();
        beacons.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            beacons,
            model,
            receiver,
            noise_db: 0.0,
            rounds_left: rounds,
            cursor: 0,
            clock_ms: 0,
            interval_ms: 100,
            scanning: false,
            connected: true,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Add uniform noise in `[-noise_db, +noise_db]`, reproducible per seed
    pub fn with_noise(mut self, noise_db: f64, seed: u64) -> Self {
        self.noise_db = noise_db.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Also report beacons that are not part of the installed layout
    pub fn with_stray_beacon(mut self, beacon_id: impl Into<BeaconId>, position: Point) -> Self {
        self.beacons.push((beacon_id.into(), position));
        self
    }

    pub fn move_receiver(&mut self, receiver: Point) {
        self.receiver = receiver;
    }

    pub fn receiver(&self) -> Point {
        self.receiver
    }

    /// Simulate the radio going away
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    /// Signal strength the model predicts at a range, before noise
    fn modeled_rssi(&self, range_m: f64) -> f64 {
        self.model.measured_power_dbm()
            - 10.0 * self.model.path_loss_exponent() * range_m.max(MIN_RANGE_M).log10()
    }
}

impl BeaconScanner for SimulatedScanner {
    fn start(&mut self) -> ScanResult<()> {
        if !self.connected {
            return Err(ScanError::RadioOff);
        }
        self.scanning = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.scanning = false;
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }

    fn next_reading(&mut self) -> ScanResult<Option<BeaconReading>> {
        if !self.connected {
            return Err(ScanError::Disconnected("simulated link down".to_string()));
        }
        if !self.scanning {
            return Err(ScanError::NotScanning);
        }
        if self.rounds_left == 0 || self.beacons.is_empty() {
            return Ok(None);
        }

        let (id, position) = self.beacons[self.cursor].clone();
        let mut rssi = self.modeled_rssi(position.distance_to(&self.receiver));
        if self.noise_db > 0.0 {
            rssi += self.rng.gen_range(-self.noise_db..=self.noise_db);
        }

        self.cursor += 1;
        if self.cursor == self.beacons.len() {
            self.cursor = 0;
            self.rounds_left -= 1;
        }
        self.clock_ms += self.interval_ms;

        Ok(Some(BeaconReading::new(id, rssi.round() as i32, self.clock_ms)))
    }
}
