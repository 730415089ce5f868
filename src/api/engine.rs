//! Update loop tying readings, distances and the solver together

use crate::algorithms::{PathLossModel, PositionSolver};
use crate::api::types::{EngineStats, PositionFix};
use crate::core::{BeaconReading, MIN_BEACONS};
use crate::processing::ReadingAggregator;
use crate::scanning::{BeaconScanner, ScanResult};
use crate::validation::{PositioningError, PositioningResult};
use log::{debug, warn};
use std::sync::Arc;

/// Drives positioning from a stream of readings.
///
/// Readings for beacons outside the layout are discarded before they are
/// stored, so the held set never grows past the number of installed beacons.
/// Each kept reading updates the latest distance for its beacon, and once
/// three or more registered beacons are held every further reading triggers
/// a solve. The solver is shared, so its layout can be recalibrated from
/// elsewhere while the engine runs.
pub struct PositioningEngine {
    solver: Arc<PositionSolver>,
    aggregator: ReadingAggregator,
    last_fix: Option<PositionFix>,
    sequence: u32,
    stats: EngineStats,
}

impl PositioningEngine {
    pub fn new(solver: Arc<PositionSolver>, model: PathLossModel) -> Self {
        Self::with_aggregator(solver, ReadingAggregator::new(model))
    }

    pub fn with_aggregator(solver: Arc<PositionSolver>, aggregator: ReadingAggregator) -> Self {
        Self {
            solver,
            aggregator,
            last_fix: None,
            sequence: 0,
            stats: EngineStats::default(),
        }
    }

    pub fn solver(&self) -> &Arc<PositionSolver> {
        &self.solver
    }

    pub fn aggregator(&self) -> &ReadingAggregator {
        &self.aggregator
    }

    /// Feed one reading.
    ///
    /// Returns `None` when the reading's beacon is not in the layout or while
    /// fewer than three registered beacons are held, otherwise the outcome of
    /// solving with the current distances.
    pub fn ingest(&mut self, reading: &BeaconReading) -> Option<PositioningResult<PositionFix>> {
        self.stats.readings += 1;

        let registry = self.solver.snapshot();
        if !registry.contains(reading.beacon_id.as_str()) {
            debug!("Discarding reading from unregistered beacon {}", reading.beacon_id);
            self.stats.unknown_beacons += 1;
            return None;
        }

        self.aggregator.ingest(reading);
        // Beacons removed from the layout since they were last heard
        let dropped = self.aggregator.retain_beacons(|id| registry.contains(id.as_str()));
        if dropped > 0 {
            debug!("Dropped {} held beacon(s) no longer in the layout", dropped);
        }

        if self.aggregator.beacon_count() < MIN_BEACONS {
            return None;
        }

        self.stats.solves += 1;
        let result = self.solver.solve(self.aggregator.distances()).map(|position| {
            self.sequence = self.sequence.wrapping_add(1);
            PositionFix {
                position,
                beacons_heard: self.aggregator.beacon_count(),
                timestamp_ms: reading.timestamp_ms,
                sequence_number: self.sequence,
            }
        });

        match &result {
            Ok(fix) => {
                debug!("Fix #{} at ({:.2}, {:.2})", fix.sequence_number, fix.position.x, fix.position.y);
                self.stats.fixes += 1;
                self.last_fix = Some(fix.clone());
            }
            Err(e) => {
                warn!("Position calculation failed: {}", e);
                match e {
                    PositioningError::InsufficientBeacons { .. } => self.stats.insufficient_beacons += 1,
                    PositioningError::NoIntersection { .. } => self.stats.no_intersection += 1,
                }
            }
        }

        Some(result)
    }

    /// Drain every reading the scanner has pending, returning the fixes produced
    pub fn poll(&mut self, scanner: &mut dyn BeaconScanner) -> ScanResult<Vec<PositionFix>> {
        let mut fixes = Vec::new();
        while let Some(reading) = scanner.next_reading()? {
            if let Some(Ok(fix)) = self.ingest(&reading) {
                fixes.push(fix);
            }
        }
        Ok(fixes)
    }

    /// Most recent successful fix
    pub fn last_fix(&self) -> Option<&PositionFix> {
        self.last_fix.as_ref()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Forget held readings and the last fix, e.g. when scanning stops
    pub fn reset(&mut self) {
        self.aggregator.clear();
        self.last_fix = None;
    }
}
