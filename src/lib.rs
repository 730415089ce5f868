//! Indoor Beacon Positioning
//!
//! Estimates a receiver's 2-D floor-plan position from the signal strength
//! of three or more fixed beacons: RSSI is converted to distance with a
//! log-distance path-loss model, and the distances are combined by pairwise
//! circle intersection.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod scanning;
pub mod api;

// Re-export commonly used types
pub use crate::core::{BeaconId, BeaconReading, DistanceSample, DistanceSet, Point, MIN_BEACONS};
pub use algorithms::{BeaconRegistry, IntersectionPolicy, PathLossModel, PositionSolver};
pub use processing::ReadingAggregator;
pub use validation::{ConfigError, PositioningError, PositioningResult};
pub use utils::{BeaconConfig, SystemConfig};
pub use scanning::{BeaconScanner, ReplayScanner, ScanError, ScanResult, SimulatedScanner};
pub use api::{
    short_label, EngineStats, FixFormatter, FloorPlanScale, OutputFormat, PositionFix,
    PositioningEngine,
};
