//! Common API types

use crate::core::Point;
use serde::{Deserialize, Serialize};

/// Position estimate handed to the presentation side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Floor-plan position (meters)
    pub position: Point,
    /// Distinct registered beacons held when the fix was solved
    pub beacons_heard: usize,
    /// Arrival time of the reading that triggered the solve (milliseconds)
    pub timestamp_ms: u64,
    /// Sequence number for tracking
    pub sequence_number: u32,
}

/// Running counters for an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub readings: u64,
    /// Readings discarded because their beacon is not in the layout
    pub unknown_beacons: u64,
    pub solves: u64,
    pub fixes: u64,
    pub insufficient_beacons: u64,
    pub no_intersection: u64,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable single line
    #[default]
    Text,
    /// JSON object
    Json,
    /// CSV row
    Csv,
}
