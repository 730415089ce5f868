//! Presentation helpers
//!
//! Floor-plan scaling from meters to display units, short beacon labels and
//! text/JSON/CSV rendering of position fixes.

use crate::api::types::{OutputFormat, PositionFix};
use crate::core::{BeaconId, Point};
use serde::{Deserialize, Serialize};

/// Characters of a beacon identifier shown next to its marker
const SHORT_LABEL_LEN: usize = 5;

/// Meters to display units, per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorPlanScale {
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
}

fn default_scale() -> f64 {
    30.0
}

impl Default for FloorPlanScale {
    fn default() -> Self {
        Self {
            scale_x: default_scale(),
            scale_y: default_scale(),
        }
    }
}

impl FloorPlanScale {
    pub fn new(scale_x: f64, scale_y: f64) -> Self {
        Self { scale_x, scale_y }
    }

    /// Display coordinates of a floor-plan point
    pub fn to_screen(&self, point: &Point) -> Point {
        Point::new(point.x * self.scale_x, point.y * self.scale_y)
    }

    /// Floor-plan point under a display coordinate
    pub fn to_floor(&self, screen: &Point) -> Point {
        Point::new(screen.x / self.scale_x, screen.y / self.scale_y)
    }
}

/// Last few characters of a beacon identifier (the distinguishing tail of a MAC)
pub fn short_label(beacon_id: &BeaconId) -> &str {
    let id = beacon_id.as_str();
    match id.char_indices().rev().nth(SHORT_LABEL_LEN - 1) {
        Some((start, _)) => &id[start..],
        None => id,
    }
}

/// Renders fixes in the requested output format
#[derive(Debug, Clone, Copy)]
pub struct FixFormatter {
    pub format: OutputFormat,
    /// Decimal places for coordinates
    pub precision: usize,
}

impl Default for FixFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

impl FixFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, precision: 2 }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn csv_header() -> &'static str {
        "sequence,timestamp_ms,x_m,y_m,beacons_heard"
    }

    pub fn format(&self, fix: &PositionFix) -> Result<String, serde_json::Error> {
        let p = self.precision;
        match self.format {
            OutputFormat::Text => Ok(format!(
                "#{} x={:.p$} m, y={:.p$} m ({} beacons)",
                fix.sequence_number, fix.position.x, fix.position.y, fix.beacons_heard
            )),
            OutputFormat::Json => serde_json::to_string(fix),
            OutputFormat::Csv => Ok(format!(
                "{},{},{:.p$},{:.p$},{}",
                fix.sequence_number, fix.timestamp_ms, fix.position.x, fix.position.y, fix.beacons_heard
            )),
        }
    }
}
