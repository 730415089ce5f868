use crate::algorithms::{BeaconRegistry, IntersectionPolicy, PathLossModel, PositionSolver};
use crate::api::{FloorPlanScale, PositioningEngine};
use crate::core::{BeaconId, Point, DEFAULT_MISSING_RSSI_DBM, MIN_BEACONS};
use crate::processing::ReadingAggregator;
use crate::validation::ConfigError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Beacons closer than this are flagged as a weak layout (meters)
const MIN_BEACON_SPACING_M: f64 = 1.0;

/// Deployment configuration: radio model, beacon layout and display scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Path-loss constants used for every beacon
    pub path_loss: PathLossModel,
    /// Signal strength assumed when a reading carries none (dBm)
    pub missing_rssi_dbm: i32,
    /// Which intersection points feed the centroid
    pub intersection_policy: IntersectionPolicy,
    /// Floor-plan to display scaling
    pub display: FloorPlanScale,
    /// Installed beacons
    pub beacons: Vec<BeaconConfig>,
}

/// One installed beacon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub id: BeaconId,
    pub position: Point,
}

impl BeaconConfig {
    pub fn new(id: impl Into<BeaconId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            path_loss: PathLossModel::default(),
            missing_rssi_dbm: DEFAULT_MISSING_RSSI_DBM,
            intersection_policy: IntersectionPolicy::default(),
            display: FloorPlanScale::default(),
            beacons: vec![
                BeaconConfig::new("58:06:24:08:02:f5", 0.0, 0.0),
                BeaconConfig::new("58:06:24:08:02:f6", 10.0, 0.0),
                BeaconConfig::new("58:06:24:08:02:f7", 5.0, 8.0),
            ],
        }
    }
}

impl SystemConfig {
    /// Load and validate a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        info!("Loaded configuration from '{}' with {} beacons", path_str, config.beacons.len());
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SystemConfig = serde_json::from_str(json)?;
        config.validate()?;
        for warning in config.layout_warnings() {
            warn!("{}", warning);
        }
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        info!("Saved configuration to '{}'", path_str);
        Ok(())
    }

    /// Reject values that would make the solver misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.path_loss.validate()?;

        for (name, value) in [("display.scale_x", self.display.scale_x), ("display.scale_y", self.display.scale_y)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(name, value, "must be finite and greater than zero"));
            }
        }

        let mut seen = HashSet::new();
        for beacon in &self.beacons {
            if beacon.id.as_str().is_empty() {
                return Err(ConfigError::invalid("beacons.id", "", "beacon id must not be empty"));
            }
            if !beacon.position.is_finite() {
                return Err(ConfigError::invalid(
                    "beacons.position",
                    format!("{} ({}, {})", beacon.id, beacon.position.x, beacon.position.y),
                    "coordinates must be finite",
                ));
            }
            if !seen.insert(&beacon.id) {
                return Err(ConfigError::DuplicateBeacon {
                    beacon_id: beacon.id.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Layout issues that degrade accuracy without making positioning impossible
    pub fn layout_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let positions: Vec<Point> = self.beacons.iter().map(|b| b.position).collect();

        if positions.len() < MIN_BEACONS {
            warnings.push(format!(
                "Only {} beacons configured, {} needed for a position fix",
                positions.len(),
                MIN_BEACONS
            ));
        } else if is_collinear(&positions) {
            warnings.push("All beacons lie on one line, positions will be ambiguous".to_string());
        }

        let mut min_spacing = f64::INFINITY;
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                min_spacing = min_spacing.min(positions[i].distance_to(&positions[j]));
            }
        }
        if min_spacing < MIN_BEACON_SPACING_M {
            warnings.push(format!(
                "Beacons only {:.2} m apart, consider spreading them out",
                min_spacing
            ));
        }

        warnings
    }

    pub fn registry(&self) -> BeaconRegistry {
        self.beacons
            .iter()
            .map(|b| (b.id.clone(), b.position))
            .collect()
    }

    pub fn build_solver(&self) -> PositionSolver {
        PositionSolver::new(self.registry()).with_policy(self.intersection_policy)
    }

    pub fn build_aggregator(&self) -> ReadingAggregator {
        ReadingAggregator::new(self.path_loss).with_missing_rssi(self.missing_rssi_dbm)
    }

    /// Engine wired with this configuration's solver and radio model
    pub fn build_engine(&self) -> PositioningEngine {
        PositioningEngine::with_aggregator(Arc::new(self.build_solver()), self.build_aggregator())
    }
}

/// True when every point lies on the line through the first two distinct points
fn is_collinear(points: &[Point]) -> bool {
    let first = points[0];
    let Some(second) = points.iter().copied().find(|p| p.distance_to(&first) > 1e-9) else {
        return true;
    };

    let dir = second.to_vector() - first.to_vector();
    let scale = dir.norm();
    points.iter().all(|p| {
        let v = p.to_vector() - first.to_vector();
        // Perpendicular offset from the line
        (dir.x * v.y - dir.y * v.x).abs() / scale < 1e-6
    })
}
