//! RSSI to distance conversion
//!
//! Log-distance path-loss model:
//!
//! ```text
//! RSSI = A - 10 n log10(d)   =>   d = 10 ^ ((A - RSSI) / (10 n))
//! ```
//!
//! `A` is the signal strength measured one meter from the beacon and `n` the
//! path-loss exponent of the environment (2.0 in free space, 2.5-4.0 indoors).

use crate::core::{DEFAULT_MEASURED_POWER_DBM, DEFAULT_PATH_LOSS_EXPONENT};
use crate::validation::ConfigError;
use serde::{Deserialize, Serialize};

/// Tunable constants of the path-loss model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLossModel {
    #[serde(default = "default_measured_power")]
    measured_power_dbm: f64,
    #[serde(default = "default_exponent")]
    path_loss_exponent: f64,
}

fn default_measured_power() -> f64 {
    DEFAULT_MEASURED_POWER_DBM
}

fn default_exponent() -> f64 {
    DEFAULT_PATH_LOSS_EXPONENT
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self {
            measured_power_dbm: DEFAULT_MEASURED_POWER_DBM,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

impl PathLossModel {
    /// Build a model, rejecting constants that would make distances NaN
    pub fn new(measured_power_dbm: f64, path_loss_exponent: f64) -> Result<Self, ConfigError> {
        let model = Self {
            measured_power_dbm,
            path_loss_exponent,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.measured_power_dbm.is_finite() {
            return Err(ConfigError::invalid(
                "measured_power_dbm",
                self.measured_power_dbm,
                "must be a finite dBm value",
            ));
        }
        if !self.path_loss_exponent.is_finite() || self.path_loss_exponent <= 0.0 {
            return Err(ConfigError::invalid(
                "path_loss_exponent",
                self.path_loss_exponent,
                "must be finite and greater than zero",
            ));
        }
        Ok(())
    }

    pub fn measured_power_dbm(&self) -> f64 {
        self.measured_power_dbm
    }

    pub fn path_loss_exponent(&self) -> f64 {
        self.path_loss_exponent
    }

    /// Modeled distance in meters for one signal-strength sample.
    ///
    /// Implausible inputs (0 dBm, -200 dBm, ...) are accepted and simply map to
    /// extreme distances. The result saturates at `f64::MAX` so it is always
    /// finite and non-negative.
    pub fn distance_m(&self, rssi_dbm: i32) -> f64 {
        let exponent = (self.measured_power_dbm - f64::from(rssi_dbm)) / (10.0 * self.path_loss_exponent);
        let distance = 10f64.powf(exponent);
        if distance.is_finite() {
            distance
        } else {
            f64::MAX
        }
    }
}
