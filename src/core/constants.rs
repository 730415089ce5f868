//! Radio model defaults and solver limits

/// Calibrated signal strength one meter from a beacon (dBm)
pub const DEFAULT_MEASURED_POWER_DBM: f64 = -59.0;

/// Path-loss exponent for a typical furnished indoor space
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.5;

/// Signal strength assumed when the scanner reports none (dBm)
pub const DEFAULT_MISSING_RSSI_DBM: i32 = -100;

/// Distinct references needed to fix a 2-D position
pub const MIN_BEACONS: usize = 3;
