//! Scanner abstraction for beacon readings
//!
//! The radio side (discovery, permissions, delivery mechanism) lives outside
//! this crate. It only has to yield `BeaconReading` values through
//! [`BeaconScanner`].

pub mod scanner;
pub mod simulated;

pub use scanner::{BeaconScanner, ReplayScanner, ScanError, ScanResult};
pub use simulated::SimulatedScanner;
