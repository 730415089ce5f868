//! Configuration handling

pub mod config;

pub use config::{BeaconConfig, SystemConfig};
