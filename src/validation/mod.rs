//! Error taxonomy for solving and configuration

pub mod error;

pub use error::{ConfigError, PositioningError, PositioningResult};
