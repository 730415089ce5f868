//! Caller-facing API
//!
//! The engine drives the update loop for a stream of readings; the
//! formatting helpers prepare fixes for display or logging.

pub mod engine;
pub mod formatting;
pub mod types;

pub use engine::PositioningEngine;
pub use formatting::{short_label, FixFormatter, FloorPlanScale};
pub use types::{EngineStats, OutputFormat, PositionFix};
