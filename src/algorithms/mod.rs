//! Core positioning algorithms

pub mod path_loss;
pub mod circles;
pub mod multilateration;

pub use path_loss::PathLossModel;
pub use circles::{intersect, Circle};
pub use multilateration::{BeaconRegistry, IntersectionPolicy, PositionSolver};
