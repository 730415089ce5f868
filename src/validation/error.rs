use serde::{Deserialize, Serialize};

/// Failure outcomes of a single solve.
///
/// Both variants are normal results of noisy radio data. The caller is
/// expected to keep scanning and try again on the next reading cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PositioningError {
    /// Fewer usable beacons than a 2-D fix needs
    #[error("Insufficient beacons: {available} usable, {required} required")]
    InsufficientBeacons { available: usize, required: usize },

    /// No pair of distance circles intersected
    #[error("No intersection points found across {pairs_checked} beacon pairs")]
    NoIntersection { pairs_checked: usize },
}

impl PositioningError {
    /// Whether waiting for more readings may clear this error
    pub fn is_transient(&self) -> bool {
        match self {
            PositioningError::InsufficientBeacons { .. } => true,
            PositioningError::NoIntersection { .. } => true,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PositioningError::InsufficientBeacons { .. } => "InsufficientBeacons",
            PositioningError::NoIntersection { .. } => "NoIntersection",
        }
    }
}

/// Result type for solve operations
pub type PositioningResult<T> = Result<T, PositioningError>;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read or written
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Parameter outside its valid range
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Same beacon identity listed twice in one layout
    #[error("Beacon '{beacon_id}' is listed more than once")]
    DuplicateBeacon { beacon_id: String },
}

impl ConfigError {
    pub(crate) fn invalid(parameter: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
