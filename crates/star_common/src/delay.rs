//! Timing check direction.
//!
//! Every path query, aggregation bucket, and report is scoped to one delay
//! type: `max` (setup checks) or `min` (hold checks).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The direction of a timing check.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayType {
    /// Setup (late) checks.
    #[serde(alias = "setup")]
    Max,
    /// Hold (early) checks.
    #[serde(alias = "hold")]
    Min,
}

impl DelayType {
    /// Both delay types in reporting order.
    pub const ALL: [DelayType; 2] = [DelayType::Max, DelayType::Min];

    /// Returns the short label used in keys and file names (`max` / `min`).
    pub fn as_str(self) -> &'static str {
        match self {
            DelayType::Max => "max",
            DelayType::Min => "min",
        }
    }

    /// Returns the check name used in settings keys (`setup` / `hold`).
    pub fn check_name(self) -> &'static str {
        match self {
            DelayType::Max => "setup",
            DelayType::Min => "hold",
        }
    }
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognized delay type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid delay type '{0}' (expected max, min, setup, or hold)")]
pub struct ParseDelayTypeError(pub String);

impl FromStr for DelayType {
    type Err = ParseDelayTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "setup" => Ok(DelayType::Max),
            "min" | "hold" => Ok(DelayType::Min),
            other => Err(ParseDelayTypeError(other.to_string())),
        }
    }
}
