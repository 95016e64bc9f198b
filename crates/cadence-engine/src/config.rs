//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Tuning knobs for [`ScheduledEventResolver`](crate::ScheduledEventResolver).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on next-occurrence steps per resolve call (alignment plus
    /// walk). `None` means unbounded; callers are then responsible for
    /// bounding the requested window.
    pub max_iterations: Option<usize>,
}

impl ResolverConfig {
    /// A configuration that refuses to step more than `max` times per call.
    pub fn bounded(max: usize) -> Self {
        Self {
            max_iterations: Some(max),
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScheduleError::InvalidConfig(e.to_string()))
    }
}
