use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between input samples if a test doesn't set one.
pub const DEFAULT_EVALUATION_INTERVAL: Duration = Duration::from_secs(60);

/// How often the cached clock in `fasttime` is refreshed.
pub const FAST_CLOCK_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interval between consecutive input samples. Used when a test group
    /// doesn't specify its own interval.
    pub evaluation_interval: Duration,

    pub fast_clock_refresh: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            evaluation_interval: DEFAULT_EVALUATION_INTERVAL,
            fast_clock_refresh: FAST_CLOCK_REFRESH_INTERVAL,
        }
    }
}

impl Settings {
    /// Returns the interval to use for a test group. An unset or zero interval
    /// falls back to `evaluation_interval`.
    pub fn resolve_interval(&self, interval: Option<Duration>) -> Duration {
        match interval {
            Some(d) if !d.is_zero() => d,
            _ => self.evaluation_interval,
        }
    }
}
