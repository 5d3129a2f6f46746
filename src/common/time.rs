use std::time::Duration;
use crate::common::types::Timestamp;

/// Returns the time duration since UNIX_EPOCH in milliseconds.
pub fn current_time_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Converts a step duration to whole milliseconds.
///
/// Returns None if the duration doesn't fit in an i64, or if it is non-zero but shorter than a
/// millisecond and would otherwise collapse to 0.
pub fn duration_to_millis(d: Duration) -> Option<i64> {
    if !d.is_zero() && d < Duration::from_millis(1) {
        return None;
    }
    i64::try_from(d.as_millis()).ok()
}
