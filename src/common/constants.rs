/// STALE_NAN_BITS is the bit representation of the Prometheus staleness marker.
pub const STALE_NAN_BITS: u64 = 0x7ff0000000000002;

/// STALE_NAN is a special NaN value, which is used as a staleness mark.
/// It is distinguishable from any NaN produced by arithmetic.
pub const STALE_NAN: f64 = f64::from_bits(STALE_NAN_BITS);

pub const METRIC_NAME_LABEL: &str = "__name__";

/// Returns true if f is the staleness marker.
#[inline]
pub fn is_stale_nan(f: f64) -> bool {
    f.to_bits() == STALE_NAN_BITS
}
