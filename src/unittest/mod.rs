//! Input series for rule unit tests.
//!
//! A test describes its input as a list of `{series, values}` pairs:
//!
//! ```yaml
//! input_series:
//!   - series: 'up{job="api"}'
//!     values: '1+1x2 _ stale 0x3'
//! ```
//!
//! The selector names exactly one series and the values expression expands into one sample per
//! evaluation interval.
mod input_series;
mod input_value;
mod selector;

pub use input_series::*;
pub use input_value::*;
pub use selector::*;
