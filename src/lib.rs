//! Input series for alerting and recording rule unit tests.
//!
//! Turns compact fixture definitions such as
//!
//! ```text
//! series: 'http_requests_total{job="api"}'
//! values: '0+10x5 _ stale'
//! ```
//!
//! into materialized series with timestamped samples, ready to be fed to a rule evaluator.
pub mod common;
pub mod config;
pub mod error;
pub mod fasttime;
pub mod unittest;

pub use error::{SeriesError, SeriesResult};
pub use unittest::{
    parse_input_series, parse_input_value, parse_series, parse_series_selector, InputSeries,
    ParsedSeries, SequenceValue, SeriesSelector,
};
