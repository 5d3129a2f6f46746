use std::fmt::Display;
use std::time::Duration;
use enquote::enquote;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::common::constants::METRIC_NAME_LABEL;
use crate::common::time::{current_time_millis, duration_to_millis};
use crate::common::types::{Label, Sample, Timestamp};
use crate::error::{SeriesError, SeriesResult};
use super::input_value::parse_input_value;
use super::selector::{parse_series_selector, SeriesSelector};

/// One entry of a test's `input_series` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSeries {
    /// series selector, e.g. `up{job="api"}`
    pub series: String,
    /// values expression, e.g. `1+1x10 _ stale`
    pub values: String,
}

impl InputSeries {
    pub fn new<S: Into<String>>(series: S, values: S) -> Self {
        InputSeries {
            series: series.into(),
            values: values.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSeries {
    pub metric_name: String,
    pub labels: Vec<Label>,
    /// non-omitted samples in timestamp order
    pub samples: Vec<Sample>,
    /// timestamps of the steps written as `_`
    pub omitted_timestamps: Vec<Timestamp>,
}

impl ParsedSeries {
    /// Returns labels with `__name__` first, as storage expects them.
    pub fn full_labels(&self) -> Vec<Label> {
        let mut res = Vec::with_capacity(self.labels.len() + 1);
        if !self.metric_name.is_empty() {
            res.push(Label::new(METRIC_NAME_LABEL, self.metric_name.as_str()));
        }
        res.extend(self.labels.iter().cloned());
        res
    }

    pub fn is_omitted(&self, ts: Timestamp) -> bool {
        self.omitted_timestamps.binary_search(&ts).is_ok()
    }

    /// Total number of steps, including omitted ones.
    pub fn step_count(&self) -> usize {
        self.samples.len() + self.omitted_timestamps.len()
    }
}

impl Display for ParsedSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.metric_name)?;
        if self.labels.is_empty() && !self.metric_name.is_empty() {
            return Ok(());
        }
        write!(f, "{{")?;
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", label.name, enquote('"', &label.value))?;
        }
        write!(f, "}}")
    }
}

/// Builds a series from a selector and a values expression.
///
/// Step `i` of the expression gets timestamp `base_time + i * interval`, omitted steps included,
/// so a gap stays distinguishable from an early end of the series. `base_time` defaults to now.
/// The interval is taken as given; resolving a default is up to the caller. A zero interval
/// puts every sample at `base_time`. Intervals shorter than a millisecond, and timestamps that
/// would overflow, are rejected.
pub fn parse_series(
    selector: &str,
    values: &str,
    interval: Duration,
    base_time: Option<Timestamp>,
) -> SeriesResult<ParsedSeries> {
    let SeriesSelector { metric_name, labels } = parse_series_selector(selector)?;
    let vals = parse_input_value(values)?;

    let step = duration_to_millis(interval).ok_or_else(|| {
        SeriesError::InvalidInterval(format!("{interval:?} can't be expressed in whole milliseconds"))
    })?;
    let base_time = base_time.unwrap_or_else(current_time_millis);
    let mut samples = Vec::with_capacity(vals.len());
    let mut omitted_timestamps = Vec::new();
    for (i, v) in vals.into_iter().enumerate() {
        let ts = i64::try_from(i)
            .ok()
            .and_then(|i| step.checked_mul(i))
            .and_then(|offset| base_time.checked_add(offset))
            .ok_or_else(|| {
                SeriesError::InvalidInterval(format!("timestamp of step #{i} overflows"))
            })?;
        if v.omitted {
            omitted_timestamps.push(ts);
        } else {
            samples.push(Sample::new(ts, v.value));
        }
    }

    debug!(
        "parsed input series {selector}: {} samples, {} omitted",
        samples.len(),
        omitted_timestamps.len()
    );

    Ok(ParsedSeries {
        metric_name,
        labels,
        samples,
        omitted_timestamps,
    })
}

/// Parses all input series of a test case against a shared start time.
///
/// The first invalid entry fails the whole list; the error names its position and selector.
pub fn parse_input_series(
    inputs: &[InputSeries],
    interval: Duration,
    base_time: Option<Timestamp>,
) -> SeriesResult<Vec<ParsedSeries>> {
    let base_time = base_time.unwrap_or_else(current_time_millis);
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            parse_series(&input.series, &input.values, interval, Some(base_time)).map_err(|e| {
                SeriesError::InputSeries {
                    index,
                    selector: input.series.clone(),
                    source: Box::new(e),
                }
            })
        })
        .collect()
}
