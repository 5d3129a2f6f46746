use serde::{Deserialize, Serialize};

/// Unix timestamp in milliseconds.
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Sample { timestamp, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new<S: Into<String>>(name: S, value: S) -> Self {
        Label {
            name: name.into(),
            value: value.into(),
        }
    }
}
