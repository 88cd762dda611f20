//! Crate-wide error types.

use thiserror::Error;

pub type StepSortResult<T> = Result<T, StepSortError>;

#[derive(Debug, Error)]
pub enum StepSortError {
    #[error("input is empty: no counting range can be established")]
    EmptyInput,

    #[error("step index {index} is out of range (recording has {len} steps)")]
    InvalidStepIndex { index: usize, len: usize },

    #[error("cannot {operation} while navigator is {state}")]
    InvalidState { operation: &'static str, state: crate::NavState },

    #[error("value range {min}..={max} needs more than {limit} buckets")]
    RangeTooLarge { min: i64, max: i64, limit: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("trace error: {0}")]
    Trace(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("time error: {0}")]
    Time(String),
}

impl From<time::error::Format> for StepSortError {
    fn from(value: time::error::Format) -> Self {
        Self::Time(value.to_string())
    }
}
