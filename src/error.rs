use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CfError>;

#[derive(Error, Debug)]
pub enum CfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The similarity build ran past its configured deadline.
    #[error("Similarity build exceeded its deadline after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    /// A metric whose denominator is zero, e.g. popularity when no recommendations were produced.
    #[error("{metric} is undefined: {reason}")]
    UndefinedMetric { metric: String, reason: &'static str },
}

impl CfError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CfError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects zero for parameters that must be positive integers.
pub(crate) fn require_positive(name: &'static str, value: usize) -> Result<usize> {
    if value == 0 {
        Err(CfError::invalid(name, "must be a positive integer"))
    } else {
        Ok(value)
    }
}
