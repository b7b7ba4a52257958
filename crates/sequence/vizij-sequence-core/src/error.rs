//! Boundary errors. Stepping itself never fails; these come from loading
//! stored sequences and validating configuration.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown target '{name}'")]
    UnknownTarget { name: String },

    #[error("unknown ease '{name}'")]
    UnknownEase { name: String },

    #[error("invalid step {index} in program for '{target}': {reason}")]
    InvalidStep {
        target: String,
        index: usize,
        reason: String,
    },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = core::result::Result<T, SequenceError>;
