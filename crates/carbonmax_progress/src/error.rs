//! Errors raised while loading static quest data or checking outcomes.
//!
//! Tracker operations themselves are total; persistence problems are logged
//! and never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Quest catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate quest id in catalog: {0}")]
    DuplicateQuest(String),

    #[error("Invalid quest {id}: {reason}")]
    InvalidQuest { id: String, reason: String },

    #[error("Invalid {field} in {kind} outcome: {value} (must be finite and non-negative)")]
    InvalidOutcome {
        kind: &'static str,
        field: &'static str,
        value: f64,
    },
}

pub type Result<T> = std::result::Result<T, ProgressError>;
