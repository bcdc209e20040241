//! Error types for streak operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while reading or mutating a streak.
#[derive(Error, Debug)]
pub enum StreakError {
    #[error("Remote calendar request failed: {0}")]
    Transport(String),

    #[error("Calendar not found: {0}")]
    NotFound(String),

    #[error("Invalid streak record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("Day {0} has no following day")]
    InvalidDay(NaiveDate),
}

impl StreakError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        StreakError::Transport(err.to_string())
    }
}

/// Result type alias for streak operations.
pub type StreakResult<T> = Result<T, StreakError>;
