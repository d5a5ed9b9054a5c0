//! Error types for residence-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResidenceError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid buffer: {0} days (expected one of 0, 7, 14, 30)")]
    InvalidBuffer(u32),

    #[error("Invalid trip length: {0} (must be at least 1 day)")]
    InvalidTripLength(u32),

    #[error("Date arithmetic out of range near {0}")]
    DateOutOfRange(NaiveDate),
}

pub type Result<T> = std::result::Result<T, ResidenceError>;
