//! Error types for Bewegungsliga

use thiserror::Error;

/// Errors raised by ingestion, catalog lookups and session actions.
///
/// The metric functions themselves are total and never return these.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to parse activity records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid bonus requirement: {0}")]
    InvalidRequirement(String),

    #[error("Invalid activity records: {0} issue(s) found")]
    InvalidRecords(usize),

    #[error("Unknown insurer: {0}")]
    UnknownInsurer(String),

    #[error("Unknown league code: {0}")]
    UnknownLeague(String),

    #[error("Invalid league name: {0}")]
    InvalidLeagueName(String),

    #[error("No user is signed in")]
    NoActiveUser,

    #[error("No insurer selected for user {0}")]
    NoInsurerSelected(String),

    #[error("Not eligible for bonus: {days_achieved} of {days_required} days achieved")]
    NotEligible {
        days_achieved: u32,
        days_required: u32,
    },

    #[error("Bonus {program} already claimed for period starting {period_start}")]
    AlreadyClaimed {
        program: String,
        period_start: String,
    },
}
