use chrono::NaiveDateTime;
use thiserror::Error;

use crate::component::Field;

/// Represents errors that can occur while parsing and evaluating cron schedules.
///
/// `CronError` is used throughout the `tzcrontab` crate to indicate various types of failures
/// and is exported for consuming programs to use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    /// The pattern string provided was empty.
    #[error("Cron pattern cannot be an empty string.")]
    EmptyPattern,

    /// The cron pattern as a whole is invalid.
    ///
    /// This error includes a message detailing the nature of the invalid pattern,
    /// such as "Pattern must have 5 or 6 fields.".
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A single field of the pattern is malformed or out of bounds.
    ///
    /// Raised at construction time, the schedule can not be built.
    #[error("Invalid {field} specification '{spec}': {reason}")]
    InvalidFieldSpec {
        field: Field,
        spec: String,
        reason: String,
    },

    /// Encountered a calendar date that can not be represented.
    #[error("Encountered an invalid date.")]
    InvalidDate,

    /// The local wall-clock time occurs twice in the requested timezone.
    #[error("Local time {0} is ambiguous in the requested timezone.")]
    AmbiguousLocalTime(NaiveDateTime),

    /// The local wall-clock time is skipped by the requested timezone.
    #[error("Local time {0} does not exist in the requested timezone.")]
    NonExistentLocalTime(NaiveDateTime),

    /// The search for the next matching time exceeded its bound.
    ///
    /// This is encountered with patterns whose fields can never match together,
    /// such as the 31st of April, or with year restrictions that lie in the past.
    #[error("Time search limit exceeded, the pattern does not match any upcoming time.")]
    TimeSearchLimitExceeded,
}

impl CronError {
    pub(crate) fn field(field: Field, spec: &str, reason: impl Into<String>) -> Self {
        CronError::InvalidFieldSpec {
            field,
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}
