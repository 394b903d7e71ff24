//! Validation errors for form input.
//!
//! Every variant is raised before any network call is made.

use thiserror::Error;

/// A problem with the values entered for an event batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The duration field was left empty.
    #[error("no duration specified")]
    MissingDuration,

    /// No start time was given.
    #[error("no start times specified")]
    MissingStartTimes,

    /// The duration is not in `HH:mm` form.
    #[error("invalid duration '{0}': expected HH:mm")]
    InvalidDuration(String),

    /// A start time could not be parsed.
    #[error("invalid start time '{0}'")]
    InvalidStartTime(String),

    /// A local start time falls in a gap of the time zone (e.g. DST change).
    #[error("start time '{0}' does not exist in the local time zone")]
    NonexistentLocalTime(String),

    /// The reminder override is not a whole number of minutes.
    #[error("invalid reminder '{0}': expected a number of minutes")]
    InvalidReminder(String),
}

/// A specialized Result type for form validation.
pub type ValidationResult<T> = Result<T, ValidationError>;
