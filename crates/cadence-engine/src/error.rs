//! Error types for cadence-engine operations.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Broad failure category, used by callers to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input breaks a domain rule (client error).
    Validation,
    /// Arithmetic left the supported range (interval, calendar bounds, caps).
    Range,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Title is required")]
    EmptyTitle,

    #[error("Start date must be before end date")]
    InvalidSpan,

    #[error("Cannot specify both an occurrence count and a recurrence end date")]
    CountAndEndDate,

    #[error("Occurrence count must be greater than 0")]
    InvalidOccurrenceCount,

    #[error("Recurrence end date {0} cannot be before the series start date")]
    EndBeforeStart(NaiveDateTime),

    #[error("Occurrence date {0} is before the series start date")]
    OccurrenceBeforeStart(NaiveDateTime),

    #[error("Occurrence date {0} is after the series end date")]
    OccurrenceAfterEnd(NaiveDateTime),

    #[error("Occurrence date {0} is not in the series")]
    NotAnOccurrence(NaiveDateTime),

    #[error("An exception already exists for {0}")]
    DuplicateException(NaiveDateTime),

    #[error("Window end {to} is before window start {from}")]
    InvalidWindow {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    #[error("Interval must be >= 1, got {0}")]
    IntervalOutOfRange(u32),

    #[error("Frequency {0} does not generate further occurrences")]
    UnsupportedFrequency(&'static str),

    #[error("Date arithmetic overflowed the supported calendar range")]
    DateOverflow,

    #[error("Local time {0} does not exist in the target timezone")]
    NonexistentLocalTime(NaiveDateTime),

    #[error("Invalid resolver configuration: {0}")]
    InvalidConfig(String),

    #[error("Resolve exceeded the configured limit of {0} iterations")]
    TooManyIterations(usize),
}

impl ScheduleError {
    /// Classify this error into the validation/range taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::IntervalOutOfRange(_)
            | ScheduleError::UnsupportedFrequency(_)
            | ScheduleError::DateOverflow
            | ScheduleError::NonexistentLocalTime(_)
            | ScheduleError::TooManyIterations(_) => ErrorKind::Range,
            _ => ErrorKind::Validation,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
