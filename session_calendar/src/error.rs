//! Error taxonomy for calendar construction and queries.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Why a local wall-clock time could not be mapped to a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizationReason {
    /// The wall time falls in a transition gap (clocks jumped over it).
    Nonexistent,
    /// The wall time occurs twice (clocks were turned back over it).
    Ambiguous,
}

impl fmt::Display for LocalizationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizationReason::Nonexistent => f.write_str("nonexistent"),
            LocalizationReason::Ambiguous => f.write_str("ambiguous"),
        }
    }
}

/// Errors raised while building or querying an exchange calendar.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Malformed session times, unknown timezone, inverted or oversized range.
    ///
    /// Raised once, at construction.
    #[error("calendar configuration error: {0}")]
    Configuration(String),

    /// The timezone database reports a gap or overlap at a session boundary.
    #[error("{reason} local time {date} {time} in {timezone}")]
    Localization {
        /// Calendar date of the boundary.
        date: NaiveDate,
        /// Local wall-clock time of the boundary.
        time: NaiveTime,
        /// IANA timezone name.
        timezone: String,
        /// Gap or overlap.
        reason: LocalizationReason,
    },

    /// The date is not a trading session of this calendar.
    #[error("{0} is not a session of this calendar")]
    UnknownSession(NaiveDate),

    /// The minute grid fill did not emit the precomputed number of minutes.
    ///
    /// Indicates a defect in schedule construction, never bad user input.
    #[error("minute grid inconsistency: expected {expected} minutes, emitted {emitted}")]
    GridInconsistency {
        /// Precomputed total.
        expected: usize,
        /// Minutes actually written.
        emitted: usize,
    },
}

impl CalendarError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CalendarError::Configuration(msg.into())
    }
}

/// Result alias used across the crate.
pub type CalendarResult<T> = Result<T, CalendarError>;
