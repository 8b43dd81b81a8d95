use std::str::FromStr;

use tasklane_core::{ParseStatusError, Task, TaskStatus};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Status filter applied to the open task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Only tasks with this status.
    Only(TaskStatus),
}

impl StatusFilter {
    /// Whether `task` passes the filter.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => task.status == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// Error returned for timestamps in neither RFC3339 nor `YYYY-MM-DD` form.
#[derive(Debug, thiserror::Error)]
#[error("invalid timestamp '{input}': expected RFC3339 or YYYY-MM-DD")]
pub struct TimestampError {
    input: String,
}

/// Parse an RFC3339 timestamp, or a calendar date taken as midnight UTC.
///
/// # Errors
/// Returns [`TimestampError`] when neither format matches.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime, TimestampError> {
    let trimmed = s.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(normalize_timestamp(parsed));
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| TimestampError {
            input: trimmed.to_owned(),
        })
}

/// Normalize timestamps to UTC to avoid offset mismatches across interfaces.
#[must_use]
pub const fn normalize_timestamp(dt: OffsetDateTime) -> OffsetDateTime {
    dt.to_offset(UtcOffset::UTC)
}
