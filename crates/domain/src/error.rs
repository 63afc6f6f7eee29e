use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a `Reminder` or one of its `Schedule` values is rejected
/// before it is persisted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("The field `{0}` is required and cannot be empty")]
    MissingField(&'static str),
    #[error("The end date {end} is before the start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("{hours:02}:{minutes:02} is not a valid time of day")]
    InvalidTimeOfDay { hours: u32, minutes: u32 },
    #[error("`{0}` is not a valid time of day, expected HH:MM")]
    MalformedTimeOfDay(String),
    #[error("The schedule needs at least one time of day")]
    EmptyScheduleTimes,
    #[error("The schedule needs at least one weekday")]
    EmptyScheduleDays,
}
