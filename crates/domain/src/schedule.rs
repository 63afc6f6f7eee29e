use crate::error::ValidationError;
use chrono::{prelude::*, Duration};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Display, str::FromStr};

/// How far before and after a scheduled time a notification may fire
pub const DEFAULT_NOTIFICATION_TOLERANCE_MINUTES: i64 = 5;

/// A time of day without any date component, with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "TimeOfDayDocument", try_from = "TimeOfDayDocument")]
pub struct TimeOfDay(NaiveTime);

#[derive(Serialize, Deserialize)]
struct TimeOfDayDocument {
    hours: u32,
    minutes: u32,
}

impl TimeOfDay {
    pub fn new(hours: u32, minutes: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hours, minutes, 0)
            .map(Self)
            .ok_or(ValidationError::InvalidTimeOfDay { hours, minutes })
    }

    pub fn hours(&self) -> u32 {
        self.0.hour()
    }

    pub fn minutes(&self) -> u32 {
        self.0.minute()
    }

    pub fn minute_of_day(&self) -> u32 {
        self.hours() * 60 + self.minutes()
    }

    pub fn from_minute_of_day(minute_of_day: u32) -> Result<Self, ValidationError> {
        Self::new(minute_of_day / 60, minute_of_day % 60)
    }

    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl From<TimeOfDay> for TimeOfDayDocument {
    fn from(time: TimeOfDay) -> Self {
        Self {
            hours: time.hours(),
            minutes: time.minutes(),
        }
    }
}

impl TryFrom<TimeOfDayDocument> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(doc: TimeOfDayDocument) -> Result<Self, Self::Error> {
        Self::new(doc.hours, doc.minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedTimeOfDay(s.to_string());
        let (hours, minutes) = s.split_once(':').ok_or_else(malformed)?;
        let hours = hours.trim().parse::<u32>().map_err(|_| malformed())?;
        let minutes = minutes.trim().parse::<u32>().map_err(|_| malformed())?;
        Self::new(hours, minutes)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

/// A concrete date and scheduled time that `now` falls close enough to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub time: TimeOfDay,
}

impl Occurrence {
    pub fn at(&self) -> NaiveDateTime {
        self.time.on(self.date)
    }
}

/// A recurring set of times of day on a set of weekdays.
///
/// Both sets are kept sorted and free of duplicates. A `Schedule` with no
/// times or no days is valid and simply never fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScheduleDocument")]
pub struct Schedule {
    times: Vec<TimeOfDay>,
    days: Vec<Weekday>,
}

#[derive(Deserialize)]
struct ScheduleDocument {
    #[serde(default)]
    times: Vec<TimeOfDay>,
    #[serde(default)]
    days: Vec<Weekday>,
}

impl From<ScheduleDocument> for Schedule {
    fn from(doc: ScheduleDocument) -> Self {
        Self::new(doc.times, doc.days)
    }
}

impl Schedule {
    pub fn new(
        times: impl IntoIterator<Item = TimeOfDay>,
        days: impl IntoIterator<Item = Weekday>,
    ) -> Self {
        let mut times = times.into_iter().collect::<Vec<_>>();
        times.sort();
        times.dedup();

        let mut days = days.into_iter().collect::<Vec<_>>();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();

        Self { times, days }
    }

    pub fn times(&self) -> &[TimeOfDay] {
        &self.times
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Whether `now` (a local wall clock time) is within the default
    /// tolerance of any scheduled time on an active weekday
    pub fn should_notify(&self, now: NaiveDateTime) -> bool {
        !self
            .occurrences_near(now, Duration::minutes(DEFAULT_NOTIFICATION_TOLERANCE_MINUTES))
            .is_empty()
    }

    /// Every scheduled occurrence whose window `[t - tolerance, t + tolerance]`
    /// contains `now`, both bounds inclusive.
    ///
    /// Occurrences on the previous and next date are considered as well, so
    /// a window around 00:02 also opens at 23:57 the evening before. The
    /// occurrence keeps the date and weekday it is scheduled on.
    pub fn occurrences_near(&self, now: NaiveDateTime, tolerance: Duration) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        if self.times.is_empty() || self.days.is_empty() {
            return occurrences;
        }

        for offset in -1..=1 {
            let date = now.date() + Duration::days(offset);
            if !self.days.contains(&date.weekday()) {
                continue;
            }
            for time in &self.times {
                let diff = now.signed_duration_since(time.on(date));
                if diff >= -tolerance && diff <= tolerance {
                    occurrences.push(Occurrence { date, time: *time });
                }
            }
        }

        occurrences
    }
}
