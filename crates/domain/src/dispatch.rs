use crate::{
    schedule::{Occurrence, TimeOfDay, DEFAULT_NOTIFICATION_TOLERANCE_MINUTES},
    shared::entity::ID,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// The unit of at-most-once delivery: one scheduled time of one
/// `Reminder` on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub reminder_id: ID,
    pub date: NaiveDate,
    pub time: TimeOfDay,
}

impl SlotKey {
    pub fn new(reminder_id: ID, occurrence: &Occurrence) -> Self {
        Self {
            reminder_id,
            date: occurrence.date,
            time: occurrence.time,
        }
    }

    /// Last instant (local wall clock) at which this slot may still fire
    pub fn window_closes_at(&self, tolerance: Duration) -> NaiveDateTime {
        self.time.on(self.date) + tolerance
    }
}

impl Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}T{}", self.reminder_id, self.date, self.time)
    }
}

/// Dispatch progress of a slot.
///
/// ```text
/// Pending -> Claimed -> Sent
///    ^          |
///    +----------+ (send failed)
/// Pending | Claimed -> Missed (window closed)
/// ```
/// `Sent` and `Missed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Pending,
    /// A dispatcher holds the slot while a send is in flight
    Claimed,
    Sent,
    Missed,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Sent => "sent",
            Self::Missed => "missed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Missed)
    }

    /// Only unclaimed slots that have not reached a terminal state can be claimed
    pub fn is_claimable(&self) -> bool {
        self.can_transition_to(Self::Claimed)
    }

    pub fn can_transition_to(&self, next: SlotState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Claimed)
                | (Self::Pending, Self::Missed)
                | (Self::Claimed, Self::Pending)
                | (Self::Claimed, Self::Sent)
                | (Self::Claimed, Self::Missed)
        )
    }
}

#[derive(Error, Debug)]
#[error("Unknown slot state: {0}")]
pub struct InvalidSlotStateError(String);

impl FromStr for SlotState {
    type Err = InvalidSlotStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "claimed" => Ok(Self::Claimed),
            "sent" => Ok(Self::Sent),
            "missed" => Ok(Self::Missed),
            _ => Err(InvalidSlotStateError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CadenceError {
    #[error("Notification tolerance must be between 1 and 60 minutes, got {0}")]
    ToleranceOutOfRange(i64),
    #[error(
        "Tick interval of {tick_secs}s must be at least 1s and no longer than the tolerance of {tolerance_secs}s"
    )]
    TickOutOfRange { tick_secs: u64, tolerance_secs: u64 },
}

/// The notification tolerance together with the dispatch tick interval.
///
/// They only exist as a pair: the tick must never be longer than the
/// tolerance, so every `[t - tolerance, t + tolerance]` window is
/// evaluated by at least two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationCadence {
    tolerance_minutes: i64,
    tick_interval_secs: u64,
}

impl NotificationCadence {
    pub fn new(tolerance_minutes: i64, tick_interval_secs: u64) -> Result<Self, CadenceError> {
        if !(1..=60).contains(&tolerance_minutes) {
            return Err(CadenceError::ToleranceOutOfRange(tolerance_minutes));
        }
        let tolerance_secs = tolerance_minutes as u64 * 60;
        if tick_interval_secs == 0 || tick_interval_secs > tolerance_secs {
            return Err(CadenceError::TickOutOfRange {
                tick_secs: tick_interval_secs,
                tolerance_secs,
            });
        }
        Ok(Self {
            tolerance_minutes,
            tick_interval_secs,
        })
    }

    pub fn tolerance(&self) -> Duration {
        Duration::minutes(self.tolerance_minutes)
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs)
    }
}

impl Default for NotificationCadence {
    fn default() -> Self {
        Self {
            tolerance_minutes: DEFAULT_NOTIFICATION_TOLERANCE_MINUTES,
            tick_interval_secs: 60,
        }
    }
}
