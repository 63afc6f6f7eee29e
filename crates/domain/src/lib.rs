mod dispatch;
mod error;
mod reminder;
mod schedule;
mod shared;

pub use dispatch::{CadenceError, InvalidSlotStateError, NotificationCadence, SlotKey, SlotState};
pub use error::ValidationError;
pub use reminder::{is_eligible, NewReminder, Reminder, ValidReminder};
pub use schedule::{Occurrence, Schedule, TimeOfDay, DEFAULT_NOTIFICATION_TOLERANCE_MINUTES};
pub use shared::entity::{Entity, InvalidIDError, ID};
