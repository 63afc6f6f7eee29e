mod send_reminders;

use crate::shared::usecase::execute;
use chrono::{DateTime, Utc};
use pill_reminder_infra::{DispatchCounter, ReminderContext};
pub use send_reminders::{SendRemindersUseCase, TickReport};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Error, Debug, PartialEq)]
pub enum TickError {
    #[error("The previous tick is still running")]
    InProgress,
    #[error("Unable to load the eligible reminders")]
    Storage,
}

/// Runs dispatch ticks against a `ReminderContext`.
///
/// Ticks of one engine never overlap: a tick requested while another
/// one is running is skipped.
pub struct DispatchEngine {
    ctx: ReminderContext,
    tick_guard: Mutex<()>,
}

impl DispatchEngine {
    pub fn new(ctx: ReminderContext) -> Self {
        Self {
            ctx,
            tick_guard: Mutex::new(()),
        }
    }

    pub fn context(&self) -> &ReminderContext {
        &self.ctx
    }

    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, TickError> {
        let _guard = match self.tick_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.ctx.stats.incr(DispatchCounter::SkippedTicks);
                warn!("Skipping the tick at {}, the previous tick is still running", now);
                return Err(TickError::InProgress);
            }
        };

        self.ctx.stats.incr(DispatchCounter::Ticks);
        execute(SendRemindersUseCase { now }, &self.ctx)
            .await
            .map_err(|e| {
                self.ctx.stats.incr(DispatchCounter::FailedTicks);
                match e {
                    send_reminders::UseCaseErrors::StorageError => TickError::Storage,
                }
            })
    }
}
