use crate::shared::{local_time, usecase::UseCase};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use futures::future::join_all;
use pill_reminder_domain::{Reminder, SlotKey, SlotState};
use pill_reminder_infra::{DispatchCounter, ReminderContext, SendError};
use tokio::time::timeout;
use tracing::{error, info, warn};

const OUTCOME_WRITE_ATTEMPTS: usize = 3;

/// One dispatch tick: notifies about every slot whose window is open at
/// `now` and that has not been sent yet, then closes the windows that
/// ran out.
#[derive(Debug)]
pub struct SendRemindersUseCase {
    pub now: DateTime<Utc>,
}

/// What happened during a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub eligible_reminders: usize,
    pub sent: usize,
    pub failed: usize,
    /// Slots that were already claimed, sent or missed
    pub duplicates: usize,
    pub missed: usize,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StorageError,
}

enum SlotOutcome {
    Sent,
    Failed,
    Duplicate,
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendRemindersUseCase {
    type Response = TickReport;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "SendReminders";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let local_now = local_time(self.now, ctx);
        let today = local_now.date();
        let tolerance = ctx.config.cadence.tolerance();

        let reminders = ctx
            .repos
            .reminders
            .find_eligible(today)
            .await
            .map_err(|e| {
                error!("Unable to load the eligible reminders for {}: {:?}", today, e);
                UseCaseErrors::StorageError
            })?;

        // Occurrences just before or after midnight belong to the previous
        // or the next date, which might be outside of the reminder range
        let slots = reminders
            .iter()
            .flat_map(|reminder| {
                reminder
                    .schedule
                    .occurrences_near(local_now, tolerance)
                    .into_iter()
                    .filter(move |occurrence| reminder.is_eligible(occurrence.date))
                    .map(move |occurrence| (reminder, SlotKey::new(reminder.id.clone(), &occurrence)))
            })
            .collect::<Vec<_>>();

        let outcomes = join_all(
            slots
                .iter()
                .map(|(reminder, key)| dispatch_slot(reminder, key, ctx)),
        )
        .await;

        let mut report = TickReport {
            eligible_reminders: reminders.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                SlotOutcome::Sent => report.sent += 1,
                SlotOutcome::Failed => report.failed += 1,
                SlotOutcome::Duplicate => report.duplicates += 1,
            }
        }

        report.missed = close_missed_slots(local_now, tolerance, ctx).await;

        // Yesterday is kept for occurrences right before midnight
        let keep_from = today - Duration::days(1);
        if let Err(e) = ctx.repos.dispatch_slots.delete_before(keep_from).await {
            error!("Unable to prune dispatch slots before {}: {:?}", keep_from, e);
        }

        Ok(report)
    }
}

async fn dispatch_slot(reminder: &Reminder, key: &SlotKey, ctx: &ReminderContext) -> SlotOutcome {
    match ctx.repos.dispatch_slots.claim(key).await {
        Ok(true) => (),
        Ok(false) => {
            ctx.stats.incr(DispatchCounter::DuplicateSlots);
            return SlotOutcome::Duplicate;
        }
        Err(e) => {
            error!("Unable to claim slot {}: {:?}", key, e);
            ctx.stats.incr(DispatchCounter::FailedSends);
            return SlotOutcome::Failed;
        }
    }

    let title = reminder.notification_title();
    let body = reminder.notification_body();
    let send_timeout = ctx.config.send_timeout;
    let res = match timeout(
        send_timeout,
        ctx.notifications.send(&reminder.patient_id, &title, &body),
    )
    .await
    {
        Ok(res) => res,
        Err(_) => Err(SendError::Timeout(send_timeout)),
    };

    // A failed send releases the slot so the next tick can retry it
    let outcome = if res.is_ok() {
        SlotState::Sent
    } else {
        SlotState::Pending
    };
    record_outcome(key, outcome, ctx).await;

    match res {
        Ok(()) => {
            ctx.stats.incr(DispatchCounter::SentNotifications);
            info!("Sent notification for slot {} to {}", key, reminder.patient_id);
            SlotOutcome::Sent
        }
        Err(e) => {
            ctx.stats.incr(DispatchCounter::FailedSends);
            warn!(
                "Unable to send notification for slot {}: {}. Retrying while the window is open.",
                key, e
            );
            SlotOutcome::Failed
        }
    }
}

/// Writes the outcome of a send. A slot that still can not be written
/// stays claimed until `close_missed_slots` closes it.
async fn record_outcome(key: &SlotKey, outcome: SlotState, ctx: &ReminderContext) {
    for attempt in 1..=OUTCOME_WRITE_ATTEMPTS {
        match ctx
            .repos
            .dispatch_slots
            .transition(key, SlotState::Claimed, outcome)
            .await
        {
            Ok(true) => return,
            Ok(false) => {
                warn!(
                    "Slot {} was no longer claimed when marking it as {}",
                    key,
                    outcome.as_str()
                );
                return;
            }
            Err(e) => error!(
                "Attempt {} of {} to mark slot {} as {} failed: {:?}",
                attempt,
                OUTCOME_WRITE_ATTEMPTS,
                key,
                outcome.as_str(),
                e
            ),
        }
    }
}

/// Moves every unsent slot whose window has closed to `Missed`.
///
/// Claimed slots get the send timeout on top of the window, as a send
/// started at the very end of the window may still be in flight.
async fn close_missed_slots(
    local_now: NaiveDateTime,
    tolerance: Duration,
    ctx: &ReminderContext,
) -> usize {
    let send_grace = Duration::milliseconds(ctx.config.send_timeout.as_millis() as i64);

    let mut missed = 0;
    for &(state, grace) in &[
        (SlotState::Pending, Duration::zero()),
        (SlotState::Claimed, send_grace),
    ] {
        let keys = match ctx.repos.dispatch_slots.find_by_state(state).await {
            Ok(keys) => keys,
            Err(e) => {
                error!("Unable to load {} dispatch slots: {:?}", state.as_str(), e);
                continue;
            }
        };

        for key in keys
            .into_iter()
            .filter(|key| key.window_closes_at(tolerance) + grace < local_now)
        {
            match ctx
                .repos
                .dispatch_slots
                .transition(&key, state, SlotState::Missed)
                .await
            {
                Ok(true) => {
                    missed += 1;
                    ctx.stats.incr(DispatchCounter::MissedNotifications);
                    warn!(
                        "Missed notification for slot {}, the window closed without a successful send",
                        key
                    );
                }
                // Another dispatcher moved it on
                Ok(false) => (),
                Err(e) => error!("Unable to mark slot {} as missed: {:?}", key, e),
            }
        }
    }
    missed
}
