mod inmemory;
mod postgres;

use chrono::NaiveDate;
pub use inmemory::InMemoryDispatchSlotRepo;
use pill_reminder_domain::{SlotKey, SlotState};
pub use postgres::PostgresDispatchSlotRepo;

/// Dedup state of the dispatch engine, keyed by `SlotKey`.
///
/// `claim` is the atomic check-and-set that gives at-most-once delivery,
/// also when several dispatchers share the same storage.
#[async_trait::async_trait]
pub trait IDispatchSlotRepo: Send + Sync {
    /// Moves an unknown or `Pending` slot to `Claimed`. Returns false
    /// when the slot is already claimed, sent or missed.
    async fn claim(&self, key: &SlotKey) -> anyhow::Result<bool>;
    /// Moves the slot from `from` to `to`, but only if it is still in
    /// `from`. Returns false when another dispatcher got there first.
    /// Fails on transitions the slot lifecycle does not allow.
    async fn transition(
        &self,
        key: &SlotKey,
        from: SlotState,
        to: SlotState,
    ) -> anyhow::Result<bool>;
    async fn find(&self, key: &SlotKey) -> anyhow::Result<Option<SlotState>>;
    async fn find_by_state(&self, state: SlotState) -> anyhow::Result<Vec<SlotKey>>;
    /// Removes every slot dated before `date`
    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64>;
}

#[cfg(test)]
mod tests {
    use crate::{setup_context, ReminderContext};
    use chrono::{NaiveDate, Utc, Weekday};
    use pill_reminder_domain::{NewReminder, Schedule, SlotKey, SlotState};

    async fn create_contexts() -> Vec<ReminderContext> {
        vec![ReminderContext::create_inmemory(), setup_context().await]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Slots reference a stored reminder
    async fn slot_key(ctx: &ReminderContext, slot_date: NaiveDate) -> SlotKey {
        let reminder = NewReminder {
            patient_id: "patient".into(),
            medicine_name: "Ibuprofen".into(),
            sickness_type: "Pain".into(),
            doctor_instructions: "With water".into(),
            dosage: "".into(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            schedule: Schedule::new(vec!["09:00".parse().unwrap()], vec![Weekday::Mon]),
        }
        .validate()
        .unwrap();
        let reminder = ctx
            .repos
            .reminders
            .insert(reminder, Utc::now())
            .await
            .unwrap();
        SlotKey {
            reminder_id: reminder.id,
            date: slot_date,
            time: "09:00".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn a_slot_can_only_be_claimed_once_at_a_time() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let key = slot_key(&ctx, date(2024, 3, 4)).await;

            assert_eq!(slots.find(&key).await.unwrap(), None);
            assert!(slots.claim(&key).await.unwrap());
            assert!(!slots.claim(&key).await.unwrap());
            assert_eq!(slots.find(&key).await.unwrap(), Some(SlotState::Claimed));

            // Released after a failed send
            assert!(slots
                .transition(&key, SlotState::Claimed, SlotState::Pending)
                .await
                .unwrap());
            assert!(slots
                .find_by_state(SlotState::Pending)
                .await
                .unwrap()
                .contains(&key));
            assert!(slots.claim(&key).await.unwrap());

            assert!(slots
                .transition(&key, SlotState::Claimed, SlotState::Sent)
                .await
                .unwrap());
            assert!(!slots.claim(&key).await.unwrap());
            assert_eq!(slots.find(&key).await.unwrap(), Some(SlotState::Sent));
        }
    }

    #[tokio::test]
    async fn missed_slots_are_never_claimed_again() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let key = slot_key(&ctx, date(2024, 2, 5)).await;

            assert!(slots.claim(&key).await.unwrap());
            slots
                .transition(&key, SlotState::Claimed, SlotState::Pending)
                .await
                .unwrap();
            assert!(slots
                .transition(&key, SlotState::Pending, SlotState::Missed)
                .await
                .unwrap());
            assert!(!slots.claim(&key).await.unwrap());
            assert!(slots
                .find_by_state(SlotState::Missed)
                .await
                .unwrap()
                .contains(&key));
        }
    }

    #[tokio::test]
    async fn delete_before_prunes_old_dates() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let old = slot_key(&ctx, date(2023, 6, 1)).await;
            let recent = slot_key(&ctx, date(2023, 6, 15)).await;
            for key in &[&old, &recent] {
                assert!(slots.claim(key).await.unwrap());
                slots
                    .transition(key, SlotState::Claimed, SlotState::Sent)
                    .await
                    .unwrap();
            }

            assert!(slots.delete_before(date(2023, 6, 15)).await.unwrap() >= 1);
            assert_eq!(slots.find(&old).await.unwrap(), None);
            assert_eq!(slots.find(&recent).await.unwrap(), Some(SlotState::Sent));
        }
    }

    #[tokio::test]
    async fn a_stale_sweep_does_not_overwrite_a_delivered_slot() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let key = slot_key(&ctx, date(2024, 4, 1)).await;

            assert!(slots.claim(&key).await.unwrap());
            slots
                .transition(&key, SlotState::Claimed, SlotState::Pending)
                .await
                .unwrap();
            let stale_pending = slots.find_by_state(SlotState::Pending).await.unwrap();
            assert!(stale_pending.contains(&key));

            // Another dispatcher delivers in the meantime
            assert!(slots.claim(&key).await.unwrap());
            assert!(slots
                .transition(&key, SlotState::Claimed, SlotState::Sent)
                .await
                .unwrap());

            assert!(!slots
                .transition(&key, SlotState::Pending, SlotState::Missed)
                .await
                .unwrap());
            assert_eq!(slots.find(&key).await.unwrap(), Some(SlotState::Sent));
        }
    }

    #[tokio::test]
    async fn claimed_slots_can_be_closed_as_missed() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let key = slot_key(&ctx, date(2024, 4, 8)).await;

            assert!(!slots
                .transition(&key, SlotState::Claimed, SlotState::Missed)
                .await
                .unwrap());
            assert_eq!(slots.find(&key).await.unwrap(), None);

            assert!(slots.claim(&key).await.unwrap());
            assert!(slots
                .transition(&key, SlotState::Claimed, SlotState::Missed)
                .await
                .unwrap());
            assert!(!slots
                .transition(&key, SlotState::Claimed, SlotState::Sent)
                .await
                .unwrap());
            assert_eq!(slots.find(&key).await.unwrap(), Some(SlotState::Missed));
        }
    }

    #[tokio::test]
    async fn it_rejects_transitions_outside_the_lifecycle() {
        for ctx in create_contexts().await {
            let slots = &ctx.repos.dispatch_slots;
            let key = slot_key(&ctx, date(2024, 4, 15)).await;
            assert!(slots.claim(&key).await.unwrap());
            assert!(slots
                .transition(&key, SlotState::Sent, SlotState::Pending)
                .await
                .is_err());
            assert_eq!(slots.find(&key).await.unwrap(), Some(SlotState::Claimed));
        }
    }
}
