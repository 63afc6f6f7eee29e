use super::IDispatchSlotRepo;
use chrono::NaiveDate;
use pill_reminder_domain::{SlotKey, SlotState, TimeOfDay};
use sqlx::{types::Uuid, FromRow, PgPool};

/// Shared dedup table for deployments running several dispatchers
pub struct PostgresDispatchSlotRepo {
    pool: PgPool,
}

impl PostgresDispatchSlotRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SlotKeyRaw {
    reminder_uid: Uuid,
    slot_date: NaiveDate,
    slot_minute: i32,
}

#[derive(Debug, FromRow)]
struct SlotStateRaw {
    state: String,
}

impl SlotKeyRaw {
    fn into_key(self) -> anyhow::Result<SlotKey> {
        Ok(SlotKey {
            reminder_id: self.reminder_uid.into(),
            date: self.slot_date,
            time: TimeOfDay::from_minute_of_day(self.slot_minute as u32)?,
        })
    }
}

#[async_trait::async_trait]
impl IDispatchSlotRepo for PostgresDispatchSlotRepo {
    async fn claim(&self, key: &SlotKey) -> anyhow::Result<bool> {
        // Inserts or takes over a pending row, RETURNING is empty otherwise
        let claimed = sqlx::query_as::<_, SlotStateRaw>(
            r#"
            INSERT INTO dispatch_slots AS s
            (reminder_uid, slot_date, slot_minute, state, updated_at)
            VALUES($1, $2, $3, 'claimed', now())
            ON CONFLICT (reminder_uid, slot_date, slot_minute)
            DO UPDATE SET state = 'claimed', updated_at = now()
            WHERE s.state = 'pending'
            RETURNING s.state
            "#,
        )
        .bind(key.reminder_id.inner_ref())
        .bind(key.date)
        .bind(key.time.minute_of_day() as i32)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claimed.is_some())
    }

    async fn transition(
        &self,
        key: &SlotKey,
        from: SlotState,
        to: SlotState,
    ) -> anyhow::Result<bool> {
        if !from.can_transition_to(to) {
            anyhow::bail!("Slot {} can not move from {} to {}", key, from.as_str(), to.as_str());
        }
        let updated = sqlx::query(
            r#"
            UPDATE dispatch_slots AS s
            SET state = $5, updated_at = now()
            WHERE s.reminder_uid = $1 AND s.slot_date = $2 AND s.slot_minute = $3
            AND s.state = $4
            "#,
        )
        .bind(key.reminder_id.inner_ref())
        .bind(key.date)
        .bind(key.time.minute_of_day() as i32)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated == 1)
    }

    async fn find(&self, key: &SlotKey) -> anyhow::Result<Option<SlotState>> {
        let raw = sqlx::query_as::<_, SlotStateRaw>(
            r#"
            SELECT s.state FROM dispatch_slots AS s
            WHERE s.reminder_uid = $1 AND s.slot_date = $2 AND s.slot_minute = $3
            "#,
        )
        .bind(key.reminder_id.inner_ref())
        .bind(key.date)
        .bind(key.time.minute_of_day() as i32)
        .fetch_optional(&self.pool)
        .await?;

        match raw {
            Some(raw) => Ok(Some(raw.state.parse::<SlotState>()?)),
            None => Ok(None),
        }
    }

    async fn find_by_state(&self, state: SlotState) -> anyhow::Result<Vec<SlotKey>> {
        let keys = sqlx::query_as::<_, SlotKeyRaw>(
            r#"
            SELECT s.reminder_uid, s.slot_date, s.slot_minute FROM dispatch_slots AS s
            WHERE s.state = $1
            "#,
        )
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?;

        keys.into_iter().map(|k| k.into_key()).collect()
    }

    async fn delete_before(&self, date: NaiveDate) -> anyhow::Result<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM dispatch_slots AS s
            WHERE s.slot_date < $1
            "#,
        )
        .bind(date)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(deleted)
    }
}
