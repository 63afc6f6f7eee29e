use super::IReminderRepo;
use chrono::{DateTime, NaiveDate, Utc};
use pill_reminder_domain::{Reminder, Schedule, ValidReminder, ID};
use sqlx::{
    types::{Json, Uuid},
    FromRow, PgPool,
};

pub struct PostgresReminderRepo {
    pool: PgPool,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderRaw {
    reminder_uid: Uuid,
    patient_id: String,
    medicine_name: String,
    sickness_type: String,
    doctor_instructions: String,
    dosage: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    schedule: Json<Schedule>,
    created_at: DateTime<Utc>,
    is_active: bool,
}

impl From<ReminderRaw> for Reminder {
    fn from(raw: ReminderRaw) -> Self {
        Self {
            id: raw.reminder_uid.into(),
            patient_id: raw.patient_id,
            medicine_name: raw.medicine_name,
            sickness_type: raw.sickness_type,
            doctor_instructions: raw.doctor_instructions,
            dosage: raw.dosage,
            start_date: raw.start_date,
            end_date: raw.end_date,
            schedule: raw.schedule.0,
            created_at: raw.created_at,
            is_active: raw.is_active,
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(
        &self,
        reminder: ValidReminder,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<Reminder> {
        let reminder = reminder.into_reminder(ID::default(), created_at);
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, patient_id, medicine_name, sickness_type, doctor_instructions,
             dosage, start_date, end_date, schedule, created_at, is_active)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.patient_id)
        .bind(&reminder.medicine_name)
        .bind(&reminder.sickness_type)
        .bind(&reminder.doctor_instructions)
        .bind(&reminder.dosage)
        .bind(reminder.start_date)
        .bind(reminder.end_date)
        .bind(Json(&reminder.schedule))
        .bind(reminder.created_at)
        .bind(reminder.is_active)
        .execute(&self.pool)
        .await?;

        Ok(reminder)
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        // Only the active flag changes after creation
        let updated = sqlx::query(
            r#"
            UPDATE reminders
            SET is_active = $2
            WHERE reminder_uid = $1
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(reminder.is_active)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(anyhow::Error::msg(format!(
                "Reminder with id: {} does not exist",
                reminder.id
            )));
        }
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.reminder_uid = $1
            "#,
        )
        .bind(reminder_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()
        .flatten()
        .map(|r| r.into())
    }

    async fn find_by_patient(&self, patient_id: &str) -> anyhow::Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.patient_id = $1
            ORDER BY r.created_at
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders.into_iter().map(|r| r.into()).collect())
    }

    async fn find_eligible(&self, date: NaiveDate) -> anyhow::Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, ReminderRaw>(
            r#"
            SELECT * FROM reminders AS r
            WHERE r.is_active AND r.start_date <= $1 AND r.end_date >= $1
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders.into_iter().map(|r| r.into()).collect())
    }
}
