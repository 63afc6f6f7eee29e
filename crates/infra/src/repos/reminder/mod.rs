mod inmemory;
mod postgres;

use chrono::{DateTime, NaiveDate, Utc};
pub use inmemory::InMemoryReminderRepo;
use pill_reminder_domain::{Reminder, ValidReminder, ID};
pub use postgres::PostgresReminderRepo;

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    /// Persists a validated reminder, assigning its `ID`
    async fn insert(
        &self,
        reminder: ValidReminder,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<Reminder>;
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    async fn find_by_patient(&self, patient_id: &str) -> anyhow::Result<Vec<Reminder>>;
    /// Active reminders whose date range contains `date`, read as one snapshot
    async fn find_eligible(&self, date: NaiveDate) -> anyhow::Result<Vec<Reminder>>;
}
