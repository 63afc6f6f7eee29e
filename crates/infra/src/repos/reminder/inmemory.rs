use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use chrono::{DateTime, NaiveDate, Utc};
use pill_reminder_domain::{Reminder, ValidReminder, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(
        &self,
        reminder: ValidReminder,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<Reminder> {
        let reminder = reminder.into_reminder(ID::default(), created_at);
        insert(&reminder, &self.reminders);
        Ok(reminder)
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        if save(reminder, &self.reminders) {
            Ok(())
        } else {
            Err(anyhow::Error::msg(format!(
                "Reminder with id: {} does not exist",
                reminder.id
            )))
        }
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_by_patient(&self, patient_id: &str) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |reminder| {
            reminder.patient_id == patient_id
        }))
    }

    async fn find_eligible(&self, date: NaiveDate) -> anyhow::Result<Vec<Reminder>> {
        Ok(find_by(&self.reminders, |reminder| reminder.is_eligible(date)))
    }
}
