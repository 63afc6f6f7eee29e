use crate::{
    error::ValidationError,
    schedule::Schedule,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A `Reminder` tells a patient to take a medicine at the times
/// described by its `Schedule`, for every date between `start_date`
/// and `end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ID,
    /// The recipient of the notifications
    pub patient_id: String,
    pub medicine_name: String,
    pub sickness_type: String,
    pub doctor_instructions: String,
    /// Free text, may be empty
    pub dosage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Schedule,
    pub created_at: DateTime<Utc>,
    /// Cleared when the `Reminder` is cancelled
    pub is_active: bool,
}

impl Reminder {
    /// Whether the `Reminder` should produce notifications on `today`
    pub fn is_eligible(&self, today: NaiveDate) -> bool {
        is_eligible(self, today)
    }

    /// Active and not yet past its end date, it might still be upcoming
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.is_active && self.end_date >= today
    }

    pub fn notification_title(&self) -> String {
        format!("Time to take {}", self.medicine_name)
    }

    pub fn notification_body(&self) -> String {
        let mut body = format!("Doctor's instructions: {}", self.doctor_instructions);
        if !self.dosage.trim().is_empty() {
            body.push_str(&format!(" Dosage: {}.", self.dosage.trim()));
        }
        body
    }
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

pub fn is_eligible(reminder: &Reminder, today: NaiveDate) -> bool {
    reminder.is_active && reminder.start_date <= today && today <= reminder.end_date
}

/// The fields a caller supplies to create a `Reminder`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub patient_id: String,
    pub medicine_name: String,
    pub sickness_type: String,
    pub doctor_instructions: String,
    #[serde(default)]
    pub dosage: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub schedule: Schedule,
}

/// A `NewReminder` that passed validation and can be handed to a store
#[derive(Debug, Clone)]
pub struct ValidReminder(NewReminder);

impl NewReminder {
    pub fn validate(self) -> Result<ValidReminder, ValidationError> {
        let required = [
            ("patientId", &self.patient_id),
            ("medicineName", &self.medicine_name),
            ("sicknessType", &self.sickness_type),
            ("doctorInstructions", &self.doctor_instructions),
        ];
        for (field, value) in required.iter() {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(*field));
            }
        }
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.schedule.times().is_empty() {
            return Err(ValidationError::EmptyScheduleTimes);
        }
        if self.schedule.days().is_empty() {
            return Err(ValidationError::EmptyScheduleDays);
        }
        Ok(ValidReminder(self))
    }
}

impl ValidReminder {
    /// Called by the store once it has assigned the identity
    pub fn into_reminder(self, id: ID, created_at: DateTime<Utc>) -> Reminder {
        let r = self.0;
        Reminder {
            id,
            patient_id: r.patient_id,
            medicine_name: r.medicine_name,
            sickness_type: r.sickness_type,
            doctor_instructions: r.doctor_instructions,
            dosage: r.dosage,
            start_date: r.start_date,
            end_date: r.end_date,
            schedule: r.schedule,
            created_at,
            is_active: true,
        }
    }
}
