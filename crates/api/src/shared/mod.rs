pub mod usecase;

use chrono::{DateTime, NaiveDateTime, Utc};
use pill_reminder_infra::ReminderContext;

/// Wall clock time in the timezone the schedules are written in
pub fn local_time(now: DateTime<Utc>, ctx: &ReminderContext) -> NaiveDateTime {
    now.with_timezone(&ctx.config.timezone).naive_local()
}

#[cfg(test)]
pub mod test_helpers {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
    use pill_reminder_domain::{NewReminder, Schedule};
    use pill_reminder_infra::ISys;

    pub struct StaticTimeSys(pub DateTime<Utc>);
    impl ISys for StaticTimeSys {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    pub fn new_reminder(patient_id: &str, times: &[&str], days: &[Weekday]) -> NewReminder {
        NewReminder {
            patient_id: patient_id.into(),
            medicine_name: "Lisinopril".into(),
            sickness_type: "Hypertension".into(),
            doctor_instructions: "Take in the morning".into(),
            dosage: "10mg".into(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            schedule: Schedule::new(
                times.iter().map(|t| t.parse().unwrap()),
                days.iter().copied(),
            ),
        }
    }
}
