use crate::shared::{local_time, usecase::UseCase};
use pill_reminder_domain::Reminder;
use pill_reminder_infra::ReminderContext;

/// Reminders of a patient that have not been cancelled or run out,
/// including the ones that have not started yet
#[derive(Debug)]
pub struct GetActiveRemindersUseCase {
    pub patient_id: String,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetActiveRemindersUseCase {
    type Response = Vec<Reminder>;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "GetActiveReminders";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let today = local_time(ctx.sys.now(), ctx).date();

        let reminders = ctx
            .repos
            .reminders
            .find_by_patient(&self.patient_id)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;

        Ok(reminders
            .into_iter()
            .filter(|r| r.is_current(today))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        reminder::create_reminder::CreateReminderUseCase,
        shared::{
            test_helpers::{date, new_reminder, utc, StaticTimeSys},
            usecase::execute,
        },
    };
    use chrono::Weekday;
    use std::sync::Arc;

    #[actix_web::test]
    async fn it_keeps_upcoming_and_ongoing_reminders() {
        let mut ctx = ReminderContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(utc(2024, 1, 15, 12, 0)));

        let mut ongoing = new_reminder("patient", &["09:00"], &[Weekday::Mon]);
        ongoing.medicine_name = "Ongoing".into();
        let mut upcoming = new_reminder("patient", &["09:00"], &[Weekday::Mon]);
        upcoming.medicine_name = "Upcoming".into();
        upcoming.start_date = date(2024, 2, 1);
        upcoming.end_date = date(2024, 2, 10);
        let mut finished = new_reminder("patient", &["09:00"], &[Weekday::Mon]);
        finished.medicine_name = "Finished".into();
        finished.end_date = date(2024, 1, 14);

        for reminder in vec![ongoing, upcoming, finished] {
            execute(CreateReminderUseCase { reminder }, &ctx)
                .await
                .unwrap();
        }

        let usecase = GetActiveRemindersUseCase {
            patient_id: "patient".into(),
        };
        let mut names = execute(usecase, &ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.medicine_name)
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["Ongoing".to_string(), "Upcoming".to_string()]);
    }
}
