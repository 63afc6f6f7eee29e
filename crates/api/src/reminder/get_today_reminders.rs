use crate::shared::{local_time, usecase::UseCase};
use pill_reminder_domain::Reminder;
use pill_reminder_infra::ReminderContext;

#[derive(Debug)]
pub struct GetTodayRemindersUseCase {
    pub patient_id: String,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetTodayRemindersUseCase {
    type Response = Vec<Reminder>;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "GetTodayReminders";

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
            .filter(|r| r.is_eligible(today))
            .collect())
    }
}
