use crate::shared::usecase::UseCase;
use pill_reminder_domain::{NewReminder, Reminder, ValidationError};
use pill_reminder_infra::ReminderContext;

#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub reminder: NewReminder,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    InvalidReminder(ValidationError),
    StorageError,
}

impl From<ValidationError> for UseCaseErrors {
    fn from(e: ValidationError) -> Self {
        Self::InvalidReminder(e)
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let reminder = self.reminder.clone().validate()?;

        ctx.repos
            .reminders
            .insert(reminder, ctx.sys.now())
            .await
            .map_err(|_| UseCaseErrors::StorageError)
    }
}
