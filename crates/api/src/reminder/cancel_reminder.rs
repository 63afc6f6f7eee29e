use crate::shared::usecase::UseCase;
use pill_reminder_domain::{Reminder, ID};
use pill_reminder_infra::ReminderContext;

/// Stops a `Reminder` from producing notifications, or resumes it
/// when `reactivate` is set
#[derive(Debug)]
pub struct CancelReminderUseCase {
    pub reminder_id: ID,
    pub reactivate: bool,
}

#[derive(Debug)]
pub enum UseCaseErrors {
    NotFound(ID),
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for CancelReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "CancelReminder";

    async fn execute(&mut self, ctx: &ReminderContext) -> Result<Self::Response, Self::Errors> {
        let mut reminder = match ctx.repos.reminders.find(&self.reminder_id).await {
            Some(reminder) => reminder,
            None => return Err(UseCaseErrors::NotFound(self.reminder_id.clone())),
        };

        reminder.is_active = self.reactivate;
        ctx.repos
            .reminders
            .save(&reminder)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;

        Ok(reminder)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        reminder::create_reminder::CreateReminderUseCase,
        shared::{test_helpers::new_reminder, usecase::execute},
    };
    use chrono::Weekday;

    #[actix_web::test]
    async fn it_cancels_and_reactivates() {
        let ctx = ReminderContext::create_inmemory();
        let reminder = execute(
            CreateReminderUseCase {
                reminder: new_reminder("patient", &["21:00"], &[Weekday::Sun]),
            },
            &ctx,
        )
        .await
        .unwrap();

        let cancelled = execute(
            CancelReminderUseCase {
                reminder_id: reminder.id.clone(),
                reactivate: false,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert!(!cancelled.is_active);
        assert!(!ctx.repos.reminders.find(&reminder.id).await.unwrap().is_active);

        let reactivated = execute(
            CancelReminderUseCase {
                reminder_id: reminder.id.clone(),
                reactivate: true,
            },
            &ctx,
        )
        .await
        .unwrap();
        assert!(reactivated.is_active);
    }

    #[actix_web::test]
    async fn it_reports_unknown_reminders() {
        let ctx = ReminderContext::create_inmemory();
        let reminder_id = ID::default();
        let res = execute(
            CancelReminderUseCase {
                reminder_id: reminder_id.clone(),
                reactivate: false,
            },
            &ctx,
        )
        .await;
        assert!(matches!(res, Err(UseCaseErrors::NotFound(id)) if id == reminder_id));
    }
}
