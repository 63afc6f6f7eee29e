pub mod cancel_reminder;
pub mod create_reminder;
pub mod get_active_reminders;
pub mod get_today_reminders;
