mod log;
mod webhook;

pub use self::log::LogNotificationGateway;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
pub use webhook::WebhookNotificationGateway;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Notification channel could not be reached: {0}")]
    Transport(String),
    #[error("Notification channel rejected the notification with status {0}")]
    Rejected(u16),
    #[error("Notification was not delivered within {0:?}")]
    Timeout(Duration),
}

/// What is delivered to the patient
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
}

/// The external channel notifications are sent through.
///
/// Callers treat every error as retryable and do not inspect it further.
#[async_trait::async_trait]
pub trait INotificationGateway: Send + Sync {
    async fn send(&self, recipient_id: &str, title: &str, body: &str) -> Result<(), SendError>;
}
