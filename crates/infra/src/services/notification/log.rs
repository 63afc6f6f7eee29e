use super::{INotificationGateway, SendError};
use tracing::info;

/// Used when no notification channel is configured
pub struct LogNotificationGateway {}

#[async_trait::async_trait]
impl INotificationGateway for LogNotificationGateway {
    async fn send(&self, recipient_id: &str, title: &str, body: &str) -> Result<(), SendError> {
        info!(recipient_id, title, body, "Notification");
        Ok(())
    }
}
