mod notification;

pub use notification::{
    INotificationGateway, LogNotificationGateway, NotificationPayload, SendError,
    WebhookNotificationGateway,
};
