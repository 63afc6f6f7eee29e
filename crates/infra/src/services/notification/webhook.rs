use super::{INotificationGateway, NotificationPayload, SendError};
use crate::config::WebhookSettings;
use reqwest::Client;
use std::time::Duration;

const WEBHOOK_KEY_HEADER: &str = "pill-reminder-webhook-key";

/// Posts every notification as json to a webhook, which forwards it
/// to the patient
pub struct WebhookNotificationGateway {
    client: Client,
    settings: WebhookSettings,
    timeout: Duration,
}

impl WebhookNotificationGateway {
    pub fn new(settings: WebhookSettings, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            settings,
            timeout,
        })
    }
}

#[async_trait::async_trait]
impl INotificationGateway for WebhookNotificationGateway {
    async fn send(&self, recipient_id: &str, title: &str, body: &str) -> Result<(), SendError> {
        let payload = NotificationPayload {
            recipient_id: recipient_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };

        let res = self
            .client
            .post(&self.settings.url)
            .header(WEBHOOK_KEY_HEADER, &self.settings.key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SendError::Timeout(self.timeout)
                } else {
                    SendError::Transport(e.to_string())
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(SendError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::{json, Value};
    use std::{net::TcpListener, sync::Mutex};

    #[derive(Default)]
    struct Received {
        requests: Mutex<Vec<(Option<String>, Value)>>,
    }

    async fn accept(
        req: HttpRequest,
        body: web::Json<Value>,
        received: web::Data<Received>,
    ) -> HttpResponse {
        let key = req
            .headers()
            .get(WEBHOOK_KEY_HEADER)
            .and_then(|key| key.to_str().ok())
            .map(String::from);
        received
            .requests
            .lock()
            .unwrap()
            .push((key, body.into_inner()));
        HttpResponse::Ok().finish()
    }

    async fn reject() -> HttpResponse {
        HttpResponse::InternalServerError().finish()
    }

    async fn stall() -> HttpResponse {
        actix_web::rt::time::sleep(Duration::from_secs(2)).await;
        HttpResponse::Ok().finish()
    }

    // Launch a webhook receiver as a background task
    fn spawn_receiver() -> (String, web::Data<Received>) {
        let received = web::Data::new(Received::default());
        let data = received.clone();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/accept", web::post().to(accept))
                .route("/reject", web::post().to(reject))
                .route("/stall", web::post().to(stall))
        })
        .listen(listener)
        .unwrap()
        .workers(1)
        .run();
        actix_web::rt::spawn(server);

        (format!("http://127.0.0.1:{}", port), received)
    }

    fn gateway(url: String, timeout: Duration) -> WebhookNotificationGateway {
        let settings = WebhookSettings {
            url,
            key: "webhook-secret".into(),
        };
        WebhookNotificationGateway::new(settings, timeout).unwrap()
    }

    #[actix_web::test]
    async fn it_posts_the_notification_with_the_key() {
        let (address, received) = spawn_receiver();
        let gateway = gateway(format!("{}/accept", address), Duration::from_secs(5));

        gateway
            .send("patient-1", "Time to take Aspirin", "Doctor's instructions: With water")
            .await
            .expect("Expected webhook to accept the notification");

        let requests = received.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (key, body) = &requests[0];
        assert_eq!(key.as_deref(), Some("webhook-secret"));
        assert_eq!(
            body,
            &json!({
                "recipientId": "patient-1",
                "title": "Time to take Aspirin",
                "body": "Doctor's instructions: With water"
            })
        );
    }

    #[actix_web::test]
    async fn it_maps_error_statuses_to_rejected() {
        let (address, _) = spawn_receiver();
        let gateway = gateway(format!("{}/reject", address), Duration::from_secs(5));

        let res = gateway.send("patient-1", "title", "body").await;
        assert!(matches!(res, Err(SendError::Rejected(500))));
    }

    #[actix_web::test]
    async fn it_gives_up_on_a_stalled_webhook() {
        let (address, _) = spawn_receiver();
        let timeout = Duration::from_millis(100);
        let gateway = gateway(format!("{}/stall", address), timeout);

        let res = gateway.send("patient-1", "title", "body").await;
        assert!(matches!(res, Err(SendError::Timeout(t)) if t == timeout));
    }

    #[actix_web::test]
    async fn it_reports_unreachable_webhooks_as_transport_errors() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let gateway = gateway(format!("http://127.0.0.1:{}/accept", port), Duration::from_secs(5));

        let res = gateway.send("patient-1", "title", "body").await;
        assert!(matches!(res, Err(SendError::Transport(_))));
    }
}
