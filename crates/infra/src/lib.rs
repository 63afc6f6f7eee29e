mod config;
mod repos;
mod services;
mod stats;
mod system;

pub use config::{Config, WebhookSettings};
pub use repos::{IDispatchSlotRepo, IReminderRepo, Repos};
pub use services::*;
pub use stats::{DispatchCounter, DispatchStats, DispatchStatsSnapshot};
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ReminderContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub notifications: Arc<dyn INotificationGateway>,
    pub stats: Arc<DispatchStats>,
}

struct ContextParams {
    pub postgres_connection_string: Option<String>,
}

impl ReminderContext {
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            notifications: Arc::new(LogNotificationGateway {}),
            stats: Default::default(),
        }
    }

    async fn create(params: ContextParams) -> Self {
        let repos = match params.postgres_connection_string {
            Some(connection_string) => match Repos::create_postgres(&connection_string).await {
                Ok(repos) => repos,
                Err(e) => {
                    // The dispatcher keeps running, with state lost on restart
                    error!("Unable to set up postgres: {:?}. Going to use inmemory repos.", e);
                    Repos::create_inmemory()
                }
            },
            None => {
                info!("DATABASE_URL env var was not provided. Going to use inmemory repos.");
                Repos::create_inmemory()
            }
        };
        let config = Config::new();
        let notifications = create_notification_gateway(&config);

        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            notifications,
            stats: Default::default(),
        }
    }
}

fn create_notification_gateway(config: &Config) -> Arc<dyn INotificationGateway> {
    if let Some(settings) = &config.notification_webhook {
        match WebhookNotificationGateway::new(settings.clone(), config.send_timeout) {
            Ok(gateway) => return Arc::new(gateway),
            Err(e) => warn!(
                "Unable to create the webhook notification gateway: {:?}. Notifications will only be logged.",
                e
            ),
        }
    }
    Arc::new(LogNotificationGateway {})
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> ReminderContext {
    ReminderContext::create(ContextParams {
        postgres_connection_string: std::env::var("DATABASE_URL").ok(),
    })
    .await
}
