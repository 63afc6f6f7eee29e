use chrono_tz::Tz;
use pill_reminder_domain::NotificationCadence;
use std::{fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: String,
    /// Sent along with every request so the receiver can verify the sender
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the status endpoint to run on
    pub port: usize,
    /// Timezone the patients' schedules are written in. Weekdays and
    /// times of day are evaluated on this wall clock.
    pub timezone: Tz,
    /// Window tolerance and tick interval of the dispatch job
    pub cadence: NotificationCadence,
    /// Upper bound on a single notification send, so that one slow
    /// recipient cannot hold up a whole tick
    pub send_timeout: Duration,
    /// Where notifications are posted. Notifications are only logged
    /// when this is not set.
    pub notification_webhook: Option<WebhookSettings>,
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let port = parse_env("PORT", 5000);
        let timezone = parse_env("REMINDER_TIMEZONE", chrono_tz::UTC);

        // Validated as a pair: an invalid combination falls back as a whole
        let default_cadence = NotificationCadence::default();
        let tolerance_minutes = parse_env(
            "REMINDER_WINDOW_MINUTES",
            default_cadence.tolerance().num_minutes(),
        );
        let tick_secs = parse_env(
            "REMINDER_TICK_SECONDS",
            default_cadence.tick_interval().as_secs(),
        );
        let cadence = match NotificationCadence::new(tolerance_minutes, tick_secs) {
            Ok(cadence) => cadence,
            Err(e) => {
                warn!("{}. Falling back to the default cadence: {:?}.", e, default_cadence);
                default_cadence
            }
        };

        let send_timeout = Duration::from_secs(parse_env("NOTIFICATION_SEND_TIMEOUT_SECS", 5));

        let notification_webhook = match std::env::var("NOTIFICATION_WEBHOOK_URL") {
            Ok(url) => {
                let key = std::env::var("NOTIFICATION_WEBHOOK_KEY").unwrap_or_default();
                if key.is_empty() {
                    warn!("NOTIFICATION_WEBHOOK_KEY is not set, webhook requests will carry an empty key.");
                }
                Some(WebhookSettings { url, key })
            }
            Err(_) => {
                info!("Did not find NOTIFICATION_WEBHOOK_URL environment variable. Notifications will only be logged.");
                None
            }
        };

        Self {
            port,
            timezone,
            cadence,
            send_timeout,
            notification_webhook,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
