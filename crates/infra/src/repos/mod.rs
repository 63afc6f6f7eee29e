mod dispatch_slot;
mod reminder;
mod shared;

pub use dispatch_slot::IDispatchSlotRepo;
use dispatch_slot::{InMemoryDispatchSlotRepo, PostgresDispatchSlotRepo};
pub use reminder::IReminderRepo;
use reminder::{InMemoryReminderRepo, PostgresReminderRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub dispatch_slots: Arc<dyn IDispatchSlotRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        info!("DB CHECKING CONNECTION ... [done]");
        sqlx::migrate!().run(&pool).await?;
        info!("DB MIGRATIONS ... [done]");

        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(pool.clone())),
            dispatch_slots: Arc::new(PostgresDispatchSlotRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminders: Arc::new(InMemoryReminderRepo::new()),
            dispatch_slots: Arc::new(InMemoryDispatchSlotRepo::new()),
        }
    }
}
