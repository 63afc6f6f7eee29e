use pill_reminder_api::Application;
use pill_reminder_infra::{setup_context, ReminderContext};

pub struct TestApp {
    pub ctx: ReminderContext,
    pub address: String,
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut ctx = setup_context().await;
    ctx.config.port = 0; // Random port

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp { ctx, address }
}
