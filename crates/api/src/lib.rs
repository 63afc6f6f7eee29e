mod dispatch;
mod job_schedulers;
pub mod reminder;
mod shared;
mod status;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
pub use dispatch::{DispatchEngine, TickError, TickReport};
use job_schedulers::start_send_reminders_job;
use pill_reminder_infra::ReminderContext;
pub use shared::usecase::{execute, UseCase};
use std::{net::TcpListener, sync::Arc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::info;
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    shutdown: watch::Sender<bool>,
    job: JoinHandle<()>,
}

impl Application {
    pub async fn new(context: ReminderContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;
        let (shutdown, job) = Application::start_job_schedulers(context);

        Ok(Self {
            server,
            port,
            shutdown,
            job,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_job_schedulers(context: ReminderContext) -> (watch::Sender<bool>, JoinHandle<()>) {
        let (shutdown, receiver) = watch::channel(false);
        let engine = Arc::new(DispatchEngine::new(context));
        let job = start_send_reminders_job(engine, receiver);
        (shutdown, job)
    }

    async fn configure_server(context: ReminderContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    /// Serves until the server is stopped, then stops the dispatch job
    /// once its current tick is done
    pub async fn start(self) -> Result<(), std::io::Error> {
        let res = self.server.await;

        info!("Server stopped, shutting down the send reminders job");
        let _ = self.shutdown.send(true);
        let _ = self.job.await;

        res
    }
}
