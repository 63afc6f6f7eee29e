use actix_web::{web, HttpResponse};
use pill_reminder_infra::{DispatchStatsSnapshot, ReminderContext};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct APIResponse {
    pub message: String,
    pub dispatch: DispatchStatsSnapshot,
}

async fn status(ctx: web::Data<ReminderContext>) -> HttpResponse {
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        dispatch: ctx.stats.snapshot(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}
