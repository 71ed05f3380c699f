use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

use crate::model::presence::PresenceEntry;
use crate::terminal::presence::PresenceRoster;

/// Live roster of currently active staff
#[utoipa::path(
    get,
    path = "/presence",
    responses(
        (status = 200, description = "Staff active right now", body = [PresenceEntry])
    ),
    tag = "Presence"
)]
pub async fn live_roster(roster: web::Data<Arc<PresenceRoster>>) -> impl Responder {
    let live: Vec<PresenceEntry> = roster.snapshot(Utc::now());
    HttpResponse::Ok().json(serde_json::json!({
        "active": live.len(),
        "staff": live
    }))
}
