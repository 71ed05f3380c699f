use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use tokio::sync::Mutex;
use utoipa::{IntoParams, ToSchema};

use crate::model::attendance::{PunchType, ShiftLabel};
use crate::terminal::geofence::{GeofenceCheck, PositionReading};
use crate::terminal::machine::{Terminal, TerminalError, TerminalState};

pub type SharedTerminal = web::Data<Mutex<Terminal>>;

#[derive(Deserialize, IntoParams)]
pub struct StateQuery {
    /// Branch id from a scanned QR poster; auto-selects and persists the shop.
    pub branch: Option<String>,

    /// Surveyed shop latitude carried by some posters; with `lng`, overrides
    /// the registry's position for the geofence.
    pub lat: Option<f64>,

    pub lng: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct BranchRequest {
    #[schema(example = "315")]
    pub branch_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyRequest {
    #[schema(example = "K-007")]
    pub staff_id: String,

    #[schema(example = "4921")]
    pub pin: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = "In")]
    pub action: PunchType,

    #[schema(example = "Opening", nullable = true)]
    pub shift: Option<ShiftLabel>,
}

#[derive(Deserialize, ToSchema)]
pub struct ConnectivityRequest {
    pub online: bool,
}

fn error_response(err: &TerminalError) -> HttpResponse {
    match err {
        TerminalError::Credentials(_) => HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid ID or PIN"
        })),
        TerminalError::OutOfRange { distance_m } => {
            HttpResponse::Forbidden().json(serde_json::json!({
                "error": "Out of range",
                "distance_m": distance_m
            }))
        }
        TerminalError::Storage(e) => {
            tracing::error!(error = %e, "Terminal storage failure");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error"
            }))
        }
        other => HttpResponse::BadRequest().json(serde_json::json!({
            "error": other.to_string()
        })),
    }
}

fn state_body(terminal: &mut Terminal) -> serde_json::Value {
    let now = Local::now();
    let geofence = terminal.geofence();
    let state = terminal.state();
    let (staff, outcome) = match state {
        TerminalState::SessionActive { staff } => (Some(staff.employee_name.clone()), None),
        TerminalState::Result { outcome, .. } => (
            None,
            Some(serde_json::json!({
                "action": outcome.punch_type,
                "status": outcome.status,
                "hours_worked": outcome.hours_worked,
                "saved_offline": outcome.saved_offline
            })),
        ),
        _ => (None, None),
    };
    let step = state.name().to_string();

    serde_json::json!({
        "step": step,
        "clock": now.format("%H:%M:%S").to_string(),
        "date": now.format("%Y-%m-%d").to_string(),
        "shop": terminal.active_shop(),
        "shops": terminal.shops(),
        "staff": staff,
        "result": outcome,
        "geofence": geofence,
        "online": terminal.is_online(),
        "pending_sync": terminal.pending_sync(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

/// Terminal state view, also the QR entry point
#[utoipa::path(
    get,
    path = "/terminal/state",
    params(StateQuery),
    responses(
        (status = 200, description = "Current terminal state", body = Object)
    ),
    tag = "Terminal"
)]
pub async fn get_state(
    terminal: SharedTerminal,
    query: web::Query<StateQuery>,
) -> impl Responder {
    let coords = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };
    let mut terminal = terminal.lock().await;
    terminal.boot(query.branch.as_deref(), coords);
    HttpResponse::Ok().json(state_body(&mut terminal))
}

/// Manual branch selection
#[utoipa::path(
    post,
    path = "/terminal/branch",
    request_body = BranchRequest,
    responses(
        (status = 200, description = "Branch selected", body = Object),
        (status = 400, description = "Unknown branch")
    ),
    tag = "Terminal"
)]
pub async fn select_branch(
    terminal: SharedTerminal,
    payload: web::Json<BranchRequest>,
) -> impl Responder {
    let mut terminal = terminal.lock().await;
    match terminal.select_branch(&payload.branch_id) {
        Ok(()) => HttpResponse::Ok().json(state_body(&mut terminal)),
        Err(e) => error_response(&e),
    }
}

/// Switch branch: back to branch-setup, clears the sticky default
#[utoipa::path(
    post,
    path = "/terminal/branch/clear",
    responses(
        (status = 200, description = "Branch cleared", body = Object)
    ),
    tag = "Terminal"
)]
pub async fn clear_branch(terminal: SharedTerminal) -> impl Responder {
    let mut terminal = terminal.lock().await;
    match terminal.switch_branch() {
        Ok(()) => HttpResponse::Ok().json(state_body(&mut terminal)),
        Err(e) => error_response(&e),
    }
}

/// Credential entry
#[utoipa::path(
    post,
    path = "/terminal/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Session opened", body = Object),
        (status = 401, description = "Invalid ID or PIN")
    ),
    tag = "Terminal"
)]
pub async fn verify(
    terminal: SharedTerminal,
    payload: web::Json<VerifyRequest>,
) -> impl Responder {
    if payload.staff_id.trim().is_empty() || payload.pin.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Enter credentials"
        }));
    }
    let mut terminal = terminal.lock().await;
    match terminal.verify(payload.staff_id.trim(), &payload.pin).await {
        Ok(staff) => HttpResponse::Ok().json(serde_json::json!({
            "message": format!("Welcome {}", staff.employee_name),
            "staff": staff.employee_name
        })),
        Err(e) => error_response(&e),
    }
}

/// Device position report; doubles as the explicit geofence retry
#[utoipa::path(
    post,
    path = "/terminal/location",
    request_body = PositionReading,
    responses(
        (status = 200, description = "Geofence evaluated", body = GeofenceCheck)
    ),
    tag = "Terminal"
)]
pub async fn report_location(
    terminal: SharedTerminal,
    payload: web::Json<PositionReading>,
) -> impl Responder {
    let mut terminal = terminal.lock().await;
    match terminal.report_position(*payload) {
        Ok(check) => HttpResponse::Ok().json(check),
        Err(e) => error_response(&e),
    }
}

/// Clock in or out
#[utoipa::path(
    post,
    path = "/terminal/clock",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Punch recorded", body = Object, example = json!({
            "message": "In Recorded: On Time"
        })),
        (status = 400, description = "Punch rejected"),
        (status = 403, description = "Out of range")
    ),
    tag = "Terminal"
)]
pub async fn clock(terminal: SharedTerminal, payload: web::Json<ClockRequest>) -> impl Responder {
    let now = Local::now().naive_local();
    let mut terminal = terminal.lock().await;
    match terminal.clock(payload.action, payload.shift, now).await {
        Ok(outcome) => {
            let message = if outcome.saved_offline {
                format!("{} saved locally. Will sync when online.", outcome.punch_type)
            } else {
                format!("{} Recorded: {}", outcome.punch_type, outcome.status)
            };
            HttpResponse::Ok().json(serde_json::json!({
                "message": message,
                "status": outcome.status,
                "hours_worked": outcome.hours_worked,
                "saved_offline": outcome.saved_offline
            }))
        }
        Err(e) => error_response(&e),
    }
}

/// Result acknowledgement / session exit, ahead of the auto-return timer
#[utoipa::path(
    post,
    path = "/terminal/reset",
    responses(
        (status = 200, description = "Back to credential entry", body = Object)
    ),
    tag = "Terminal"
)]
pub async fn reset(terminal: SharedTerminal) -> impl Responder {
    let mut terminal = terminal.lock().await;
    terminal.reset();
    HttpResponse::Ok().json(state_body(&mut terminal))
}

/// Device connectivity event feed
#[utoipa::path(
    post,
    path = "/terminal/connectivity",
    request_body = ConnectivityRequest,
    responses(
        (status = 200, description = "Connectivity updated", body = Object)
    ),
    tag = "Terminal"
)]
pub async fn connectivity(
    terminal: SharedTerminal,
    connectivity: web::Data<std::sync::Arc<crate::terminal::connectivity::Connectivity>>,
    payload: web::Json<ConnectivityRequest>,
) -> impl Responder {
    connectivity.set_online(payload.online);
    let mut terminal = terminal.lock().await;
    HttpResponse::Ok().json(serde_json::json!({
        "online": payload.online,
        "pending_sync": terminal.pending_sync(),
        "step": terminal.state().name()
    }))
}
