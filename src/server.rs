//! ==============================================================================
//! server.rs - json view model for the dashboard
//! ==============================================================================
//!
//! routes:
//!     GET    /api/sensors                 last sensor snapshot
//!     GET    /api/parking                 last parking snapshot
//!     GET    /api/io-status               io backend status, fetched on demand
//!     GET    /api/alerts                  alert list, newest first
//!     DELETE /api/alerts                  dismiss all
//!     DELETE /api/alerts/:id              dismiss one
//!     POST   /api/led/:index/:action      on | off
//!     POST   /api/gate/:action            open | close
//!     POST   /api/bell/:action            ring | stop
//!
//! ==============================================================================

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::acquisition::AcquisitionService;
use crate::backend::{BellAction, GateAction, LedAction};
use crate::domain::{Alert, ParkingSnapshot, SensorSnapshot};
use crate::monitor::AlertLog;
use crate::state::SharedState;

#[derive(Clone)]
pub struct ApiState {
    pub state: SharedState,
    pub service: AcquisitionService,
    pub alerts: AlertLog,
}

pub fn router(api: ApiState) -> Router {
    Router::new()
        .route("/api/sensors", get(sensors_handler))
        .route("/api/parking", get(parking_handler))
        .route("/api/io-status", get(io_status_handler))
        .route("/api/alerts", get(alerts_handler).delete(dismiss_all_handler))
        .route("/api/alerts/:id", delete(dismiss_handler))
        .route("/api/led/:index/:action", post(led_handler))
        .route("/api/gate/:action", post(gate_handler))
        .route("/api/bell/:action", post(bell_handler))
        .layer(CorsLayer::permissive())
        .with_state(api)
}

pub async fn run_server(bind: &str, api: ApiState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("[STARTUP] ✓ Dashboard api live at http://{}", listener.local_addr()?);
    axum::serve(listener, router(api)).await?;
    Ok(())
}

async fn sensors_handler(State(api): State<ApiState>) -> Json<SensorSnapshot> {
    Json(api.state.read().await.sensors.clone())
}

async fn parking_handler(State(api): State<ApiState>) -> Json<ParkingSnapshot> {
    Json(api.state.read().await.parking.clone())
}

async fn io_status_handler(State(api): State<ApiState>) -> Json<serde_json::Value> {
    match api.service.fetch_io_status().await {
        Some(status) => Json(json!({ "online": true, "status": status })),
        None => Json(json!({ "online": false, "status": null })),
    }
}

async fn alerts_handler(State(api): State<ApiState>) -> Json<Vec<Alert>> {
    Json(api.alerts.snapshot())
}

async fn dismiss_handler(State(api): State<ApiState>, Path(id): Path<String>) -> StatusCode {
    if api.alerts.dismiss(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn dismiss_all_handler(State(api): State<ApiState>) -> StatusCode {
    api.alerts.dismiss_all();
    StatusCode::NO_CONTENT
}

fn control_reply(success: bool) -> Response {
    Json(json!({ "success": success })).into_response()
}

fn unknown_action(action: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "message": format!("unknown action: {}", action) })),
    )
        .into_response()
}

async fn led_handler(
    State(api): State<ApiState>,
    Path((index, action)): Path<(usize, String)>,
) -> Response {
    match LedAction::parse(&action) {
        Some(action) => control_reply(api.service.control_led(index, action).await),
        None => unknown_action(&action),
    }
}

async fn gate_handler(State(api): State<ApiState>, Path(action): Path<String>) -> Response {
    match GateAction::parse(&action) {
        Some(action) => control_reply(api.service.control_gate(action).await),
        None => unknown_action(&action),
    }
}

async fn bell_handler(State(api): State<ApiState>, Path(action): Path<String>) -> Response {
    match BellAction::parse(&action) {
        Some(action) => control_reply(api.service.control_bell(action).await),
        None => unknown_action(&action),
    }
}
