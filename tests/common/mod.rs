#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parking_monitor::config::BackendConfig;

/// how a mock sensor endpoint answers
#[derive(Clone, Debug)]
pub enum SensorReply {
    Distance(f64),
    Status(u16),
    Raw(&'static str),
    Hang,
}

pub type SensorScript = Arc<Mutex<HashMap<usize, SensorReply>>>;

/// serve a router on an ephemeral port, return its base url
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// a base url nothing listens on
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn backend_config(sensor: &str, parking: &str) -> BackendConfig {
    BackendConfig {
        sensor_api_url: sensor.to_string(),
        parking_api_url: parking.to_string(),
        request_timeout_ms: 300,
    }
}

async fn sensor_handler(State(script): State<SensorScript>, Path(index): Path<usize>) -> Response {
    let reply = script.lock().unwrap().get(&index).cloned();
    match reply {
        Some(SensorReply::Distance(d)) => Json(json!({ "distance": d })).into_response(),
        Some(SensorReply::Status(code)) => StatusCode::from_u16(code).unwrap().into_response(),
        Some(SensorReply::Raw(body)) => body.into_response(),
        Some(SensorReply::Hang) => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "distance": 1.0 })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// io backend with scripted sensors; led accepts, gate fails, bell accepts
pub fn io_backend(script: SensorScript) -> Router {
    Router::new()
        .route("/sensor/:index/distance", get(sensor_handler))
        .route("/status", get(|| async { Json(json!({ "sensors": 4, "uptime": 12 })) }))
        .route("/led/:index/:action", get(|| async { "ok" }))
        .route("/gate/:action", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/bell/:action", get(|| async { StatusCode::OK }))
        .with_state(script)
}

pub fn script(replies: &[(usize, SensorReply)]) -> SensorScript {
    Arc::new(Mutex::new(replies.iter().cloned().collect()))
}

pub fn status_body() -> serde_json::Value {
    json!({
        "status": "active",
        "resolution": "1280x720",
        "fps": 20,
        "frame_count": 3021,
        "total_vehicles": 3,
        "vehicle_counts": { "blue": 1, "yellow": 1, "white": 1 },
        "parking_status": [],
        "active_warnings": 0,
        "warnings": [],
        "current_time": "2024-05-01 12:00:00",
        "gpio_available": false
    })
}

pub fn spots_body() -> serde_json::Value {
    json!([
        { "id": 1, "occupied": true, "vehicle_id": 7, "vehicle_color": "blue" },
        { "id": 2, "occupied": false, "vehicle_id": null, "vehicle_color": null },
        { "id": 3, "occupied": false, "vehicle_id": null, "vehicle_color": null },
        { "id": 4, "occupied": true, "vehicle_id": 9, "vehicle_color": "white" },
        { "id": 5, "occupied": false, "vehicle_id": null, "vehicle_color": null },
        { "id": 6, "occupied": true, "vehicle_id": 11, "vehicle_color": "yellow" },
        { "id": 7, "occupied": false, "vehicle_id": null, "vehicle_color": null },
        { "id": 8, "occupied": false, "vehicle_id": null, "vehicle_color": null }
    ])
}

/// parking backend where either call can be broken
pub fn parking_backend(status_ok: bool, spots: Option<&'static str>) -> Router {
    let status = move || async move {
        if status_ok {
            Json(status_body()).into_response()
        } else {
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    };
    let spots_route = move || async move {
        match spots {
            Some(raw) => raw.into_response(),
            None => Json(spots_body()).into_response(),
        }
    };
    Router::new()
        .route("/status", get(status))
        .route("/api/parking_spots", get(spots_route))
}
