use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

fn startup_instant() -> &'static Instant {
    static INSTANCE: OnceLock<Instant> = OnceLock::new();
    INSTANCE.get_or_init(Instant::now)
}

pub fn router() -> Router<AppState> {
    let _ = startup_instant();

    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/database", get(database_health))
        .route("/metrics", get(metrics))
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.store().ping().is_ok();
    Json(serde_json::json!({
        "status": if store_healthy { "ok" } else { "degraded" },
        "uptimeSecs": startup_instant().elapsed().as_secs(),
        "activeSessions": state.engine().session_count().await,
        "store": {
            "healthy": store_healthy,
        }
    }))
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store().ping().is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn database_health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let ping = state.store().ping();
    let latency_us = start.elapsed().as_micros() as u64;
    let records = state.store().count_session_records().unwrap_or(0);

    Json(serde_json::json!({
        "healthy": ping.is_ok(),
        "latencyUs": latency_us,
        "sessionRecords": records,
        "error": ping.err().map(|e| e.to_string()),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "uptimeSecs": state.uptime_secs(),
        "activeSessions": state.engine().session_count().await,
        "sseConnections": super::realtime::active_connections(),
        "engine": state.engine().metrics().snapshot(),
    }))
}
