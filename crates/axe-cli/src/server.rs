//! Axum server emulating the device API, for dashboard development without hardware.

use axe_types::{ApiVersion, SystemApi, SystemApiError, SystemInfo, SystemUpdate};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Largest OTA image accepted.
const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

pub use axe_client::mock::OTA_REPLY;

pub struct AppState {
    pub api: Arc<dyn SystemApi>,
    pub version: ApiVersion,
}

type Reply<T> = Result<T, (StatusCode, String)>;

pub fn router(state: Arc<AppState>) -> Router {
    let v = state.version;
    Router::new()
        .route(v.info_path(), get(handle_info))
        .route(v.restart_path(), post(handle_restart))
        .route(v.system_path(), patch(handle_update))
        .route(
            v.ota_path(axe_types::OtaTarget::Firmware),
            post(handle_ota),
        )
        .route(v.ota_path(axe_types::OtaTarget::Www), post(handle_ota))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn internal(e: SystemApiError) -> (StatusCode, String) {
    tracing::warn!(error = %e, "backend call failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

async fn handle_info(State(state): State<Arc<AppState>>) -> Reply<Json<SystemInfo>> {
    state.api.get_info().await.map(Json).map_err(internal)
}

async fn handle_restart(State(state): State<Arc<AppState>>) -> Reply<String> {
    state.api.restart().await.map_err(internal)
}

async fn handle_update(State(state): State<Arc<AppState>>, body: Bytes) -> Reply<&'static str> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err((
            StatusCode::BAD_REQUEST,
            "expected a JSON object".to_string(),
        ));
    }
    let update: SystemUpdate = serde_json::from_value(value)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid field: {}", e)))?;
    state.api.update_system(&update).await.map_err(internal)?;
    Ok("ok")
}

async fn handle_ota(body: Bytes) -> Reply<&'static str> {
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "empty image".to_string()));
    }
    tracing::info!(bytes = body.len(), "OTA image received");
    Ok(OTA_REPLY)
}

async fn handle_health() -> &'static str {
    "ok"
}
