use crate::api::AppState;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct DetailedHealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub store_ok: bool,
}

#[utoipa::path(get, path = "/api/health", responses((status = 200, body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

#[utoipa::path(get, path = "/api/health/detailed", responses((status = 200, body = DetailedHealthResponse)))]
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.get("__healthcheck__").is_ok();
    let uptime = state.start_time.elapsed().as_secs();
    (
        StatusCode::OK,
        Json(DetailedHealthResponse {
            status: if store_ok { "ok" } else { "degraded" }.into(),
            uptime_seconds: uptime,
            store_ok,
        }),
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(health_detailed))
}
