use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::tenant::{self, TenantConfig};

#[derive(Serialize, ToSchema)]
pub struct TenantResponse {
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<TenantConfig>,
}

#[derive(Serialize, ToSchema)]
pub struct TenantListEntry {
    id: String,
    #[serde(flatten)]
    config: TenantConfig,
}

#[derive(Serialize, ToSchema)]
pub struct TenantListResponse {
    tenants: Vec<TenantListEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct PutTenant {
    pub source_url: String,
    pub timezone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTenant {
    pub id: String,
    pub source_url: String,
    pub timezone: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(TenantResponse {
            status: "error".into(),
            message: message.into(),
            tenant: None,
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/tenants",
    responses((status = 200, body = TenantListResponse))
)]
async fn list_tenants(State(state): State<AppState>) -> impl IntoResponse {
    match tenant::list(state.store.as_ref()) {
        Ok(tenants) => (
            StatusCode::OK,
            Json(TenantListResponse {
                tenants: tenants
                    .into_iter()
                    .map(|(id, config)| TenantListEntry { id, config })
                    .collect(),
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/api/tenants",
    request_body = CreateTenant,
    responses((status = 201, body = TenantResponse), (status = 409, body = TenantResponse))
)]
async fn create_tenant(
    State(state): State<AppState>,
    Json(body): Json<CreateTenant>,
) -> impl IntoResponse {
    match tenant::get(state.store.as_ref(), &body.id) {
        Ok(Some(_)) => return error_response(StatusCode::CONFLICT, "Tenant already exists"),
        Ok(None) => {}
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }

    let cfg = TenantConfig {
        source_url: body.source_url,
        created_at: chrono::Utc::now().timestamp_millis(),
        timezone: body.timezone,
    };

    match tenant::put(state.store.as_ref(), &body.id, &cfg) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(TenantResponse {
                status: "success".into(),
                message: "Tenant registered".into(),
                tenant: Some(cfg),
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/api/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    responses((status = 200, body = TenantResponse))
)]
async fn get_tenant(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match tenant::get(state.store.as_ref(), &id) {
        Ok(Some(cfg)) => (
            StatusCode::OK,
            Json(TenantResponse {
                status: "success".into(),
                message: "ok".into(),
                tenant: Some(cfg),
            }),
        )
            .into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Tenant not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[utoipa::path(
    put,
    path = "/api/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    request_body = PutTenant,
    responses((status = 200, body = TenantResponse))
)]
async fn put_tenant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PutTenant>,
) -> impl IntoResponse {
    let created_at = match tenant::get(state.store.as_ref(), &id) {
        Ok(Some(existing)) => existing.created_at,
        Ok(None) => chrono::Utc::now().timestamp_millis(),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let cfg = TenantConfig {
        source_url: body.source_url,
        created_at,
        timezone: body.timezone,
    };

    match tenant::put(state.store.as_ref(), &id, &cfg) {
        Ok(()) => (
            StatusCode::OK,
            Json(TenantResponse {
                status: "success".into(),
                message: "Tenant registered".into(),
                tenant: Some(cfg),
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/tenants/{id}",
    params(("id" = String, Path, description = "Tenant ID")),
    responses((status = 200, body = TenantResponse))
)]
async fn delete_tenant(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match tenant::teardown(state.store.as_ref(), &id) {
        Ok(()) => (
            StatusCode::OK,
            Json(TenantResponse {
                status: "success".into(),
                message: "Tenant deleted".into(),
                tenant: None,
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route(
            "/tenants/{id}",
            get(get_tenant).put(put_tenant).delete(delete_tenant),
        )
}
