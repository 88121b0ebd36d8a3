use std::sync::Arc;

use axum::Router;

pub mod feed;
pub mod health;
pub mod tenants;

use crate::store::StateStore;

/// Shared application state, grounded on the teacher's `AppState`
/// (`src/api/mod.rs`): a single store handle plus process-lifetime
/// bookkeeping.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub default_timezone: String,
    pub start_time: std::time::Instant,
    pub http_client: reqwest::Client,
}

pub fn routes() -> Router<AppState> {
    Router::new().merge(tenants::routes()).merge(health::routes())
}

pub fn feed_routes() -> Router<AppState> {
    feed::routes()
}
