use axum::Router;

pub fn register_routes(state: crate::api::AppState) -> Router {
    Router::new()
        .nest("/api", crate::api::routes())
        .merge(crate::api::feed_routes())
        .with_state(state)
}
