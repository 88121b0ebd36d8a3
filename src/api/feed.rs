//! The reconciliation endpoint: fetches the tenant's upstream feed, runs
//! the core engine, and serves the result with conditional-request
//! handling, grounded on the teacher's `route_builder.rs::serve_ics`.

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::api::AppState;
use crate::engine::{self, Upstream};
use crate::error::CoreError;
use crate::tenant;

async fn fetch_upstream(client: &reqwest::Client, source_url: &str) -> Upstream {
    let result = client
        .get(source_url)
        .header(header::ACCEPT, "text/calendar")
        .header(header::USER_AGENT, "calproxy/1.0")
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => Upstream::Body(body),
            Err(e) => {
                tracing::warn!("failed reading upstream body: {e}");
                Upstream::Unreachable
            }
        },
        Ok(resp) => {
            tracing::warn!("upstream returned non-2xx status {}", resp.status());
            Upstream::Unreachable
        }
        Err(e) => {
            tracing::warn!("upstream fetch failed: {e}");
            Upstream::Unreachable
        }
    }
}

fn error_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::UpstreamUnreachable(_)
        | CoreError::UpstreamInvalid(_)
        | CoreError::UpstreamEmpty(_) => StatusCode::BAD_GATEWAY,
        CoreError::StateStoreUnavailable(_) | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn serve_calendar(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Ok(Some(cfg)) = tenant::get(state.store.as_ref(), &tenant_id) else {
        return (StatusCode::NOT_FOUND, "Unknown tenant").into_response();
    };

    let default_tz = cfg
        .timezone
        .clone()
        .unwrap_or_else(|| state.default_timezone.clone());

    let upstream = fetch_upstream(&state.http_client, &cfg.source_url).await;
    let now_millis = chrono::Utc::now().timestamp_millis();

    let outcome = match engine::process(upstream, &tenant_id, &default_tz, state.store.as_ref(), now_millis) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("normalization failed for tenant {tenant_id}: {e}");
            return (error_status(&e), e.to_string()).into_response();
        }
    };

    let quoted_etag = format!("\"{}\"", outcome.etag);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok())
        && if_none_match == quoted_etag
    {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/calendar")
        .header(header::ETAG, quoted_etag)
        .header(header::CACHE_CONTROL, "no-store")
        .body(axum::body::Body::from(outcome.ics))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/t/{tenant_id}/calendar.ics", get(serve_calendar))
}
