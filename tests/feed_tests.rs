use std::sync::Arc;

use axum::http::{Request, StatusCode, header};
use calproxy::api::AppState;
use calproxy::server::build_router;
use calproxy::store::memory::MemoryStore;
use calproxy::tenant::{self, TenantConfig};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn test_state() -> AppState {
    AppState {
        store: Arc::new(MemoryStore::new()),
        default_timezone: "America/New_York".into(),
        start_time: std::time::Instant::now(),
        http_client: reqwest::Client::new(),
    }
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = build_router(test_state());

    let resp = app
        .oneshot(
            Request::get("/api/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("\"ok\""));
}

#[tokio::test]
async fn health_detailed_reports_store_ok() {
    let app = build_router(test_state());

    let resp = app
        .oneshot(
            Request::get("/api/health/detailed")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("\"store_ok\":true"));
}

#[tokio::test]
async fn calendar_for_unknown_tenant_returns_404() {
    let app = build_router(test_state());

    let resp = app
        .oneshot(
            Request::get("/t/missing-tenant/calendar.ics")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_tenant_then_get_tenant_roundtrips() {
    let state = test_state();
    let app = build_router(state.clone());

    let put_resp = app
        .oneshot(
            Request::put("/api/tenants/acme")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    r#"{"source_url":"https://example.com/acme.ics","timezone":"America/Chicago"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(put_resp.status(), StatusCode::OK);

    let stored = tenant::get(state.store.as_ref(), "acme").unwrap().unwrap();
    assert_eq!(stored.source_url, "https://example.com/acme.ics");
    assert_eq!(stored.timezone.as_deref(), Some("America/Chicago"));

    let app = build_router(state);
    let get_resp = app
        .oneshot(
            Request::get("/api/tenants/acme")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(get_resp.status(), StatusCode::OK);
    let body = body_string(get_resp).await;
    assert!(body.contains("example.com/acme.ics"));
}

#[tokio::test]
async fn get_tenant_before_registration_returns_404() {
    let app = build_router(test_state());

    let resp = app
        .oneshot(
            Request::get("/api/tenants/never-registered")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_tenant_then_list_includes_it() {
    let state = test_state();
    let app = build_router(state.clone());

    let create_resp = app
        .oneshot(
            Request::post("/api/tenants")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    r#"{"id":"acme","source_url":"https://example.com/acme.ics","timezone":null}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create_resp.status(), StatusCode::CREATED);

    let app = build_router(state);
    let list_resp = app
        .oneshot(
            Request::get("/api/tenants")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(list_resp.status(), StatusCode::OK);
    let body = body_string(list_resp).await;
    assert!(body.contains("\"acme\""));
    assert!(body.contains("example.com/acme.ics"));
}

#[tokio::test]
async fn create_tenant_twice_returns_409() {
    let state = test_state();
    tenant::put(
        state.store.as_ref(),
        "acme",
        &TenantConfig {
            source_url: "https://example.com/acme.ics".into(),
            created_at: 0,
            timezone: None,
        },
    )
    .unwrap();

    let app = build_router(state);
    let resp = app
        .oneshot(
            Request::post("/api/tenants")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    r#"{"id":"acme","source_url":"https://other.example.com","timezone":null}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_tenant_removes_it() {
    let state = test_state();
    tenant::put(
        state.store.as_ref(),
        "temp",
        &TenantConfig {
            source_url: "https://example.com/temp.ics".into(),
            created_at: 0,
            timezone: None,
        },
    )
    .unwrap();

    let app = build_router(state.clone());
    let resp = app
        .oneshot(
            Request::delete("/api/tenants/temp")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(tenant::get(state.store.as_ref(), "temp").unwrap().is_none());
}
