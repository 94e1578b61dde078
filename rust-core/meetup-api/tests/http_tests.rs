// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP tests for the meetups server

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use proptest::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

use meetup_api::{bootstrap, build_router, ApiConfig, AppState};
use meetup_pages::FallbackMode;
use meetup_store::{MeetupId, NewMeetup};

async fn app(fallback: FallbackMode) -> (Router, AppState) {
    let config = ApiConfig {
        fallback,
        ..ApiConfig::default()
    };
    let state = bootstrap(&config).await.unwrap();
    (build_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let (status, body) = send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
    (status, String::from_utf8(body).unwrap())
}

async fn post_json(app: &Router, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/new-meetup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_create_meetup_inserts_and_lists() {
    let (app, state) = app(FallbackMode::Blocking).await;

    let payload = json!({"title": "A", "image": "u1", "address": "addr1", "description": "d1"});
    let (status, body) = post_json(&app, payload.to_string()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"message": "meetup inserted"}));

    let listed = state.store.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "A");
    let id = listed[0].id.unwrap().to_hex();
    assert_eq!(id.len(), 24);

    // Not in the build-time set, generated on first request.
    let (status, html) = get(&app, &format!("/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h1>A</h1>"));
    assert!(html.contains("<p>d1</p>"));
}

#[tokio::test]
async fn test_create_endpoint_rejects_other_methods() {
    let (app, state) = app(FallbackMode::Blocking).await;

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/api/new-meetup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"A","image":"u","address":"a","description":"d"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    // Nothing was processed.
    assert!(state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let (app, state) = app(FallbackMode::Blocking).await;

    let (status, body) = post_json(&app, "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(body["code"], 400);
    assert!(state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_with_missing_field_is_bad_request() {
    let (app, state) = app(FallbackMode::Blocking).await;

    let payload = json!({"title": "A", "image": "u1", "address": "addr1"});
    let (status, body) = post_json(&app, payload.to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("description"));
    assert!(state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_with_store_unreachable_is_service_unavailable() {
    let (app, state) = app(FallbackMode::Blocking).await;
    state.store.pool().close();

    let payload = json!({"title": "A", "image": "u1", "address": "addr1", "description": "d1"});
    let (status, body) = post_json(&app, payload.to_string()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], 503);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_id_with_closed_fallback_is_not_found() {
    let (app, _) = app(FallbackMode::Closed).await;

    let (status, html) = get(&app, &format!("/{}", MeetupId::generate())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("404 - Page not found"));
}

#[tokio::test]
async fn test_closed_fallback_serves_build_time_pages_only() {
    let config = ApiConfig {
        fallback: FallbackMode::Closed,
        ..ApiConfig::default()
    };
    // memory:// starts empty, so seed it and rebuild.
    let state = bootstrap(&config).await.unwrap();
    let early = state
        .store
        .insert(NewMeetup::new("Early", "u", "addr", "d"))
        .await
        .unwrap();
    state.site.build().await.unwrap();
    let late = state
        .store
        .insert(NewMeetup::new("Late", "u", "addr", "d"))
        .await
        .unwrap();
    let app = build_router(state);

    let (status, html) = get(&app, &format!("/{early}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h1>Early</h1>"));

    let (status, _) = get(&app, &format!("/{late}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_id_with_blocking_fallback_is_not_found() {
    let (app, _) = app(FallbackMode::Blocking).await;

    let (status, html) = get(&app, &format!("/{}", MeetupId::generate())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("404 - Page not found"));
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let (app, _) = app(FallbackMode::Blocking).await;

    let (status, _) = get(&app, "/not-a-valid-id-format").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uppercase_id_serves_the_same_page() {
    for fallback in [FallbackMode::Closed, FallbackMode::Blocking] {
        let config = ApiConfig {
            fallback,
            ..ApiConfig::default()
        };
        let state = bootstrap(&config).await.unwrap();
        let id = state
            .store
            .insert(NewMeetup::new("Shouty", "u", "addr", "d"))
            .await
            .unwrap();
        state.site.build().await.unwrap();
        let app = build_router(state.clone());

        let (status, upper) = get(&app, &format!("/{}", id.to_hex().to_uppercase())).await;
        assert_eq!(status, StatusCode::OK, "{fallback}");
        let (_, lower) = get(&app, &format!("/{id}")).await;
        assert_eq!(upper, lower);
        assert!(upper.contains("<h1>Shouty</h1>"));
        assert_eq!(state.site.detail_pages().len().await, 1);
    }
}

#[tokio::test]
async fn test_detail_with_store_unreachable_is_service_unavailable() {
    let (app, state) = app(FallbackMode::Blocking).await;
    state.store.pool().close();

    let (status, html) = get(&app, &format!("/{}", MeetupId::generate())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(html.contains("currently unavailable"));
}

#[tokio::test(start_paused = true)]
async fn test_listing_picks_up_new_meetups_after_revalidation() {
    let (app, _) = app(FallbackMode::Blocking).await;

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<title>React Meetups</title>"));
    assert!(!html.contains("meetup-item"));

    let payload = json!({"title": "Fresh", "image": "u1", "address": "addr1", "description": "d1"});
    let (status, _) = post_json(&app, payload.to_string()).await;
    assert_eq!(status, StatusCode::CREATED);

    // Within the window the cached page is served.
    let (_, html) = get(&app, "/").await;
    assert!(!html.contains("<h3>Fresh</h3>"));

    tokio::time::advance(Duration::from_secs(11)).await;

    // The first stale request still gets the old page and starts the
    // regeneration.
    let (_, html) = get(&app, "/").await;
    assert!(!html.contains("<h3>Fresh</h3>"));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h3>Fresh</h3>"));
}

#[tokio::test]
async fn test_static_pages_and_fallback_route() {
    let (app, _) = app(FallbackMode::Blocking).await;

    let (status, html) = get(&app, "/new-meetup").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("new-meetup-form"));

    let (status, html) = get(&app, "/some/deep/path").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("404 - Page not found"));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "healthy");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_blank_required_field_never_inserts(
        blank in 0usize..4,
        filler in "[ \t]{0,3}",
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (app, state) = app(FallbackMode::Blocking).await;
            let mut fields = ["A".to_string(), "u1".to_string(), "addr1".to_string(), "d1".to_string()];
            fields[blank] = filler.clone();
            let payload = json!({
                "title": fields[0],
                "image": fields[1],
                "address": fields[2],
                "description": fields[3],
            });

            let (status, body) = post_json(&app, payload.to_string()).await;
            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert!(body["error"].is_string());
            prop_assert!(state.store.list_all().await.unwrap().is_empty());
            Ok(())
        })?;
    }
}
