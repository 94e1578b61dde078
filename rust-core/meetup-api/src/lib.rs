// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meetup API
//!
//! HTTP server for the meetups site: the generated pages plus the
//! `POST /api/new-meetup` endpoint that adds records to the store.

pub mod config;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

use meetup_pages::{render, PageError, Resolution, Site};
use meetup_store::{MeetupStore, NewMeetup, StoreError, StorePool};

pub use config::{ApiConfig, ConfigError, LogFormat};

/// API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            StoreError::InvalidIdentifier(msg) => ApiError::BadRequest(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Connection(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Success response body of the create endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Errors that stop the server from starting
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("initial build: {0}")]
    Build(#[from] PageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MeetupStore>,
    pub site: Arc<Site>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(store: Arc<MeetupStore>, site: Arc<Site>) -> Self {
        Self {
            store,
            site,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(listing_handler))
        .route("/new-meetup", get(new_meetup_page_handler))
        .route("/{meetup_id}", get(detail_handler))
        // Create endpoint: POST only, everything else is 405
        .route(
            "/api/new-meetup",
            post(create_meetup_handler).fallback(method_not_allowed_handler),
        )
        // Health endpoints
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

fn not_found_response(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(state.site.not_found_page().to_string()),
    )
        .into_response()
}

/// Error page for a failed page generation.
fn page_failure(page: &str, err: PageError) -> Response {
    let (status, message) = match &err {
        PageError::Store(StoreError::Connection(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "The meetup store is currently unavailable.",
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "The page could not be generated.",
        ),
    };
    error!(page, error = %err, status = status.as_u16(), "page generation failed");
    (status, Html(render::error_page(message))).into_response()
}

/// Listing page handler
#[instrument(skip(state))]
async fn listing_handler(State(state): State<AppState>) -> Response {
    match state.site.listing().await {
        Ok(page) => Html(page.html.clone()).into_response(),
        Err(e) => page_failure("listing", e),
    }
}

/// New-meetup form handler
#[instrument(skip(state))]
async fn new_meetup_page_handler(State(state): State<AppState>) -> Html<String> {
    Html(state.site.new_meetup_page().to_string())
}

/// Meetup detail page handler
#[instrument(skip(state))]
async fn detail_handler(State(state): State<AppState>, Path(meetup_id): Path<String>) -> Response {
    match state.site.detail(&meetup_id).await {
        Ok(Resolution::Found(page)) => Html(page.html.clone()).into_response(),
        Ok(Resolution::NotFound) => not_found_response(&state),
        Err(PageError::Store(StoreError::InvalidIdentifier(_))) => not_found_response(&state),
        Err(e) => page_failure("detail", e),
    }
}

/// Create meetup handler
#[instrument(skip(state, payload))]
async fn create_meetup_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewMeetup>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(meetup) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected new meetup payload");
        ApiError::BadRequest(rejection.body_text())
    })?;

    match state.store.insert(meetup).await {
        Ok(id) => {
            info!(meetup_id = %id, "meetup created");
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse {
                    message: "meetup inserted".to_string(),
                }),
            ))
        }
        Err(e) => {
            let err = ApiError::from(e);
            match err {
                ApiError::BadRequest(_) => warn!(error = %err, "invalid new meetup"),
                _ => error!(error = %err, "failed to insert meetup"),
            }
            Err(err)
        }
    }
}

async fn method_not_allowed_handler() -> Response {
    (
        [(header::ALLOW, "POST")],
        ApiError::MethodNotAllowed("only POST is supported".to_string()),
    )
        .into_response()
}

async fn not_found_handler(State(state): State<AppState>) -> Response {
    not_found_response(&state)
}

/// Health check handler
#[instrument(skip(state))]
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check handler
#[instrument(skip(state))]
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.store.pool().is_closed() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Connect the store, build the site and assemble the application state.
pub async fn bootstrap(config: &ApiConfig) -> Result<AppState, StartupError> {
    let pool = StorePool::connect(&config.connection_url, config.pool_config())?;
    let store = Arc::new(MeetupStore::new(pool));
    let site = Arc::new(Site::new(store.clone(), config.regeneration_config()));
    site.build().await?;
    Ok(AppState::new(store, site))
}

/// Start the API server
pub async fn serve(config: ApiConfig) -> Result<(), StartupError> {
    let state = bootstrap(&config).await?;
    let pool = state.store.pool().clone();
    let app = build_router(state);

    let addr = config.bind_addr();
    info!(
        store = config.connection_scheme(),
        fallback = %config.fallback,
        revalidate_secs = config.revalidate_secs,
        "Starting meetups server on {}",
        addr
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn state() -> AppState {
        bootstrap(&ApiConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint() {
        let state = state().await;
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        state.store.pool().close();
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::Validation("x".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Connection("x".into())),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::NotFound("x".into())),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiError::ServiceUnavailable("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = ApiError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
