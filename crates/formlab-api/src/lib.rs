//! # formlab-api
//!
//! HTTP surface for FormLab.
//!
//! This crate provides:
//! - The axum [`Router`] for health, the sport catalog, uploads, status and results
//! - [`ApiError`] with the `{error_code, message, request_id}` body
//! - UUIDv7 request ids on every response
//!
//! ## Example
//!
//! ```ignore
//! use formlab_api::{build_router, ApiConfig, AppState};
//!
//! let state = AppState::new(ApiConfig::from_env(), pipeline);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use formlab_core::defaults;
use formlab_jobs::AnalysisPipeline;

pub use config::ApiConfig;
pub use error::{ApiError, ErrorBody};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/sports", get(handlers::list_sports))
        .route("/sports/:sport", get(handlers::get_sport))
        .route("/upload", post(handlers::upload_video))
        .route("/status/:job_id", get(handlers::get_status))
        .route("/status/results/:job_id", get(handlers::get_results))
        .route("/video/:job_id", delete(handlers::delete_video));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins(
            &state.config.cors_origins,
        )))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600));

    let body_limit = state.config.body_limit();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .nest(defaults::API_PREFIX, api)
        .fallback(not_found)
        .layer(axum::middleware::from_fn(error::attach_request_id))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        .with_state(state)
}
