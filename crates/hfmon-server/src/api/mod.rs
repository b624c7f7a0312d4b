mod analytics;
mod summary;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use hfmon_analytics::KeywordExtractor;
use hfmon_cache::FileCache;
use hfmon_collectors::CollectorSet;
use hfmon_core::{AppConfig, Channel, Gallery, Watchlist};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Analytics request bodies can carry a whole result (summary endpoint).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub watchlist: Arc<Watchlist>,
    pub extractor: Arc<KeywordExtractor>,
    pub collectors: Arc<CollectorSet>,
    pub cache: FileCache,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, watchlist: Watchlist, collectors: CollectorSet) -> Self {
        let extractor = KeywordExtractor::from_watchlist(&watchlist);
        let cache = FileCache::new(&config.data_dir);
        Self {
            config,
            watchlist: Arc::new(watchlist),
            extractor: Arc::new(extractor),
            collectors: Arc::new(collectors),
            cache,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct Capabilities {
    youtube: bool,
    blog: bool,
    tistory: bool,
    dc: bool,
}

#[derive(Debug, Serialize)]
struct ConfigData {
    keywords: Vec<String>,
    galleries: Vec<Gallery>,
    channels: Vec<Channel>,
    default_channels: Vec<Channel>,
    capabilities: Capabilities,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn validation(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "validation_error", message)
    }

    pub fn internal(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/config", get(config))
        .route("/api/v1/collect", post(analytics::collect))
        .route("/api/v1/demo", post(analytics::demo))
        .route("/api/v1/summary", post(summary::summarize))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::new(HealthData { status: "ok" }, req_id.0))
}

async fn config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ConfigData>> {
    let data = ConfigData {
        keywords: state.watchlist.keywords.clone(),
        galleries: state.watchlist.enabled_galleries().cloned().collect(),
        channels: Channel::ALL.to_vec(),
        default_channels: Channel::DEFAULT_SET.to_vec(),
        capabilities: Capabilities {
            youtube: state.collectors.supports(Channel::Youtube),
            blog: state.collectors.supports(Channel::Blog),
            tistory: state.collectors.supports(Channel::Tistory),
            dc: state.collectors.supports(Channel::Dc),
        },
    };
    Json(ApiResponse::new(data, req_id.0))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
