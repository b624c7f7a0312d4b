use axum::{body::Bytes, extract::State, Extension, Json};
use hfmon_analytics::{AnalyticsResult, SummaryReport};
use hfmon_cache::fingerprint_of;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::analytics::parse_body;
use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SummaryRequest {
    pub analytics: AnalyticsResult,
    #[serde(default)]
    pub force_refresh: bool,
}

/// Rule-based summary of an analytics result, cached under the result's
/// request fingerprint.
pub(super) async fn summarize(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<SummaryReport>>, ApiError> {
    let request: SummaryRequest = parse_body(&req_id.0, &body)?;
    let fp = fingerprint_of(&request.analytics);

    if !request.force_refresh {
        if let Some(mut cached) = state.cache.get_summary(&fp).await {
            tracing::info!(fingerprint = %fp, "serving summary from cache");
            cached.from_cache = true;
            return Ok(Json(ApiResponse::new(cached, req_id.0)));
        }
    }

    let report = hfmon_analytics::summarize(&request.analytics);
    if let Err(e) = state.cache.put_summary(&fp, &report).await {
        tracing::warn!(fingerprint = %fp, error = %e, "failed to cache summary");
    }

    Ok(Json(ApiResponse::new(report, req_id.0)))
}
