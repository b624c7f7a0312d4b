use std::sync::Arc;
use std::time::Duration;

use axum::{body::Bytes, extract::State, Extension, Json};
use chrono::NaiveDate;
use hfmon_analytics::demo::{demo_analytics, DEFAULT_SEED};
use hfmon_analytics::{aggregate, AggregateInput, AnalyticsResult};
use hfmon_cache::fingerprint;
use hfmon_collectors::{collect_all, CollectQuery};
use hfmon_core::{Channel, Granularity};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

const DEMO_START: &str = "2024-01-01";
const DEMO_END: &str = "2024-12-31";

/// Body shared by `collect` and `demo`. Everything is optional on the wire;
/// [`AnalyticsRequest::validate`] applies defaults and reports what is wrong.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalyticsRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub granularity: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub channels: Option<Vec<String>>,
    pub gallery_ids: Option<Vec<String>>,
    #[serde(default)]
    pub force_refresh: bool,
}

/// A request with defaults applied and every field parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ValidRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    pub keywords: Vec<String>,
    pub channels: Vec<Channel>,
}

impl AnalyticsRequest {
    /// `default_range` fills in missing dates (demo); without it both dates
    /// are required.
    pub(super) fn validate(
        &self,
        default_keywords: &[String],
        default_range: Option<(&str, &str)>,
    ) -> Result<ValidRequest, String> {
        let start_raw = self
            .start_date
            .as_deref()
            .or(default_range.map(|(start, _)| start))
            .ok_or("startDate is required")?;
        let end_raw = self
            .end_date
            .as_deref()
            .or(default_range.map(|(_, end)| end))
            .ok_or("endDate is required")?;

        let start_date = parse_date("startDate", start_raw)?;
        let end_date = parse_date("endDate", end_raw)?;
        if end_date < start_date {
            return Err(format!("endDate {end_date} is before startDate {start_date}"));
        }

        let granularity = match self.granularity.as_deref() {
            None => Granularity::default(),
            Some(raw) => raw.parse::<Granularity>().map_err(|e| format!("{e}"))?,
        };

        let mut keywords: Vec<String> = Vec::new();
        for keyword in self.keywords.iter().flatten() {
            let keyword = keyword.trim();
            if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
                keywords.push(keyword.to_string());
            }
        }
        if keywords.is_empty() {
            keywords = default_keywords.to_vec();
        }
        if keywords.is_empty() {
            return Err("at least one keyword is required".to_string());
        }

        let mut channels: Vec<Channel> = Vec::new();
        for raw in self.channels.iter().flatten() {
            let channel: Channel = raw.parse().map_err(|e| format!("{e}"))?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        if channels.is_empty() {
            channels = Channel::DEFAULT_SET.to_vec();
        }

        Ok(ValidRequest {
            start_date,
            end_date,
            granularity,
            keywords,
            channels,
        })
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("{field} must be YYYY-MM-DD (got '{raw}'): {e}"))
}

pub(super) fn parse_body<T: DeserializeOwned>(req_id: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation(req_id, format!("invalid request body: {e}")))
}

pub(super) async fn collect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<AnalyticsResult>>, ApiError> {
    let request: AnalyticsRequest = parse_body(&req_id.0, &body)?;
    let valid = request
        .validate(&state.watchlist.keywords, None)
        .map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;

    let fp = fingerprint(
        valid.start_date,
        valid.end_date,
        valid.granularity,
        &valid.keywords,
        &valid.channels,
    );

    if request.force_refresh {
        tracing::debug!(fingerprint = %fp, "force refresh; skipping cache lookup");
    } else if let Some(mut cached) = state.cache.get(&fp).await {
        tracing::info!(fingerprint = %fp, "serving analytics from cache");
        cached.from_cache = true;
        return Ok(Json(ApiResponse::new(cached, req_id.0)));
    }

    let query = CollectQuery {
        keywords: valid.keywords.clone(),
        start_date: valid.start_date,
        end_date: valid.end_date,
        gallery_ids: request.gallery_ids.clone().unwrap_or_default(),
    };
    let timeout = Duration::from_secs(state.config.collector_timeout_secs);
    let output = collect_all(&state.collectors, &query, &valid.channels, timeout).await;
    tracing::info!(
        fingerprint = %fp,
        documents = output.documents.len(),
        statuses = output.statuses.len(),
        "collection finished"
    );

    let input = AggregateInput {
        documents: output.documents,
        start_date: valid.start_date,
        end_date: valid.end_date,
        granularity: valid.granularity,
        keywords: valid.keywords,
        channels: valid.channels,
        collect_statuses: output.statuses,
    };
    let extractor = Arc::clone(&state.extractor);
    let analytics = tokio::task::spawn_blocking(move || aggregate(input, &extractor))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "aggregation task failed");
            ApiError::internal(req_id.0.clone(), "aggregation failed")
        })?;

    if let Err(e) = state.cache.put(&fp, &analytics).await {
        tracing::warn!(fingerprint = %fp, error = %e, "failed to cache analytics result");
    }

    Ok(Json(ApiResponse::new(analytics, req_id.0)))
}

pub(super) async fn demo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<AnalyticsResult>>, ApiError> {
    let request: AnalyticsRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AnalyticsRequest::default()
    } else {
        parse_body(&req_id.0, &body)?
    };
    let valid = request
        .validate(&state.watchlist.keywords, Some((DEMO_START, DEMO_END)))
        .map_err(|msg| ApiError::validation(req_id.0.clone(), msg))?;

    let extractor = Arc::clone(&state.extractor);
    let analytics = tokio::task::spawn_blocking(move || {
        demo_analytics(
            valid.start_date,
            valid.end_date,
            valid.granularity,
            valid.keywords,
            valid.channels,
            &extractor,
            DEFAULT_SEED,
        )
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "demo generation task failed");
        ApiError::internal(req_id.0.clone(), "demo generation failed")
    })?;
    tracing::info!(
        documents = analytics.meta.total_documents,
        granularity = %analytics.meta.granularity,
        "demo analytics generated"
    );

    Ok(Json(ApiResponse::new(analytics, req_id.0)))
}
