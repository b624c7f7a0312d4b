//! Mention collectors for hfmon.
//!
//! Each collector covers one channel and reports a [`CollectStatus`] per
//! attempt. [`collect_all`] runs every collector for the requested channels
//! concurrently, bounds each with a timeout, and merges the results.

mod dc;
pub mod error;
mod naver_blog;
mod news_rss;
mod tistory;
mod youtube;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use futures::future::join_all;
use hfmon_core::{AppConfig, Channel, CollectStatus, Gallery, RawDocument};
use serde::de::DeserializeOwned;

pub use dc::{DcCollector, DcSettings};
pub use error::CollectError;
pub use naver_blog::NaverBlogCollector;
pub use news_rss::{parse_news_feed, FeedItem, NewsRssCollector};
pub use tistory::TistoryCollector;
pub use youtube::YoutubeCollector;

/// What to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectQuery {
    pub keywords: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Watchlist gallery ids to search; empty means every enabled gallery.
    pub gallery_ids: Vec<String>,
}

impl CollectQuery {
    /// Inclusive UTC window: `start 00:00:00.000` to `end 23:59:59.999`.
    #[must_use]
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self.start_date.and_time(NaiveTime::MIN).and_utc();
        let until = self.end_date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1)
            - TimeDelta::milliseconds(1);
        (from, until)
    }

    #[must_use]
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let (from, until) = self.window();
        *at >= from && *at <= until
    }
}

/// Documents plus one status per attempt (usually per keyword).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectOutput {
    pub documents: Vec<RawDocument>,
    pub statuses: Vec<CollectStatus>,
}

#[async_trait]
pub trait Collector: Send + Sync {
    fn channel(&self) -> Channel;

    /// Human-readable source name used in statuses.
    fn source(&self) -> &str;

    /// Collect documents for every keyword in `query`.
    ///
    /// Per-keyword failures are reported as `failed` statuses in the output;
    /// an `Err` means the collector could not run at all.
    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError>;
}

/// The collectors available to this process, plus reasons for channels that
/// have none.
#[derive(Clone, Default)]
pub struct CollectorSet {
    collectors: Vec<Arc<dyn Collector>>,
    unavailable: HashMap<Channel, String>,
}

impl CollectorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, collector: Arc<dyn Collector>) -> Self {
        self.unavailable.remove(&collector.channel());
        self.collectors.push(collector);
        self
    }

    /// Record why `channel` cannot be collected.
    #[must_use]
    pub fn unavailable(mut self, channel: Channel, reason: impl Into<String>) -> Self {
        self.unavailable.insert(channel, reason.into());
        self
    }

    /// Collectors for every channel this build can reach with `config`.
    ///
    /// Keyed APIs are marked unavailable when their credentials are absent;
    /// the gallery collector needs at least one enabled gallery.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, galleries: &[Gallery]) -> Result<Self, CollectError> {
        let client = build_http_client(config.request_timeout_secs, &config.user_agent)?;
        let mut set = Self::new().with(Arc::new(NewsRssCollector::new(client.clone())));

        set = match config.youtube_api_key.as_deref() {
            Some(key) => set.with(Arc::new(YoutubeCollector::new(client.clone(), key))),
            None => set.unavailable(Channel::Youtube, "YOUTUBE_API_KEY not configured"),
        };

        set = match (
            config.naver_client_id.as_deref(),
            config.naver_client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => {
                set.with(Arc::new(NaverBlogCollector::new(client.clone(), id, secret)))
            }
            _ => set.unavailable(
                Channel::Blog,
                "NAVER_CLIENT_ID/NAVER_CLIENT_SECRET not configured",
            ),
        };

        set = match config.kakao_rest_api_key.as_deref() {
            Some(key) => set.with(Arc::new(TistoryCollector::new(client.clone(), key))),
            None => set.unavailable(Channel::Tistory, "KAKAO_REST_API_KEY not configured"),
        };

        let dc = DcCollector::new(client, galleries);
        set = if dc.has_galleries() {
            set.with(Arc::new(dc))
        } else {
            set.unavailable(Channel::Dc, "no enabled galleries in watchlist")
        };

        Ok(set)
    }

    #[must_use]
    pub fn supports(&self, channel: Channel) -> bool {
        self.collectors.iter().any(|c| c.channel() == channel)
    }

    fn skip_reason(&self, channel: Channel) -> String {
        self.unavailable
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| format!("no collector available for {channel}"))
    }
}

/// Shared HTTP client with the configured timeout and `User-Agent`.
///
/// # Errors
///
/// Returns [`CollectError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<reqwest::Client, CollectError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Fail on a non-2xx response, keeping its body for the error.
///
/// `url` is passed in rather than read from the response so credentials in
/// the query string never reach error messages.
pub(crate) async fn check_status(
    response: reqwest::Response,
    url: &str,
) -> Result<reqwest::Response, CollectError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CollectError::UnexpectedStatus {
        status: status.as_u16(),
        url: url.to_string(),
        body,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
    context: &str,
) -> Result<T, CollectError> {
    let body = check_status(response, url).await?.text().await?;
    serde_json::from_str(&body).map_err(|source| CollectError::Deserialize {
        context: context.to_string(),
        source,
    })
}

/// Run the collectors for `channels` concurrently.
///
/// A collector that errors or exceeds `timeout` yields a single `failed`
/// status for its channel; the others are unaffected. Requested channels
/// without a collector yield a `skipped` status. Documents are de-duplicated
/// by id, keeping the first occurrence.
pub async fn collect_all(
    set: &CollectorSet,
    query: &CollectQuery,
    channels: &[Channel],
    timeout: Duration,
) -> CollectOutput {
    let runs = set
        .collectors
        .iter()
        .filter(|c| channels.contains(&c.channel()))
        .map(|collector| async move {
            let channel = collector.channel();
            match tokio::time::timeout(timeout, collector.collect(query)).await {
                Ok(Ok(output)) => {
                    tracing::debug!(
                        channel = %channel,
                        documents = output.documents.len(),
                        "collector finished"
                    );
                    output
                }
                Ok(Err(e)) => {
                    tracing::warn!(channel = %channel, error = %e, "collector failed");
                    CollectOutput {
                        documents: Vec::new(),
                        statuses: vec![CollectStatus::failed(
                            channel,
                            collector.source(),
                            e.to_string(),
                        )],
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        channel = %channel,
                        timeout_secs = timeout.as_secs(),
                        "collector timed out"
                    );
                    CollectOutput {
                        documents: Vec::new(),
                        statuses: vec![CollectStatus::failed(
                            channel,
                            collector.source(),
                            format!("timed out after {}s", timeout.as_secs()),
                        )],
                    }
                }
            }
        });

    let mut merged = CollectOutput::default();
    let mut seen_ids = HashSet::new();
    for output in join_all(runs).await {
        merged.statuses.extend(output.statuses);
        for doc in output.documents {
            if seen_ids.insert(doc.id.clone()) {
                merged.documents.push(doc);
            }
        }
    }

    let mut skipped = HashSet::new();
    for &channel in channels {
        if !set.supports(channel) && skipped.insert(channel) {
            let reason = set.skip_reason(channel);
            tracing::debug!(channel = %channel, reason = %reason, "channel skipped");
            merged
                .statuses
                .push(CollectStatus::skipped(channel, channel.as_str(), reason));
        }
    }

    merged
}
