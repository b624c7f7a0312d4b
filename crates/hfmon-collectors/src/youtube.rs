//! YouTube Data API v3 collector.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use hfmon_core::{document_id, Channel, CollectStatus, RawDocument};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{read_json, CollectError, CollectOutput, CollectQuery, Collector};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: &str = "25";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    published_at: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoStats>,
}

#[derive(Debug, Deserialize)]
struct VideoStats {
    id: String,
    #[serde(default)]
    statistics: Statistics,
}

/// Counts arrive as decimal strings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

pub struct YoutubeCollector {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeCollector {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: reqwest::Client, api_key: &str, base_url: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CollectError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        read_json(response, &url, &format!("youtube {endpoint}")).await
    }

    async fn search(&self, keyword: &str, query: &CollectQuery) -> Result<Vec<SearchItem>, CollectError> {
        let (from, until) = query.window();
        let published_after = from.to_rfc3339_opts(SecondsFormat::Millis, true);
        let published_before = until.to_rfc3339_opts(SecondsFormat::Millis, true);
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", keyword),
                    ("type", "video"),
                    ("relevanceLanguage", "ko"),
                    ("regionCode", "KR"),
                    ("publishedAfter", &published_after),
                    ("publishedBefore", &published_before),
                    ("maxResults", MAX_RESULTS),
                ],
            )
            .await?;
        Ok(response.items)
    }

    /// Statistics keyed by video id. Failures are logged and yield an empty map.
    async fn statistics(&self, video_ids: &[&str]) -> HashMap<String, Statistics> {
        let ids = video_ids.join(",");
        match self
            .get_json::<VideosResponse>("videos", &[("part", "statistics"), ("id", &ids)])
            .await
        {
            Ok(response) => response
                .items
                .into_iter()
                .map(|v| (v.id, v.statistics))
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, "youtube statistics fetch failed; continuing without");
                HashMap::new()
            }
        }
    }

    async fn collect_keyword(
        &self,
        keyword: &str,
        query: &CollectQuery,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<RawDocument>, CollectError> {
        let items = self.search(keyword, query).await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<&str> = items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect();
        let stats = self.statistics(&video_ids).await;

        Ok(items
            .iter()
            .filter_map(|item| to_document(item, stats.get(item.id.video_id.as_deref()?), keyword, fetched_at))
            .collect())
    }
}

#[async_trait]
impl Collector for YoutubeCollector {
    fn channel(&self) -> Channel {
        Channel::Youtube
    }

    fn source(&self) -> &str {
        "youtube_data_api"
    }

    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError> {
        let fetched_at = Utc::now();
        let mut output = CollectOutput::default();

        for keyword in &query.keywords {
            match self.collect_keyword(keyword, query, fetched_at).await {
                Ok(documents) => {
                    tracing::debug!(keyword = %keyword, count = documents.len(), "collected youtube videos");
                    output.statuses.push(CollectStatus::counted(
                        Channel::Youtube,
                        self.source(),
                        keyword,
                        documents.len(),
                    ));
                    output.documents.extend(documents);
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "youtube search failed");
                    output.statuses.push(
                        CollectStatus::failed(Channel::Youtube, self.source(), e.to_string())
                            .with_keyword(keyword),
                    );
                }
            }
        }

        Ok(output)
    }
}

fn to_document(
    item: &SearchItem,
    stats: Option<&Statistics>,
    keyword: &str,
    fetched_at: DateTime<Utc>,
) -> Option<RawDocument> {
    let video_id = item.id.video_id.as_deref()?;
    let published_at = DateTime::parse_from_rfc3339(&item.snippet.published_at)
        .ok()?
        .with_timezone(&Utc);
    let url = format!("https://www.youtube.com/watch?v={video_id}");

    let mut source_meta = Map::new();
    source_meta.insert("video_id".to_string(), Value::from(video_id));
    source_meta.insert(
        "channel_title".to_string(),
        Value::from(item.snippet.channel_title.as_str()),
    );
    if let Some(stats) = stats {
        for (key, raw) in [
            ("view_count", &stats.view_count),
            ("like_count", &stats.like_count),
            ("comment_count", &stats.comment_count),
        ] {
            if let Some(n) = raw.as_deref().and_then(|s| s.parse::<u64>().ok()) {
                source_meta.insert(key.to_string(), Value::from(n));
            }
        }
    }

    Some(RawDocument {
        id: document_id(Channel::Youtube, keyword, &url, &published_at),
        channel: Channel::Youtube,
        keyword: keyword.to_string(),
        title: item.snippet.title.clone(),
        text: item.snippet.description.clone(),
        url,
        published_at,
        fetched_at,
        source_meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(video_id: Option<&str>, published_at: &str) -> SearchItem {
        SearchItem {
            id: SearchItemId {
                video_id: video_id.map(str::to_string),
            },
            snippet: Snippet {
                published_at: published_at.to_string(),
                title: "보금자리론 가이드".to_string(),
                description: "자격요건 정리".to_string(),
                channel_title: "금융채널".to_string(),
            },
        }
    }

    #[test]
    fn search_response_deserializes() {
        let json = r#"{"items":[{"id":{"kind":"youtube#video","videoId":"abc"},
            "snippet":{"publishedAt":"2024-03-05T09:00:00Z","title":"T","description":"D","channelTitle":"C"}}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].id.video_id.as_deref(), Some("abc"));
        assert_eq!(response.items[0].snippet.channel_title, "C");
    }

    #[test]
    fn statistics_are_attached_as_numbers() {
        let stats = Statistics {
            view_count: Some("1200".to_string()),
            like_count: Some("not-a-number".to_string()),
            comment_count: None,
        };
        let doc = to_document(&item(Some("abc"), "2024-03-05T09:00:00Z"), Some(&stats), "HF", Utc::now())
            .unwrap();
        assert_eq!(doc.url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(doc.source_meta["view_count"], 1200);
        assert!(!doc.source_meta.contains_key("like_count"));
        assert_eq!(doc.source_meta["channel_title"], "금융채널");
        assert!(doc.id.starts_with("youtube_"));
    }

    #[test]
    fn items_without_video_id_or_date_are_dropped() {
        assert!(to_document(&item(None, "2024-03-05T09:00:00Z"), None, "HF", Utc::now()).is_none());
        assert!(to_document(&item(Some("abc"), "soon"), None, "HF", Utc::now()).is_none());
    }
}
