//! Tistory posts found through the Kakao (Daum) blog search API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hfmon_core::{document_id, Channel, CollectStatus, RawDocument};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::news_rss::strip_html;
use crate::{read_json, CollectError, CollectOutput, CollectQuery, Collector};

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com/v2/search";
const PAGE_SIZE: &str = "50";
const MAX_PAGES: u32 = 5;

#[derive(Debug, Deserialize)]
struct BlogSearchResponse {
    #[serde(default)]
    documents: Vec<BlogDocument>,
    #[serde(default)]
    meta: SearchMeta,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    #[serde(default)]
    is_end: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct BlogDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    contents: String,
    url: String,
    #[serde(default)]
    blogname: String,
    /// RFC 3339 with offset.
    #[serde(default)]
    datetime: String,
}

pub struct TistoryCollector {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TistoryCollector {
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

    async fn search_page(&self, keyword: &str, page: u32) -> Result<BlogSearchResponse, CollectError> {
        let url = format!("{}/blog", self.base_url);
        let page = page.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", keyword),
                ("sort", "recency"),
                ("page", page.as_str()),
                ("size", PAGE_SIZE),
            ])
            .header(
                reqwest::header::AUTHORIZATION,
                format!("KakaoAK {}", self.api_key),
            )
            .send()
            .await?;
        read_json(response, &url, "kakao blog search").await
    }

    async fn collect_keyword(
        &self,
        keyword: &str,
        query: &CollectQuery,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<RawDocument>, CollectError> {
        let (from, until) = query.window();
        let mut documents = Vec::new();

        for page in 1..=MAX_PAGES {
            let response = self.search_page(keyword, page).await?;
            if response.documents.is_empty() {
                break;
            }

            let mut reached_boundary = false;
            for item in response.documents {
                let Some(posted) = DateTime::parse_from_rfc3339(item.datetime.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
                else {
                    continue;
                };
                if posted < from {
                    reached_boundary = true;
                    break;
                }
                if posted > until || !is_tistory(&item.url) {
                    continue;
                }
                documents.push(to_document(item, posted, keyword, fetched_at));
            }
            if reached_boundary || response.meta.is_end {
                break;
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl Collector for TistoryCollector {
    fn channel(&self) -> Channel {
        Channel::Tistory
    }

    fn source(&self) -> &str {
        "kakao_blog_search"
    }

    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError> {
        let fetched_at = Utc::now();
        let mut output = CollectOutput::default();

        for keyword in &query.keywords {
            match self.collect_keyword(keyword, query, fetched_at).await {
                Ok(documents) => {
                    tracing::debug!(keyword = %keyword, count = documents.len(), "collected tistory posts");
                    output.statuses.push(CollectStatus::counted(
                        Channel::Tistory,
                        self.source(),
                        keyword,
                        documents.len(),
                    ));
                    output.documents.extend(documents);
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "kakao blog search failed");
                    output.statuses.push(
                        CollectStatus::failed(Channel::Tistory, self.source(), e.to_string())
                            .with_keyword(keyword),
                    );
                }
            }
        }

        Ok(output)
    }
}

/// The Kakao index mixes blog hosts; only Tistory blogs belong to this channel.
fn is_tistory(url: &str) -> bool {
    url.contains("tistory.com")
}

fn to_document(
    item: BlogDocument,
    published_at: DateTime<Utc>,
    keyword: &str,
    fetched_at: DateTime<Utc>,
) -> RawDocument {
    let mut source_meta = Map::new();
    source_meta.insert("source".to_string(), json!("티스토리"));
    source_meta.insert("blogger_name".to_string(), Value::from(item.blogname));

    RawDocument {
        id: document_id(Channel::Tistory, keyword, &item.url, &published_at),
        channel: Channel::Tistory,
        keyword: keyword.to_string(),
        title: strip_html(&item.title),
        text: strip_html(&item.contents),
        url: item.url,
        published_at,
        fetched_at,
        source_meta,
    }
}
