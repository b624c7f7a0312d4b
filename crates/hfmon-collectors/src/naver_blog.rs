//! Naver Open API blog search collector.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hfmon_core::{document_id, Channel, CollectStatus, RawDocument};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::news_rss::strip_html;
use crate::{read_json, CollectError, CollectOutput, CollectQuery, Collector};

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/v1/search";
const PAGE_SIZE: &str = "50";
/// 1-based result offsets; the API serves two pages of 50 per keyword here.
const PAGE_STARTS: [&str; 2] = ["1", "51"];

#[derive(Debug, Deserialize)]
struct BlogSearchResponse {
    #[serde(default)]
    items: Vec<BlogItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlogItem {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    bloggername: String,
    #[serde(default)]
    bloggerlink: String,
    /// `YYYYMMDD`.
    #[serde(default)]
    postdate: String,
}

pub struct NaverBlogCollector {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    base_url: String,
}

impl NaverBlogCollector {
    #[must_use]
    pub fn new(client: reqwest::Client, client_id: &str, client_secret: &str) -> Self {
        Self::with_base_url(client, client_id, client_secret, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(
        client: reqwest::Client,
        client_id: &str,
        client_secret: &str,
        base_url: &str,
    ) -> Self {
        Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search_page(&self, keyword: &str, start: &str) -> Result<Vec<BlogItem>, CollectError> {
        let url = format!("{}/blog.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", keyword),
                ("display", PAGE_SIZE),
                ("start", start),
                ("sort", "date"),
            ])
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .send()
            .await?;
        let page: BlogSearchResponse = read_json(response, &url, "naver blog search").await?;
        Ok(page.items)
    }

    /// Results arrive newest first, so the first post older than the window
    /// ends pagination.
    async fn collect_keyword(
        &self,
        keyword: &str,
        query: &CollectQuery,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<RawDocument>, CollectError> {
        let (from, until) = query.window();
        let mut documents = Vec::new();

        for start in PAGE_STARTS {
            let items = self.search_page(keyword, start).await?;
            if items.is_empty() {
                break;
            }

            let mut reached_boundary = false;
            for item in items {
                let Some(posted) = parse_postdate(&item.postdate) else {
                    continue;
                };
                if posted < from {
                    reached_boundary = true;
                    break;
                }
                if posted > until {
                    continue;
                }
                documents.push(to_document(item, posted, keyword, fetched_at));
            }
            if reached_boundary {
                break;
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl Collector for NaverBlogCollector {
    fn channel(&self) -> Channel {
        Channel::Blog
    }

    fn source(&self) -> &str {
        "naver_blog_search"
    }

    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError> {
        let fetched_at = Utc::now();
        let mut output = CollectOutput::default();

        for keyword in &query.keywords {
            match self.collect_keyword(keyword, query, fetched_at).await {
                Ok(documents) => {
                    tracing::debug!(keyword = %keyword, count = documents.len(), "collected naver blog posts");
                    output.statuses.push(CollectStatus::counted(
                        Channel::Blog,
                        self.source(),
                        keyword,
                        documents.len(),
                    ));
                    output.documents.extend(documents);
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "naver blog search failed");
                    output.statuses.push(
                        CollectStatus::failed(Channel::Blog, self.source(), e.to_string())
                            .with_keyword(keyword),
                    );
                }
            }
        }

        Ok(output)
    }
}

/// `YYYYMMDD` as midnight UTC.
fn parse_postdate(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn to_document(
    item: BlogItem,
    published_at: DateTime<Utc>,
    keyword: &str,
    fetched_at: DateTime<Utc>,
) -> RawDocument {
    let mut source_meta = Map::new();
    source_meta.insert("source".to_string(), json!("네이버 블로그"));
    source_meta.insert("blogger_name".to_string(), Value::from(item.bloggername));
    source_meta.insert("blog_link".to_string(), Value::from(item.bloggerlink));

    RawDocument {
        id: document_id(Channel::Blog, keyword, &item.link, &published_at),
        channel: Channel::Blog,
        keyword: keyword.to_string(),
        title: strip_html(&item.title),
        text: strip_html(&item.description),
        url: item.link,
        published_at,
        fetched_at,
        source_meta,
    }
}
