//! Google News RSS collector (Korean edition).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hfmon_core::{document_id, Channel, CollectStatus, RawDocument};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Map, Value};

use crate::{check_status, CollectError, CollectOutput, CollectQuery, Collector};

const DEFAULT_BASE_URL: &str = "https://news.google.com";

/// One `<item>` from an RSS feed, fields as found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Description with HTML tags removed.
    pub description: String,
    pub pub_date: Option<String>,
    /// Publisher named in `<source>`, when present.
    pub source: Option<String>,
}

pub struct NewsRssCollector {
    client: reqwest::Client,
    base_url: String,
}

impl NewsRssCollector {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn feed_url(&self, keyword: &str) -> String {
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC);
        format!(
            "{}/rss/search?q={encoded}&hl=ko&gl=KR&ceid=KR:ko",
            self.base_url
        )
    }

    async fn fetch_feed(&self, keyword: &str) -> Result<Vec<FeedItem>, CollectError> {
        let url = self.feed_url(keyword);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9")
            .send()
            .await?;
        let body = check_status(response, &url).await?.text().await?;
        parse_news_feed(&body)
    }
}

#[async_trait]
impl Collector for NewsRssCollector {
    fn channel(&self) -> Channel {
        Channel::News
    }

    fn source(&self) -> &str {
        "google_news_rss"
    }

    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError> {
        let fetched_at = Utc::now();
        let mut output = CollectOutput::default();

        for keyword in &query.keywords {
            match self.fetch_feed(keyword).await {
                Ok(items) => {
                    let before = output.documents.len();
                    output.documents.extend(
                        items
                            .into_iter()
                            .filter_map(|item| to_document(item, keyword, fetched_at))
                            .filter(|doc| query.contains(&doc.published_at)),
                    );
                    let count = output.documents.len() - before;
                    tracing::debug!(keyword = %keyword, count, "collected news items");
                    output
                        .statuses
                        .push(CollectStatus::counted(Channel::News, self.source(), keyword, count));
                }
                Err(e) => {
                    tracing::warn!(keyword = %keyword, error = %e, "news RSS fetch failed");
                    output.statuses.push(
                        CollectStatus::failed(Channel::News, self.source(), e.to_string())
                            .with_keyword(keyword),
                    );
                }
            }
        }

        Ok(output)
    }
}

fn to_document(item: FeedItem, keyword: &str, fetched_at: DateTime<Utc>) -> Option<RawDocument> {
    let published_at = item
        .pub_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc2822(raw.trim()).ok())?
        .with_timezone(&Utc);

    let text = if item.description.is_empty() {
        item.title.clone()
    } else {
        item.description
    };

    let mut source_meta = Map::new();
    source_meta.insert(
        "source".to_string(),
        item.source.map_or_else(|| json!("Google News"), Value::String),
    );

    Some(RawDocument {
        id: document_id(Channel::News, keyword, &item.link, &published_at),
        channel: Channel::News,
        keyword: keyword.to_string(),
        title: item.title,
        text,
        url: item.link,
        published_at,
        fetched_at,
        source_meta,
    })
}

/// Parse RSS XML into its `<item>`s. Items without a link are dropped.
///
/// # Errors
///
/// Returns [`CollectError::Xml`] if the XML is malformed.
pub fn parse_news_feed(xml: &str) -> Result<Vec<FeedItem>, CollectError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current = FeedItem::default();
    let mut in_item = false;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    current = FeedItem::default();
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" && in_item {
                    in_item = false;
                    if !current.link.is_empty() {
                        items.push(std::mem::take(&mut current));
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    assign_field(&mut current, &current_tag, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign_field(&mut current, &current_tag, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CollectError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn assign_field(item: &mut FeedItem, tag: &str, text: &str) {
    match tag {
        "title" => item.title.push_str(text),
        "link" => item.link.push_str(text.trim()),
        "description" => {
            let stripped = strip_html(text);
            if !item.description.is_empty() && !stripped.is_empty() {
                item.description.push(' ');
            }
            item.description.push_str(&stripped);
        }
        "pubDate" => item.pub_date = Some(text.to_string()),
        "source" => item.source = Some(text.to_string()),
        _ => {}
    }
}

/// Strip HTML tags from a string, returning plain text with common entities
/// decoded and runs of whitespace collapsed.
pub(crate) fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                result.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
