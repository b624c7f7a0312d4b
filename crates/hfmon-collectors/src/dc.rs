//! DC Inside gallery search collector.
//!
//! Gallery list pages are HTML only. Rows are pulled out with a handful of
//! regular expressions; anything that does not look like a post row is
//! ignored.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use hfmon_core::{document_id, Channel, CollectState, CollectStatus, Gallery, RawDocument};
use regex::Regex;
use serde_json::{Map, Value};

use crate::news_rss::strip_html;
use crate::{check_status, CollectError, CollectOutput, CollectQuery, Collector};

const DEFAULT_BASE_URL: &str = "https://gall.dcinside.com";
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Paging limits and politeness delay for gallery scraping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcSettings {
    /// Pause between consecutive page requests.
    pub request_delay: Duration,
    /// Pages fetched per gallery and keyword.
    pub max_pages: u32,
    /// Posts kept per gallery and keyword.
    pub max_posts: usize,
}

impl Default for DcSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(1_000),
            max_pages: 5,
            max_posts: 100,
        }
    }
}

/// One post row from a gallery list page, before date parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListRow {
    title: String,
    href: String,
    date: String,
}

struct ListParser {
    row_re: Regex,
    class_re: Regex,
    title_re: Regex,
    date_re: Regex,
    title_attr_re: Regex,
}

impl ListParser {
    fn new() -> Self {
        Self {
            row_re: Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr>").expect("valid row regex"),
            class_re: Regex::new(r#"(?i)class\s*=\s*"([^"]*)""#).expect("valid class regex"),
            title_re: Regex::new(
                r#"(?is)<td[^>]*class\s*=\s*"[^"]*\bgall_tit\b[^"]*"[^>]*>.*?<a\b[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#,
            )
            .expect("valid title regex"),
            date_re: Regex::new(
                r#"(?is)<td([^>]*class\s*=\s*"[^"]*\bgall_date\b[^"]*"[^>]*)>(.*?)</td>"#,
            )
            .expect("valid date regex"),
            title_attr_re: Regex::new(r#"(?i)\btitle\s*=\s*"([^"]*)""#)
                .expect("valid title attribute regex"),
        }
    }

    /// Post rows in page order. Notice and ad rows are skipped, as are rows
    /// whose link is an ad or script.
    fn parse(&self, html: &str) -> Vec<ListRow> {
        let mut rows = Vec::new();
        for caps in self.row_re.captures_iter(html) {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            if self.is_filler_row(attrs) {
                continue;
            }

            let Some(title_caps) = self.title_re.captures(body) else {
                continue;
            };
            let href = strip_html(title_caps.get(1).map_or("", |m| m.as_str()));
            let title = strip_html(title_caps.get(2).map_or("", |m| m.as_str()));
            if title.chars().count() < 2
                || href.starts_with("javascript")
                || href.contains("addc.dcinside.com")
            {
                continue;
            }

            let date = self
                .date_re
                .captures(body)
                .map(|date_caps| {
                    let attrs = date_caps.get(1).map_or("", |m| m.as_str());
                    self.title_attr_re
                        .captures(attrs)
                        .and_then(|t| t.get(1))
                        .map_or_else(
                            || strip_html(date_caps.get(2).map_or("", |m| m.as_str())),
                            |t| t.as_str().trim().to_string(),
                        )
                })
                .unwrap_or_default();

            rows.push(ListRow { title, href, date });
        }
        rows
    }

    fn is_filler_row(&self, attrs: &str) -> bool {
        if attrs.contains("notice") {
            return true;
        }
        self.class_re
            .captures(attrs)
            .and_then(|c| c.get(1))
            .is_some_and(|class| class.as_str().split_whitespace().any(|token| token == "ad"))
    }
}

/// Tally for one keyword across every targeted gallery.
#[derive(Debug, Default)]
struct KeywordRun {
    documents: Vec<RawDocument>,
    failed_pages: usize,
}

pub struct DcCollector {
    client: reqwest::Client,
    galleries: Vec<Gallery>,
    base_url: String,
    settings: DcSettings,
    parser: ListParser,
}

impl DcCollector {
    /// Collector over the enabled entries of `galleries`.
    #[must_use]
    pub fn new(client: reqwest::Client, galleries: &[Gallery]) -> Self {
        Self::with_base_url(client, galleries, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: reqwest::Client, galleries: &[Gallery], base_url: &str) -> Self {
        Self {
            client,
            galleries: galleries.iter().filter(|g| g.enabled).cloned().collect(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings: DcSettings::default(),
            parser: ListParser::new(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: DcSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn has_galleries(&self) -> bool {
        !self.galleries.is_empty()
    }

    /// Galleries named by `ids` (matching either the watchlist id or the
    /// site's gallery id). An empty or unmatched selection means all.
    fn targets(&self, ids: &[String]) -> Vec<&Gallery> {
        let selected: Vec<&Gallery> = self
            .galleries
            .iter()
            .filter(|g| ids.iter().any(|id| *id == g.id || *id == g.gallery_id))
            .collect();
        if selected.is_empty() {
            if !ids.is_empty() {
                tracing::debug!(gallery_ids = ?ids, "no enabled gallery matches; searching all");
            }
            self.galleries.iter().collect()
        } else {
            selected
        }
    }

    async fn fetch_page(&self, gallery: &Gallery, keyword: &str, page: u32) -> Result<String, CollectError> {
        let url = format!("{}/board/lists/", self.base_url);
        let page = page.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("id", gallery.gallery_id.as_str()),
                ("s_type", "search_subject_memo"),
                ("s_keyword", keyword),
                ("page", page.as_str()),
            ])
            .header(
                reqwest::header::REFERER,
                format!("{url}?id={}", gallery.gallery_id),
            )
            .send()
            .await?;
        Ok(check_status(response, &url).await?.text().await?)
    }

    /// Walk one gallery's search pages, newest first, until the window's
    /// start is passed or a limit is hit.
    async fn collect_gallery(
        &self,
        gallery: &Gallery,
        keyword: &str,
        query: &CollectQuery,
        fetched_at: DateTime<Utc>,
        requests: &mut usize,
        run: &mut KeywordRun,
    ) {
        let (from, until) = query.window();
        let mut kept = 0usize;

        for page in 1..=self.settings.max_pages {
            if *requests > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }
            *requests += 1;

            let html = match self.fetch_page(gallery, keyword, page).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(
                        gallery = %gallery.gallery_id,
                        keyword = %keyword,
                        page,
                        error = %e,
                        "gallery page fetch failed"
                    );
                    run.failed_pages += 1;
                    break;
                }
            };

            let rows = self.parser.parse(&html);
            if rows.is_empty() {
                break;
            }

            let mut reached_boundary = false;
            for row in rows {
                let Some(posted) = parse_list_date(&row.date, fetched_at) else {
                    continue;
                };
                if posted < from {
                    reached_boundary = true;
                    break;
                }
                if posted > until {
                    continue;
                }
                let url = self.absolute_url(&row.href);
                run.documents
                    .push(to_document(gallery, row.title, url, posted, keyword, fetched_at));
                kept += 1;
                if kept >= self.settings.max_posts {
                    break;
                }
            }
            if reached_boundary || kept >= self.settings.max_posts {
                break;
            }
        }
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{href}", self.base_url)
        } else {
            format!("{}/{href}", self.base_url)
        }
    }
}

#[async_trait]
impl Collector for DcCollector {
    fn channel(&self) -> Channel {
        Channel::Dc
    }

    fn source(&self) -> &str {
        "dcinside_gallery"
    }

    async fn collect(&self, query: &CollectQuery) -> Result<CollectOutput, CollectError> {
        let fetched_at = Utc::now();
        let targets = self.targets(&query.gallery_ids);
        let mut requests = 0usize;
        let mut output = CollectOutput::default();

        for keyword in &query.keywords {
            let mut run = KeywordRun::default();
            for gallery in &targets {
                self.collect_gallery(gallery, keyword, query, fetched_at, &mut requests, &mut run)
                    .await;
            }

            let count = run.documents.len();
            tracing::debug!(
                keyword = %keyword,
                galleries = targets.len(),
                count,
                failed_pages = run.failed_pages,
                "collected gallery posts"
            );
            output.statuses.push(keyword_status(self.source(), keyword, &run));
            output.documents.extend(run.documents);
        }

        Ok(output)
    }
}

/// `success` with posts; `failed` when nothing came back and a page request
/// failed; `partial` when every page answered but nothing matched.
fn keyword_status(source: &str, keyword: &str, run: &KeywordRun) -> CollectStatus {
    let count = run.documents.len();
    if count == 0 && run.failed_pages > 0 {
        return CollectStatus::failed(
            Channel::Dc,
            source,
            format!("{} gallery page request(s) failed", run.failed_pages),
        )
        .with_keyword(keyword);
    }
    let mut status = CollectStatus::counted(Channel::Dc, source, keyword, count);
    if status.status == CollectState::Partial {
        status.error = Some("no posts found in the requested window".to_string());
    }
    status
}

/// Gallery list dates in Korea time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY.MM.DD HH:MM`, `YY/MM/DD`, `YY.MM.DD`
/// and `YYYY.MM.DD` (date-only forms at noon), plus `HH:MM` for posts made
/// on the day of `fetched_at`.
fn parse_list_date(raw: &str, fetched_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS)?;
    let noon = NaiveTime::from_hms_opt(12, 0, 0)?;
    let raw = raw.trim();

    let local = if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        dt
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y.%m.%d %H:%M") {
        dt
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%y/%m/%d") {
        date.and_time(noon)
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%y.%m.%d") {
        date.and_time(noon)
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y.%m.%d") {
        date.and_time(noon)
    } else if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        fetched_at.with_timezone(&kst).date_naive().and_time(time)
    } else {
        return None;
    };

    local
        .and_local_timezone(kst)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_document(
    gallery: &Gallery,
    title: String,
    url: String,
    published_at: DateTime<Utc>,
    keyword: &str,
    fetched_at: DateTime<Utc>,
) -> RawDocument {
    let mut source_meta = Map::new();
    source_meta.insert(
        "source".to_string(),
        Value::from(format!("DC인사이드 {}갤러리", gallery.name)),
    );
    source_meta.insert("gallery_name".to_string(), Value::from(gallery.name.as_str()));
    source_meta.insert("gallery_id".to_string(), Value::from(gallery.gallery_id.as_str()));

    RawDocument {
        id: document_id(Channel::Dc, keyword, &url, &published_at),
        channel: Channel::Dc,
        keyword: keyword.to_string(),
        text: title.clone(),
        title,
        url,
        published_at,
        fetched_at,
        source_meta,
    }
}
