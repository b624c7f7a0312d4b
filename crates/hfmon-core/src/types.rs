use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CoreError;

/// A monitored source of mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    News,
    Youtube,
    Dc,
    Instagram,
    Blog,
    Tistory,
    Blind,
}

impl Channel {
    /// Every channel, in wire order.
    pub const ALL: [Channel; 7] = [
        Channel::News,
        Channel::Youtube,
        Channel::Dc,
        Channel::Instagram,
        Channel::Blog,
        Channel::Tistory,
        Channel::Blind,
    ];

    /// Channels collected when a request does not name any.
    pub const DEFAULT_SET: [Channel; 3] = [Channel::News, Channel::Youtube, Channel::Dc];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::News => "news",
            Channel::Youtube => "youtube",
            Channel::Dc => "dc",
            Channel::Instagram => "instagram",
            Channel::Blog => "blog",
            Channel::Tistory => "tistory",
            Channel::Blind => "blind",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownChannel(s.to_string()))
    }
}

/// Width of one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "quarterly" => Ok(Granularity::Quarterly),
            "yearly" => Ok(Granularity::Yearly),
            _ => Err(CoreError::UnknownGranularity(s.to_string())),
        }
    }
}

/// Sentiment label assigned to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// One observed mention, as returned by a collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Deterministic id, see [`document_id`].
    pub id: String,
    pub channel: Channel,
    /// Watch-list keyword the document was collected for.
    pub keyword: String,
    pub title: String,
    /// Body text or snippet. May be empty.
    pub text: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    /// Source-specific extras (view counts, gallery name, blogger handle...).
    #[serde(default)]
    pub source_meta: serde_json::Map<String, serde_json::Value>,
}

/// Stable document id derived from channel, keyword, URL and publish time.
///
/// Repeated fetches of the same item produce the same id, which is what
/// collection-level de-duplication keys on.
#[must_use]
pub fn document_id(
    channel: Channel,
    keyword: &str,
    url: &str,
    published_at: &DateTime<Utc>,
) -> String {
    let input = format!(
        "{}\x00{}\x00{}\x00{}",
        channel,
        keyword,
        url,
        published_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    format!("{channel}_{}", &digest[..16])
}

/// Outcome class of one collection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectState {
    Success,
    Partial,
    Failed,
    Skipped,
}

impl CollectState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CollectState::Success => "success",
            CollectState::Partial => "partial",
            CollectState::Failed => "failed",
            CollectState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for CollectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel (and usually per-keyword) record of how collection went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectStatus {
    pub channel: Channel,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub status: CollectState,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectStatus {
    #[must_use]
    pub fn failed(channel: Channel, source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            channel,
            source: source.into(),
            keyword: None,
            status: CollectState::Failed,
            count: 0,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn skipped(channel: Channel, source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            channel,
            source: source.into(),
            keyword: None,
            status: CollectState::Skipped,
            count: 0,
            error: Some(reason.into()),
        }
    }

    /// `success` when anything usable came back, `partial` otherwise.
    #[must_use]
    pub fn counted(channel: Channel, source: impl Into<String>, keyword: &str, count: usize) -> Self {
        Self {
            channel,
            source: source.into(),
            keyword: Some(keyword.to_string()),
            status: if count > 0 {
                CollectState::Success
            } else {
                CollectState::Partial
            },
            count,
            error: None,
        }
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }
}
