use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use hfmon_core::{Channel, CollectStatus, Granularity, RawDocument, Sentiment};
use serde::{Deserialize, Serialize};

/// A collected document with its sentiment attached.
///
/// The raw fields are flattened on the wire, so an analyzed document reads as
/// a `RawDocument` with two extra keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedDocument {
    #[serde(flatten)]
    pub document: RawDocument,
    pub sentiment: Sentiment,
    /// Score in [-1.0, 1.0].
    pub sentiment_score: f64,
}

/// One half-open calendar interval `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    /// ISO date of `start`; the key every per-bucket series is joined on.
    pub bucket: String,
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One counter per channel. All seven keys are always serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub news: usize,
    pub youtube: usize,
    pub dc: usize,
    pub instagram: usize,
    pub blog: usize,
    pub tistory: usize,
    pub blind: usize,
}

impl ChannelCounts {
    #[must_use]
    pub fn get(&self, channel: Channel) -> usize {
        match channel {
            Channel::News => self.news,
            Channel::Youtube => self.youtube,
            Channel::Dc => self.dc,
            Channel::Instagram => self.instagram,
            Channel::Blog => self.blog,
            Channel::Tistory => self.tistory,
            Channel::Blind => self.blind,
        }
    }

    pub fn increment(&mut self, channel: Channel) {
        let slot = match channel {
            Channel::News => &mut self.news,
            Channel::Youtube => &mut self.youtube,
            Channel::Dc => &mut self.dc,
            Channel::Instagram => &mut self.instagram,
            Channel::Blog => &mut self.blog,
            Channel::Tistory => &mut self.tistory,
            Channel::Blind => &mut self.blind,
        };
        *slot += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        Channel::ALL.into_iter().map(|c| self.get(c)).sum()
    }
}

/// Mention volume for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionDataPoint {
    pub bucket: String,
    pub label: String,
    pub total: usize,
    #[serde(flatten)]
    pub channels: ChannelCounts,
}

/// Sentiment mix for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDataPoint {
    pub bucket: String,
    pub label: String,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Integer percent of the bucket total; 0 for an empty bucket.
    pub positive_ratio: u32,
    pub neutral_ratio: u32,
    pub negative_ratio: u32,
    pub avg_score: f64,
    /// Change in negative count from the previous bucket. Absent on the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_negative: Option<i64>,
    pub negative_zscore: f64,
}

impl SentimentDataPoint {
    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// A bucket with notable negative volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeSpike {
    pub bucket: String,
    pub zscore: f64,
    pub negative_count: usize,
    /// Fraction of the bucket that was negative, 0.0..=1.0.
    pub negative_ratio: f64,
    pub is_spike: bool,
}

/// A term whose frequency in the latest bucket stands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendKeyword {
    pub keyword: String,
    pub zscore: f64,
    /// Occurrences in the latest bucket.
    pub count: usize,
    /// Occurrences in the bucket before it.
    pub prev_count: usize,
    pub delta: i64,
    pub is_trending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub bucket: String,
    pub count: usize,
}

/// Roll-up of documents collected for one watch-list keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMention {
    pub keyword: String,
    pub total: usize,
    /// Only channels with at least one mention.
    pub by_channel: BTreeMap<Channel, usize>,
    /// One entry per bucket, chronological.
    pub by_bucket: Vec<BucketCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    pub keywords: Vec<String>,
    pub channels: Vec<Channel>,
    pub generated_at: DateTime<Utc>,
    pub total_documents: usize,
    /// Documents published outside the span the buckets cover. Those before
    /// the first bucket are still counted in it; those after the last land in
    /// the last bucket.
    #[serde(default)]
    pub out_of_range_documents: usize,
}

/// Everything the dashboard needs for one request. Built once, then cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub meta: AnalyticsMeta,
    pub mentions: Vec<MentionDataPoint>,
    pub sentiment: Vec<SentimentDataPoint>,
    pub trend_keywords: Vec<TrendKeyword>,
    pub keyword_mentions: Vec<KeywordMention>,
    pub negative_spikes: Vec<NegativeSpike>,
    pub top_documents: Vec<AnalyzedDocument>,
    pub channel_stats: BTreeMap<Channel, usize>,
    pub collect_status: Vec<CollectStatus>,
    #[serde(default)]
    pub from_cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts_serialize_every_channel() {
        let mut counts = ChannelCounts::default();
        counts.increment(Channel::Dc);
        counts.increment(Channel::Dc);
        let json = serde_json::to_value(counts).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 7);
        assert_eq!(obj["dc"], 2);
        assert_eq!(obj["blind"], 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn mention_point_flattens_channel_counts() {
        let point = MentionDataPoint {
            bucket: "2024-01-01".to_string(),
            label: "2024/1".to_string(),
            total: 1,
            channels: ChannelCounts {
                news: 1,
                ..ChannelCounts::default()
            },
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["news"], 1);
        assert_eq!(json["total"], 1);
        assert!(json.get("channels").is_none());
    }

    #[test]
    fn first_bucket_omits_delta_negative() {
        let point = SentimentDataPoint {
            bucket: "2024-01-01".to_string(),
            label: "1/1".to_string(),
            positive: 0,
            neutral: 0,
            negative: 0,
            positive_ratio: 0,
            neutral_ratio: 0,
            negative_ratio: 0,
            avg_score: 0.0,
            delta_negative: None,
            negative_zscore: 0.0,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert!(json.get("delta_negative").is_none());
    }

    #[test]
    fn channel_keyed_maps_use_wire_names() {
        let mut stats = BTreeMap::new();
        stats.insert(Channel::Youtube, 3usize);
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"youtube":3}"#);
        let back: BTreeMap<Channel, usize> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
