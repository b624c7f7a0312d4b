use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use hfmon_core::{Channel, CollectStatus, Granularity, RawDocument, Sentiment};

use crate::buckets::{assign_bucket, build_buckets, covers};
use crate::keywords::KeywordExtractor;
use crate::sentiment::classify_all;
use crate::trends::detect_trends;
use crate::types::{
    AnalyticsMeta, AnalyticsResult, AnalyzedDocument, BucketCount, ChannelCounts, KeywordMention,
    MentionDataPoint, NegativeSpike, SentimentDataPoint, TimeBucket,
};
use crate::zscore::{round_to, zscores_of_counts};

/// Most documents carried in `top_documents`.
pub const MAX_TOP_DOCUMENTS: usize = 50;

/// A bucket is reported in `negative_spikes` at or above this z-score, or
/// whenever it has any negative document.
pub const SPIKE_REPORT_ZSCORE: f64 = 1.5;

/// Z-score at or above which a reported bucket is flagged `is_spike`.
pub const SPIKE_ZSCORE: f64 = 2.0;

/// Everything one aggregation run needs.
#[derive(Debug, Clone)]
pub struct AggregateInput {
    pub documents: Vec<RawDocument>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub granularity: Granularity,
    /// Watch-list keywords to roll up in `keyword_mentions`.
    pub keywords: Vec<String>,
    /// Requested channels; documents from other channels are ignored.
    pub channels: Vec<Channel>,
    /// Passed through verbatim.
    pub collect_statuses: Vec<CollectStatus>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SentimentTally {
    positive: usize,
    neutral: usize,
    negative: usize,
    score_sum: f64,
}

impl SentimentTally {
    fn add(&mut self, doc: &AnalyzedDocument) {
        match doc.sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
        self.score_sum += doc.sentiment_score;
    }

    fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Build the full analytics result for one request, stamped with the current
/// time.
#[must_use]
pub fn aggregate(input: AggregateInput, extractor: &KeywordExtractor) -> AnalyticsResult {
    aggregate_at(input, extractor, Utc::now())
}

/// [`aggregate`] with an explicit `generated_at`.
#[must_use]
pub fn aggregate_at(
    input: AggregateInput,
    extractor: &KeywordExtractor,
    generated_at: DateTime<Utc>,
) -> AnalyticsResult {
    let AggregateInput {
        documents,
        start_date,
        end_date,
        granularity,
        keywords,
        channels,
        collect_statuses,
    } = input;

    let requested: Vec<RawDocument> = documents
        .into_iter()
        .filter(|doc| channels.contains(&doc.channel))
        .collect();
    let analyzed = classify_all(requested);
    let buckets = build_buckets(start_date, end_date, granularity);

    let placements: Vec<Option<usize>> = analyzed
        .iter()
        .map(|doc| assign_bucket(doc.document.published_at.date_naive(), &buckets))
        .collect();
    let out_of_range_documents = analyzed
        .iter()
        .filter(|doc| !covers(&buckets, doc.document.published_at.date_naive()))
        .count();
    if out_of_range_documents > 0 {
        tracing::debug!(
            out_of_range = out_of_range_documents,
            start = %start_date,
            end = %end_date,
            "documents published outside the bucket span"
        );
    }

    let mut channel_stats: BTreeMap<Channel, usize> =
        channels.iter().map(|&channel| (channel, 0)).collect();
    for doc in &analyzed {
        *channel_stats.entry(doc.document.channel).or_insert(0) += 1;
    }

    let mut per_channel = vec![ChannelCounts::default(); buckets.len()];
    let mut tallies = vec![SentimentTally::default(); buckets.len()];
    for (doc, placement) in analyzed.iter().zip(&placements) {
        if let Some(idx) = *placement {
            per_channel[idx].increment(doc.document.channel);
            tallies[idx].add(doc);
        }
    }

    let mentions: Vec<MentionDataPoint> = buckets
        .iter()
        .zip(&per_channel)
        .map(|(bucket, counts)| MentionDataPoint {
            bucket: bucket.bucket.clone(),
            label: bucket.label.clone(),
            total: counts.total(),
            channels: *counts,
        })
        .collect();

    let negatives: Vec<usize> = tallies.iter().map(|t| t.negative).collect();
    let negative_zscores = zscores_of_counts(&negatives);

    let sentiment: Vec<SentimentDataPoint> = buckets
        .iter()
        .zip(&tallies)
        .enumerate()
        .map(|(i, (bucket, tally))| {
            let total = tally.total();
            #[allow(clippy::cast_precision_loss)]
            let avg_score = if total > 0 {
                tally.score_sum / total as f64
            } else {
                0.0
            };
            #[allow(clippy::cast_possible_wrap)]
            let delta_negative =
                (i > 0).then(|| tally.negative as i64 - negatives[i - 1] as i64);
            SentimentDataPoint {
                bucket: bucket.bucket.clone(),
                label: bucket.label.clone(),
                positive: tally.positive,
                neutral: tally.neutral,
                negative: tally.negative,
                positive_ratio: percent(tally.positive, total),
                neutral_ratio: percent(tally.neutral, total),
                negative_ratio: percent(tally.negative, total),
                avg_score: round_to(avg_score, 2),
                delta_negative,
                negative_zscore: round_to(negative_zscores.get(i).copied().unwrap_or(0.0), 2),
            }
        })
        .collect();

    let negative_spikes = negative_spikes(&sentiment);
    let trend_keywords = detect_trends(&analyzed, &buckets, extractor);
    let keyword_mentions = keyword_mentions(&keywords, &analyzed, &placements, &buckets);
    let top_documents = top_documents(&analyzed);

    tracing::debug!(
        documents = analyzed.len(),
        buckets = buckets.len(),
        spikes = negative_spikes.iter().filter(|s| s.is_spike).count(),
        trends = trend_keywords.len(),
        "aggregation complete"
    );

    AnalyticsResult {
        meta: AnalyticsMeta {
            start_date,
            end_date,
            granularity,
            keywords,
            channels,
            generated_at,
            total_documents: analyzed.len(),
            out_of_range_documents,
        },
        mentions,
        sentiment,
        trend_keywords,
        keyword_mentions,
        negative_spikes,
        top_documents,
        channel_stats,
        collect_status: collect_statuses,
        from_cache: false,
    }
}

/// Integer percent, rounded half away from zero. 0 when `total` is 0.
pub(crate) fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let pct = (part as f64 / total as f64 * 100.0).round() as u32;
    pct
}

fn negative_spikes(sentiment: &[SentimentDataPoint]) -> Vec<NegativeSpike> {
    sentiment
        .iter()
        .filter(|point| point.negative_zscore >= SPIKE_REPORT_ZSCORE || point.negative > 0)
        .map(|point| {
            let total = point.total();
            #[allow(clippy::cast_precision_loss)]
            let ratio = if total > 0 {
                point.negative as f64 / total as f64
            } else {
                0.0
            };
            NegativeSpike {
                bucket: point.bucket.clone(),
                zscore: point.negative_zscore,
                negative_count: point.negative,
                negative_ratio: round_to(ratio, 2),
                is_spike: point.negative_zscore >= SPIKE_ZSCORE,
            }
        })
        .collect()
}

fn keyword_mentions(
    keywords: &[String],
    analyzed: &[AnalyzedDocument],
    placements: &[Option<usize>],
    buckets: &[TimeBucket],
) -> Vec<KeywordMention> {
    let mut mentions: Vec<KeywordMention> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for keyword in keywords {
        if index.contains_key(keyword.as_str()) {
            continue;
        }
        index.insert(keyword.as_str(), mentions.len());
        mentions.push(KeywordMention {
            keyword: keyword.clone(),
            total: 0,
            by_channel: BTreeMap::new(),
            by_bucket: buckets
                .iter()
                .map(|b| BucketCount {
                    bucket: b.bucket.clone(),
                    count: 0,
                })
                .collect(),
        });
    }

    for (doc, placement) in analyzed.iter().zip(placements) {
        let Some(&idx) = index.get(doc.document.keyword.as_str()) else {
            continue;
        };
        let entry = &mut mentions[idx];
        entry.total += 1;
        *entry.by_channel.entry(doc.document.channel).or_insert(0) += 1;
        if let Some(bucket_idx) = *placement {
            entry.by_bucket[bucket_idx].count += 1;
        }
    }

    mentions
}

/// Negative documents first, then newest first.
fn top_documents(analyzed: &[AnalyzedDocument]) -> Vec<AnalyzedDocument> {
    let mut docs = analyzed.to_vec();
    docs.sort_by(|a, b| {
        let a_neg = a.sentiment == Sentiment::Negative;
        let b_neg = b.sentiment == Sentiment::Negative;
        match (a_neg, b_neg) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => b.document.published_at.cmp(&a.document.published_at),
        }
    });
    docs.truncate(MAX_TOP_DOCUMENTS);
    docs
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use hfmon_core::document_id;

    use super::*;
    use crate::keywords::KeywordRules;

    fn raw(channel: Channel, keyword: &str, title: &str, at: DateTime<Utc>) -> RawDocument {
        let url = format!("https://{channel}.example/{title}/{}", at.timestamp());
        RawDocument {
            id: document_id(channel, keyword, &url, &at),
            channel,
            keyword: keyword.to_string(),
            title: title.to_string(),
            text: String::new(),
            url,
            published_at: at,
            fetched_at: at,
            source_meta: serde_json::Map::new(),
        }
    }

    fn input(documents: Vec<RawDocument>) -> AggregateInput {
        AggregateInput {
            documents,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            granularity: Granularity::Monthly,
            keywords: vec!["HF".to_string(), "주택연금".to_string()],
            channels: vec![Channel::News, Channel::Youtube],
            collect_statuses: Vec::new(),
        }
    }

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(KeywordRules {
            min_token_len: 2,
            ..KeywordRules::default()
        })
    }

    #[test]
    fn empty_input_yields_zeroed_buckets() {
        let result = aggregate(input(Vec::new()), &extractor());
        assert_eq!(result.meta.total_documents, 0);
        assert_eq!(result.mentions.len(), 3);
        assert!(result.mentions.iter().all(|m| m.total == 0));
        assert!(result.sentiment.iter().all(|s| s.negative_zscore == 0.0));
        assert!(result.negative_spikes.is_empty());
        assert!(result.trend_keywords.is_empty());
        assert_eq!(result.channel_stats.get(&Channel::News), Some(&0));
        assert_eq!(result.channel_stats.get(&Channel::Youtube), Some(&0));
        assert!(!result.from_cache);
    }

    #[test]
    fn unrequested_channels_are_ignored() {
        let at = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let docs = vec![
            raw(Channel::News, "HF", "소식", at),
            raw(Channel::Blind, "HF", "소식", at),
        ];
        let result = aggregate(input(docs), &extractor());
        assert_eq!(result.meta.total_documents, 1);
        assert!(!result.channel_stats.contains_key(&Channel::Blind));
        assert_eq!(result.mentions[1].channels.blind, 0);
    }

    #[test]
    fn ratios_round_to_integer_percent() {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let docs = vec![
            raw(Channel::News, "HF", "성공", at),
            raw(Channel::News, "HF", "소식", at),
            raw(Channel::News, "HF", "공지", at),
        ];
        let result = aggregate(input(docs), &extractor());
        let first = &result.sentiment[0];
        assert_eq!(first.positive, 1);
        assert_eq!(first.neutral, 2);
        assert_eq!(first.positive_ratio, 33);
        assert_eq!(first.neutral_ratio, 67);
        assert_eq!(first.negative_ratio, 0);
        assert_eq!(first.avg_score, 0.33);
    }

    #[test]
    fn delta_negative_absent_only_on_first_bucket() {
        let at = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let result = aggregate(input(vec![raw(Channel::News, "HF", "위기", at)]), &extractor());
        assert_eq!(result.sentiment[0].delta_negative, None);
        assert_eq!(result.sentiment[1].delta_negative, Some(1));
        assert_eq!(result.sentiment[2].delta_negative, Some(-1));
    }

    #[test]
    fn keyword_mentions_are_dense_per_bucket() {
        let at = Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap();
        let docs = vec![
            raw(Channel::News, "HF", "소식", at),
            raw(Channel::Youtube, "HF", "영상", at),
            raw(Channel::News, "기타", "소식", at),
        ];
        let result = aggregate(input(docs), &extractor());
        assert_eq!(result.keyword_mentions.len(), 2);
        let hf = &result.keyword_mentions[0];
        assert_eq!(hf.total, 2);
        assert_eq!(hf.by_channel.len(), 2);
        let counts: Vec<_> = hf.by_bucket.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 0, 2]);
        let pension = &result.keyword_mentions[1];
        assert_eq!(pension.total, 0);
        assert!(pension.by_channel.is_empty());
        assert_eq!(pension.by_bucket.len(), 3);
    }

    #[test]
    fn out_of_range_documents_are_counted_and_folded() {
        let before = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let docs = vec![
            raw(Channel::News, "HF", "소식", before),
            raw(Channel::News, "HF", "공지", after),
        ];
        let result = aggregate(input(docs), &extractor());
        assert_eq!(result.meta.out_of_range_documents, 2);
        assert_eq!(result.mentions[0].total, 1);
        assert_eq!(result.mentions[2].total, 1);
    }

    #[test]
    fn top_documents_put_negatives_first_then_newest() {
        let docs = vec![
            raw(Channel::News, "HF", "성공", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            raw(Channel::News, "HF", "위기", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            raw(Channel::News, "HF", "소식", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            raw(Channel::News, "HF", "손실", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        ];
        let result = aggregate(input(docs), &extractor());
        let titles: Vec<_> = result
            .top_documents
            .iter()
            .map(|d| d.document.title.as_str())
            .collect();
        assert_eq!(titles, vec!["손실", "위기", "성공", "소식"]);
    }

    #[test]
    fn collect_statuses_pass_through() {
        let mut inp = input(Vec::new());
        inp.collect_statuses = vec![CollectStatus::skipped(Channel::Dc, "dc", "no collector")];
        let result = aggregate(inp.clone(), &extractor());
        assert_eq!(result.collect_status, inp.collect_statuses);
    }

    #[test]
    fn percent_handles_empty_total() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(2, 3), 67);
    }
}
