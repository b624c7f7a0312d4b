use std::collections::HashMap;

use crate::buckets::assign_bucket;
use crate::keywords::KeywordExtractor;
use crate::types::{AnalyzedDocument, TimeBucket, TrendKeyword};
use crate::zscore::{round_to, zscores_of_counts};

/// Most trend keywords returned.
pub const MAX_TREND_KEYWORDS: usize = 50;

/// Z-score at or above which a term counts as trending.
pub const TRENDING_ZSCORE: f64 = 2.0;

/// Terms whose frequency in the latest bucket is anomalous relative to their
/// own history across `buckets`.
///
/// Terms absent from the latest bucket are dropped unless their z-score still
/// reaches [`TRENDING_ZSCORE`]. Output is sorted by rounded z-score
/// descending; ties keep the order in which terms were first seen.
#[must_use]
pub fn detect_trends(
    documents: &[AnalyzedDocument],
    buckets: &[TimeBucket],
    extractor: &KeywordExtractor,
) -> Vec<TrendKeyword> {
    if documents.is_empty() || buckets.is_empty() {
        return Vec::new();
    }

    let mut frequencies: Vec<HashMap<String, usize>> = vec![HashMap::new(); buckets.len()];
    let mut first_seen: Vec<Vec<String>> = vec![Vec::new(); buckets.len()];

    for analyzed in documents {
        let doc = &analyzed.document;
        let Some(idx) = assign_bucket(doc.published_at.date_naive(), buckets) else {
            continue;
        };
        for term in extractor.extract(&format!("{} {}", doc.title, doc.text)) {
            let count = frequencies[idx].entry(term.clone()).or_insert(0);
            if *count == 0 {
                first_seen[idx].push(term);
            }
            *count += 1;
        }
    }

    let mut terms: Vec<&str> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for term in first_seen.iter().flatten() {
        if seen.insert(term.as_str()) {
            terms.push(term.as_str());
        }
    }

    let last = buckets.len() - 1;
    let mut results: Vec<TrendKeyword> = terms
        .into_iter()
        .filter_map(|term| {
            let series: Vec<usize> = frequencies
                .iter()
                .map(|freq| freq.get(term).copied().unwrap_or(0))
                .collect();
            let zscores = zscores_of_counts(&series);
            let latest_z = zscores.get(last).copied().unwrap_or(0.0);
            let count = series[last];
            let prev_count = if last >= 1 { series[last - 1] } else { 0 };

            if count == 0 && latest_z < TRENDING_ZSCORE {
                return None;
            }

            #[allow(clippy::cast_possible_wrap)]
            let delta = count as i64 - prev_count as i64;
            Some(TrendKeyword {
                keyword: term.to_string(),
                zscore: round_to(latest_z, 2),
                count,
                prev_count,
                delta,
                is_trending: latest_z >= TRENDING_ZSCORE,
            })
        })
        .collect();

    results.sort_by(|a, b| b.zscore.total_cmp(&a.zscore));
    results.truncate(MAX_TREND_KEYWORDS);
    results
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hfmon_core::{document_id, Channel, RawDocument, Sentiment};

    use super::*;
    use crate::buckets::build_buckets;
    use crate::keywords::KeywordRules;

    fn doc(day: u32, title: &str) -> AnalyzedDocument {
        let published_at = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
        let url = format!("https://news.example/{day}/{title}");
        AnalyzedDocument {
            document: RawDocument {
                id: document_id(Channel::News, "HF", &url, &published_at),
                channel: Channel::News,
                keyword: "HF".to_string(),
                title: title.to_string(),
                text: String::new(),
                url,
                published_at,
                fetched_at: published_at,
                source_meta: serde_json::Map::new(),
            },
            sentiment: Sentiment::Neutral,
            sentiment_score: 0.0,
        }
    }

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(KeywordRules {
            min_token_len: 2,
            ..KeywordRules::default()
        })
    }

    fn five_days() -> Vec<TimeBucket> {
        build_buckets(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            hfmon_core::Granularity::Daily,
        )
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(detect_trends(&[], &five_days(), &extractor()).is_empty());
        assert!(detect_trends(&[doc(1, "금리")], &[], &extractor()).is_empty());
    }

    #[test]
    fn burst_in_latest_bucket_is_trending() {
        let docs: Vec<_> = (0..20).map(|_| doc(5, "전세사기")).collect();
        let trends = detect_trends(&docs, &five_days(), &extractor());
        assert_eq!(trends.len(), 1);
        let t = &trends[0];
        assert_eq!(t.keyword, "전세사기");
        assert_eq!(t.count, 20);
        assert_eq!(t.prev_count, 0);
        assert_eq!(t.delta, 20);
        assert!((t.zscore - 2.0).abs() < 1e-9);
        assert!(t.is_trending);
    }

    #[test]
    fn term_missing_from_latest_bucket_is_dropped() {
        let docs = vec![doc(1, "금리"), doc(2, "금리"), doc(5, "연금")];
        let trends = detect_trends(&docs, &five_days(), &extractor());
        let names: Vec<_> = trends.iter().map(|t| t.keyword.as_str()).collect();
        assert_eq!(names, vec!["연금"]);
    }

    #[test]
    fn sorted_by_zscore_with_first_seen_tie_order() {
        let docs = vec![
            doc(1, "금리"),
            doc(5, "보증"),
            doc(5, "보증"),
            doc(5, "가입"),
            doc(5, "상담"),
        ];
        let trends = detect_trends(&docs, &five_days(), &extractor());
        let names: Vec<_> = trends.iter().map(|t| t.keyword.as_str()).collect();
        assert_eq!(names, vec!["보증", "가입", "상담"]);
        for pair in trends.windows(2) {
            assert!(pair[0].zscore >= pair[1].zscore);
        }
    }

    #[test]
    fn output_is_capped() {
        let docs: Vec<_> = (0..80u32)
            .map(|i| {
                let syllable = char::from_u32(0xAC00 + i).unwrap();
                doc(5, &format!("단어{syllable}"))
            })
            .collect();
        let trends = detect_trends(&docs, &five_days(), &extractor());
        assert_eq!(trends.len(), MAX_TREND_KEYWORDS);
        assert!(trends.iter().all(|t| t.is_trending));
    }

    #[test]
    fn single_bucket_has_zero_prev_count() {
        let buckets = build_buckets(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            hfmon_core::Granularity::Daily,
        );
        let trends = detect_trends(&[doc(5, "연금")], &buckets, &extractor());
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].prev_count, 0);
        assert_eq!(trends[0].zscore, 0.0);
        assert!(!trends[0].is_trending);
    }
}
