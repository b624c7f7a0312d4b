//! Analytical core for hfmon.
//!
//! Classifies collected documents, rolls them up into time buckets, and
//! flags negative spikes and trending terms with z-scores. Everything here
//! is synchronous and performs no I/O.

pub mod aggregate;
pub mod buckets;
pub mod demo;
pub mod keywords;
pub mod sentiment;
pub mod summary;
pub mod trends;
pub mod types;
pub mod zscore;

pub use aggregate::{aggregate, aggregate_at, AggregateInput};
pub use buckets::{assign_bucket, build_buckets, GranularityExt};
pub use keywords::{KeywordExtractor, KeywordRules};
pub use sentiment::{classify, classify_all, SentimentResult};
pub use summary::{summarize, SummaryReport};
pub use trends::detect_trends;
pub use types::{
    AnalyticsMeta, AnalyticsResult, AnalyzedDocument, BucketCount, ChannelCounts, KeywordMention,
    MentionDataPoint, NegativeSpike, SentimentDataPoint, TimeBucket, TrendKeyword,
};
pub use zscore::{zscore_of, zscores};
