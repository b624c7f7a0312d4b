//! Round-trip and failure-mode tests for `FileCache` on a temp directory.

use chrono::NaiveDate;
use hfmon_analytics::demo::{demo_analytics, DEFAULT_SEED};
use hfmon_analytics::summary::summarize;
use hfmon_analytics::{AnalyticsResult, KeywordExtractor, KeywordRules};
use hfmon_cache::{fingerprint_of, FileCache};
use hfmon_core::{Channel, Granularity};

fn sample_analytics() -> AnalyticsResult {
    demo_analytics(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        Granularity::Monthly,
        vec!["보금자리론".to_string(), "주택연금".to_string()],
        vec![Channel::News, Channel::Youtube, Channel::Dc],
        &KeywordExtractor::new(KeywordRules::default()),
        DEFAULT_SEED,
    )
}

#[tokio::test]
async fn analytics_round_trip_is_lossless() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cache = FileCache::new(tmp.path());
    let analytics = sample_analytics();
    let fp = fingerprint_of(&analytics);

    cache.put(&fp, &analytics).await.expect("put should succeed");
    let cached = cache.get(&fp).await.expect("entry should be present");

    assert_eq!(cached, analytics);
    assert!(tmp.path().join("analytics").join(format!("{fp}.json")).exists());
}

#[tokio::test]
async fn missing_entry_is_a_miss() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cache = FileCache::new(tmp.path());
    assert!(cache.get("2024-01-01_2024-01-31_daily_HF_news").await.is_none());
    assert!(cache.get_summary("2024-01-01_2024-01-31_daily_HF_news").await.is_none());
}

#[tokio::test]
async fn corrupt_entry_is_a_miss() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cache = FileCache::new(tmp.path());
    std::fs::create_dir_all(cache.dir()).unwrap();
    std::fs::write(cache.dir().join("broken.json"), "{ not json").unwrap();

    assert!(cache.get("broken").await.is_none());
}

#[tokio::test]
async fn summary_is_stored_beside_analytics() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cache = FileCache::new(tmp.path());
    let analytics = sample_analytics();
    let fp = fingerprint_of(&analytics);
    let summary = summarize(&analytics);

    cache.put_summary(&fp, &summary).await.expect("put_summary");

    assert_eq!(cache.get_summary(&fp).await, Some(summary));
    assert!(cache.get(&fp).await.is_none(), "summary must not shadow analytics");
    assert!(cache.dir().join(format!("{fp}_summary.json")).exists());
}

#[tokio::test]
async fn put_overwrites_previous_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cache = FileCache::new(tmp.path());
    let mut analytics = sample_analytics();
    let fp = fingerprint_of(&analytics);

    cache.put(&fp, &analytics).await.unwrap();
    analytics.meta.total_documents = 0;
    cache.put(&fp, &analytics).await.unwrap();

    assert_eq!(cache.get(&fp).await.unwrap().meta.total_documents, 0);
}
