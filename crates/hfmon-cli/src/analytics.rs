//! Command handlers for `collect`, `demo`, `summary` and `fingerprint`.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use hfmon_analytics::{aggregate, AggregateInput, AnalyticsResult, KeywordExtractor};
use hfmon_cache::{fingerprint, FileCache};
use hfmon_collectors::{collect_all, CollectQuery, CollectorSet};
use hfmon_core::{AppConfig, Channel, Granularity, Watchlist};

use crate::report;
use crate::ScopeArgs;

/// Scope with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scope {
    pub granularity: Granularity,
    pub keywords: Vec<String>,
    pub channels: Vec<Channel>,
}

/// Apply defaults: watchlist keywords when none are given, the default
/// channel set when none are given. Duplicates are dropped, order kept.
///
/// # Errors
///
/// Returns an error if no keyword remains.
pub(crate) fn resolve_scope(args: &ScopeArgs, watchlist_keywords: &[String]) -> anyhow::Result<Scope> {
    let mut keywords: Vec<String> = Vec::new();
    for keyword in args.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    if keywords.is_empty() {
        keywords = watchlist_keywords.to_vec();
    }
    anyhow::ensure!(!keywords.is_empty(), "at least one keyword is required");

    let mut channels: Vec<Channel> = Vec::new();
    for &channel in &args.channels {
        if !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    if channels.is_empty() {
        channels = Channel::DEFAULT_SET.to_vec();
    }

    Ok(Scope {
        granularity: args.granularity,
        keywords,
        channels,
    })
}

fn check_range(start: NaiveDate, end: NaiveDate) -> anyhow::Result<()> {
    anyhow::ensure!(start <= end, "--end {end} is before --start {start}");
    Ok(())
}

fn load_watchlist(config: &AppConfig) -> anyhow::Result<Watchlist> {
    hfmon_core::load_watchlist(&config.watchlist_path)
        .with_context(|| format!("loading watchlist from {}", config.watchlist_path.display()))
}

fn emit(analytics: &AnalyticsResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(analytics)?);
    } else {
        print!("{}", report::render_analytics(analytics));
    }
    Ok(())
}

/// Collect from live sources, aggregate, and cache the result.
///
/// # Errors
///
/// Returns an error if configuration, the watchlist or the HTTP client
/// cannot be loaded. Collector failures are reported in the result instead.
pub(crate) async fn run_collect(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    args: &ScopeArgs,
    galleries: &[String],
    force_refresh: bool,
    json: bool,
) -> anyhow::Result<()> {
    check_range(start, end)?;
    let watchlist = load_watchlist(config)?;
    let scope = resolve_scope(args, &watchlist.keywords)?;
    let cache = FileCache::new(&config.data_dir);
    let fp = fingerprint(start, end, scope.granularity, &scope.keywords, &scope.channels);

    if !force_refresh {
        if let Some(mut cached) = cache.get(&fp).await {
            tracing::info!(fingerprint = %fp, "using cached analytics");
            cached.from_cache = true;
            return emit(&cached, json);
        }
    }

    let collectors = CollectorSet::from_config(config, &watchlist.galleries)?;
    let query = CollectQuery {
        keywords: scope.keywords.clone(),
        start_date: start,
        end_date: end,
        gallery_ids: galleries.to_vec(),
    };
    let output = collect_all(
        &collectors,
        &query,
        &scope.channels,
        Duration::from_secs(config.collector_timeout_secs),
    )
    .await;

    let analytics = aggregate(
        AggregateInput {
            documents: output.documents,
            start_date: start,
            end_date: end,
            granularity: scope.granularity,
            keywords: scope.keywords,
            channels: scope.channels,
            collect_statuses: output.statuses,
        },
        &KeywordExtractor::from_watchlist(&watchlist),
    );

    if let Err(e) = cache.put(&fp, &analytics).await {
        tracing::warn!(fingerprint = %fp, error = %e, "failed to cache analytics result");
    }

    emit(&analytics, json)
}

/// Aggregate seeded synthetic documents.
///
/// # Errors
///
/// Returns an error if the watchlist cannot be loaded or the range is empty.
pub(crate) fn run_demo(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    args: &ScopeArgs,
    seed: u64,
    json: bool,
) -> anyhow::Result<()> {
    check_range(start, end)?;
    let watchlist = load_watchlist(config)?;
    let scope = resolve_scope(args, &watchlist.keywords)?;

    let analytics = hfmon_analytics::demo::demo_analytics(
        start,
        end,
        scope.granularity,
        scope.keywords,
        scope.channels,
        &KeywordExtractor::from_watchlist(&watchlist),
        seed,
    );
    emit(&analytics, json)
}

/// Read an analytics result from `input`, bare or inside a `{data}` envelope.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an analytics result.
pub(crate) fn read_analytics(input: &Path) -> anyhow::Result<AnalyticsResult> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {} as JSON", input.display()))?;

    if value.get("meta").and_then(|m| m.get("request_id")).is_some() {
        if let Some(data) = value.get_mut("data") {
            value = data.take();
        }
    }

    serde_json::from_value(value)
        .with_context(|| format!("{} is not an analytics result", input.display()))
}

/// # Errors
///
/// Returns an error if the input cannot be read.
pub(crate) fn run_summary(input: &Path, json: bool) -> anyhow::Result<()> {
    let analytics = read_analytics(input)?;
    let summary = hfmon_analytics::summarize(&analytics);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report::render_summary(&summary));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the watchlist cannot be loaded.
pub(crate) fn run_fingerprint(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    args: &ScopeArgs,
) -> anyhow::Result<()> {
    let watchlist = load_watchlist(config)?;
    let scope = resolve_scope(args, &watchlist.keywords)?;
    println!(
        "{}",
        fingerprint(start, end, scope.granularity, &scope.keywords, &scope.channels)
    );
    Ok(())
}
