//! Plain-text rendering of analytics results and summaries.

use std::fmt::Write;

use hfmon_analytics::{AnalyticsResult, SummaryReport};

const MAX_TRENDS_SHOWN: usize = 10;

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

#[must_use]
pub(crate) fn render_analytics(analytics: &AnalyticsResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_analytics(&mut out, analytics);
    out
}

fn write_analytics(out: &mut String, a: &AnalyticsResult) -> std::fmt::Result {
    let meta = &a.meta;
    writeln!(
        out,
        "# Analytics {} .. {} ({})",
        meta.start_date, meta.end_date, meta.granularity
    )?;
    writeln!(out, "keywords:  {}", meta.keywords.join(", "))?;
    writeln!(out, "channels:  {}", join(&meta.channels))?;
    write!(out, "documents: {}", meta.total_documents)?;
    if meta.out_of_range_documents > 0 {
        write!(out, " ({} outside the bucket span)", meta.out_of_range_documents)?;
    }
    if a.from_cache {
        write!(out, " [cached]")?;
    }
    writeln!(out)?;
    writeln!(out)?;

    writeln!(
        out,
        "{:<12}{:>7}{:>6}{:>6}{:>6}{:>6}{:>8}",
        "BUCKET", "TOTAL", "POS", "NEU", "NEG", "NEG%", "NEG Z"
    )?;
    for point in &a.sentiment {
        writeln!(
            out,
            "{:<12}{:>7}{:>6}{:>6}{:>6}{:>6}{:>8.2}",
            point.label,
            point.total(),
            point.positive,
            point.neutral,
            point.negative,
            point.negative_ratio,
            point.negative_zscore
        )?;
    }

    let spikes: Vec<_> = a.negative_spikes.iter().filter(|s| s.is_spike).collect();
    if !spikes.is_empty() {
        writeln!(out)?;
        writeln!(out, "negative spikes:")?;
        for spike in spikes {
            writeln!(
                out,
                "  {}  z={:.2}  negative={} ({:.0}%)",
                spike.bucket,
                spike.zscore,
                spike.negative_count,
                spike.negative_ratio * 100.0
            )?;
        }
    }

    if !a.trend_keywords.is_empty() {
        writeln!(out)?;
        writeln!(out, "trending terms:")?;
        for trend in a.trend_keywords.iter().take(MAX_TRENDS_SHOWN) {
            writeln!(
                out,
                "  {:<16} z={:>5.2}  count={} (prev {}){}",
                trend.keyword,
                trend.zscore,
                trend.count,
                trend.prev_count,
                if trend.is_trending { "  *" } else { "" }
            )?;
        }
    }

    if !a.collect_status.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "{:<11}{:<20}{:<16}{:<9}{:>6}  ERROR",
            "CHANNEL", "SOURCE", "KEYWORD", "STATUS", "COUNT"
        )?;
        for status in &a.collect_status {
            writeln!(
                out,
                "{:<11}{:<20}{:<16}{:<9}{:>6}  {}",
                status.channel.as_str(),
                status.source,
                status.keyword.as_deref().unwrap_or("-"),
                status.status.as_str(),
                status.count,
                status.error.as_deref().unwrap_or("")
            )?;
        }
    }

    Ok(())
}

#[must_use]
pub(crate) fn render_summary(summary: &SummaryReport) -> String {
    let mut out = String::new();
    let _ = write_summary(&mut out, summary);
    out
}

fn write_summary(out: &mut String, s: &SummaryReport) -> std::fmt::Result {
    let guide = &s.response_guide;
    writeln!(out, "# Summary")?;
    writeln!(out)?;
    writeln!(out, "{}", s.summary)?;
    writeln!(out)?;

    writeln!(out, "## Key issues")?;
    for issue in &s.key_issues {
        writeln!(out, "- {issue}")?;
    }
    writeln!(out)?;

    writeln!(out, "## Fact check")?;
    for item in &guide.fact_check {
        writeln!(out, "- [ ] {item}")?;
    }
    writeln!(out)?;

    writeln!(out, "## Monitoring keywords")?;
    writeln!(out, "{}", guide.monitoring_keywords.join(", "))?;
    writeln!(out)?;

    writeln!(out, "## Escalation criteria")?;
    for item in &guide.escalation_criteria {
        writeln!(out, "- {item}")?;
    }
    writeln!(out)?;

    writeln!(out, "## Notice")?;
    writeln!(out, "{}", guide.notice_short)?;
    Ok(())
}
