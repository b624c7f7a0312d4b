use chrono::NaiveDate;
use hfmon_analytics::AnalyticsResult;
use hfmon_core::{Channel, Granularity};

/// Longest fingerprint, in chars. Keeps file names well under filesystem limits.
pub const MAX_FINGERPRINT_LEN: usize = 200;

/// Cache key for one analytics request.
///
/// Keyword and channel order does not matter. Characters outside
/// `[A-Za-z0-9가-힣_,.-]` become `_`, so the result is always a safe file
/// name.
#[must_use]
pub fn fingerprint(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    keywords: &[String],
    channels: &[Channel],
) -> String {
    let mut keywords: Vec<&str> = keywords.iter().map(String::as_str).collect();
    keywords.sort_unstable();
    let mut channels: Vec<&str> = channels.iter().map(|c| c.as_str()).collect();
    channels.sort_unstable();

    let raw = format!(
        "{start}_{end}_{granularity}_{}_{}",
        keywords.join(","),
        channels.join(",")
    );

    raw.chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .take(MAX_FINGERPRINT_LEN)
        .collect()
}

/// Fingerprint of the request that produced `analytics`.
#[must_use]
pub fn fingerprint_of(analytics: &AnalyticsResult) -> String {
    let meta = &analytics.meta;
    fingerprint(
        meta.start_date,
        meta.end_date,
        meta.granularity,
        &meta.keywords,
        &meta.channels,
    )
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) || matches!(c, '_' | ',' | '.' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn format_is_dates_granularity_keywords_channels() {
        let fp = fingerprint(
            date(2024, 1, 1),
            date(2024, 12, 31),
            Granularity::Monthly,
            &strings(&["보금자리론", "HF"]),
            &[Channel::Youtube, Channel::News],
        );
        assert_eq!(fp, "2024-01-01_2024-12-31_monthly_HF,보금자리론_news,youtube");
    }

    #[test]
    fn order_of_inputs_does_not_matter() {
        let a = fingerprint(
            date(2024, 1, 1),
            date(2024, 1, 31),
            Granularity::Daily,
            &strings(&["b", "a"]),
            &[Channel::Dc, Channel::Blog],
        );
        let b = fingerprint(
            date(2024, 1, 1),
            date(2024, 1, 31),
            Granularity::Daily,
            &strings(&["a", "b"]),
            &[Channel::Blog, Channel::Dc],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        let fp = fingerprint(
            date(2024, 1, 1),
            date(2024, 1, 1),
            Granularity::Daily,
            &strings(&["../etc/passwd", "전세 사기"]),
            &[Channel::News],
        );
        assert!(!fp.contains('/'));
        assert!(!fp.contains(' '));
        assert!(fp.contains(".._etc_passwd"));
        assert!(fp.contains("전세_사기"));
    }

    #[test]
    fn long_fingerprints_are_truncated() {
        let keywords: Vec<String> = (0..100).map(|i| format!("keyword{i}")).collect();
        let fp = fingerprint(
            date(2024, 1, 1),
            date(2024, 1, 1),
            Granularity::Daily,
            &keywords,
            &Channel::ALL,
        );
        assert_eq!(fp.chars().count(), MAX_FINGERPRINT_LEN);
    }
}
