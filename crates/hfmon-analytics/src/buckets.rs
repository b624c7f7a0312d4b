use chrono::{Datelike, Days, Months, NaiveDate};
use hfmon_core::Granularity;

use crate::types::TimeBucket;

/// Upper bound on buckets generated for one request.
pub const MAX_BUCKETS: usize = 500;

/// Calendar arithmetic for each bucket width.
pub trait GranularityExt {
    /// Start of the interval containing `date`.
    fn align_start(self, date: NaiveDate) -> Option<NaiveDate>;
    /// Start of the interval following the one beginning at `start`.
    fn advance(self, start: NaiveDate) -> Option<NaiveDate>;
    /// Display label for the interval beginning at `start`.
    fn label(self, start: NaiveDate) -> String;
}

impl GranularityExt for Granularity {
    fn align_start(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Daily => Some(date),
            Granularity::Weekly => date.checked_sub_days(Days::new(u64::from(
                date.weekday().num_days_from_monday(),
            ))),
            Granularity::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
            Granularity::Quarterly => {
                let first_month = date.month0() / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), first_month, 1)
            }
            Granularity::Yearly => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        }
    }

    fn advance(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Daily => start.checked_add_days(Days::new(1)),
            Granularity::Weekly => start.checked_add_days(Days::new(7)),
            Granularity::Monthly => start.checked_add_months(Months::new(1)),
            Granularity::Quarterly => start.checked_add_months(Months::new(3)),
            Granularity::Yearly => start.checked_add_months(Months::new(12)),
        }
    }

    fn label(self, start: NaiveDate) -> String {
        match self {
            Granularity::Daily => start.format("%-m/%-d").to_string(),
            Granularity::Weekly => start.format("%-m/%-d 주").to_string(),
            Granularity::Monthly => start.format("%Y/%-m").to_string(),
            Granularity::Quarterly => format!("{}Q{}", start.year(), start.month0() / 3 + 1),
            Granularity::Yearly => start.format("%Y").to_string(),
        }
    }
}

/// Contiguous chronological buckets covering `[start, end]`.
///
/// The first bucket is aligned to the granularity, so it may begin before
/// `start`. Generation stops once a bucket would begin after `end`, or at
/// [`MAX_BUCKETS`].
#[must_use]
pub fn build_buckets(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<TimeBucket> {
    let mut buckets = Vec::new();
    let Some(mut current) = granularity.align_start(start) else {
        return buckets;
    };

    while current <= end && buckets.len() < MAX_BUCKETS {
        let Some(next) = granularity.advance(current) else {
            break;
        };
        buckets.push(TimeBucket {
            bucket: current.to_string(),
            label: granularity.label(current),
            start: current,
            end: next,
        });
        current = next;
    }

    buckets
}

/// Index of the bucket `date` falls in: the last bucket whose start is on or
/// before `date`.
///
/// Dates before the first bucket fall back to the first bucket. Returns
/// `None` only for an empty sequence.
#[must_use]
pub fn assign_bucket(date: NaiveDate, buckets: &[TimeBucket]) -> Option<usize> {
    if buckets.is_empty() {
        return None;
    }
    Some(buckets.iter().rposition(|b| b.start <= date).unwrap_or(0))
}

/// Whether `date` lies inside the span the buckets actually cover.
#[must_use]
pub fn covers(buckets: &[TimeBucket], date: NaiveDate) -> bool {
    match (buckets.first(), buckets.last()) {
        (Some(first), Some(last)) => first.start <= date && date < last.end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assert_contiguous(buckets: &[TimeBucket]) {
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap between {pair:?}");
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn daily_buckets_cover_every_day() {
        let buckets = build_buckets(d(2024, 3, 5), d(2024, 3, 7), Granularity::Daily);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].bucket, "2024-03-05");
        assert_eq!(buckets[2].label, "3/7");
        assert_eq!(buckets[2].end, d(2024, 3, 8));
        assert_contiguous(&buckets);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        // 2024-03-07 is a Thursday
        let buckets = build_buckets(d(2024, 3, 7), d(2024, 3, 20), Granularity::Weekly);
        assert_eq!(buckets[0].start, d(2024, 3, 4));
        assert_eq!(buckets[0].label, "3/4 주");
        assert_eq!(buckets.len(), 3);
        assert_contiguous(&buckets);
    }

    #[test]
    fn monthly_buckets_for_a_year() {
        let buckets = build_buckets(d(2024, 1, 1), d(2024, 12, 31), Granularity::Monthly);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "2024/1");
        assert_eq!(buckets[11].bucket, "2024-12-01");
        assert_eq!(buckets[11].end, d(2025, 1, 1));
        assert_contiguous(&buckets);
    }

    #[test]
    fn monthly_start_is_aligned_to_first_of_month() {
        let buckets = build_buckets(d(2024, 2, 29), d(2024, 3, 2), Granularity::Monthly);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, d(2024, 2, 1));
        assert_eq!(buckets[1].start, d(2024, 3, 1));
    }

    #[test]
    fn quarterly_labels() {
        let buckets = build_buckets(d(2024, 2, 10), d(2024, 11, 30), Granularity::Quarterly);
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024Q1", "2024Q2", "2024Q3", "2024Q4"]);
        assert_eq!(buckets[3].start, d(2024, 10, 1));
        assert_contiguous(&buckets);
    }

    #[test]
    fn yearly_buckets() {
        let buckets = build_buckets(d(2022, 6, 1), d(2024, 1, 1), Granularity::Yearly);
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2022", "2023", "2024"]);
    }

    #[test]
    fn bucket_count_is_capped() {
        let buckets = build_buckets(d(2020, 1, 1), d(2024, 12, 31), Granularity::Daily);
        assert_eq!(buckets.len(), MAX_BUCKETS);
        assert_contiguous(&buckets);
    }

    #[test]
    fn end_before_aligned_start_yields_no_buckets() {
        let buckets = build_buckets(d(2024, 3, 10), d(2024, 3, 1), Granularity::Daily);
        assert!(buckets.is_empty());
    }

    #[test]
    fn buckets_cover_the_requested_range() {
        for granularity in [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Quarterly,
            Granularity::Yearly,
        ] {
            let (start, end) = (d(2023, 11, 15), d(2024, 2, 3));
            let buckets = build_buckets(start, end, granularity);
            assert!(buckets[0].start <= start, "{granularity}");
            assert!(buckets.last().unwrap().end > end, "{granularity}");
            assert_contiguous(&buckets);
        }
    }

    #[test]
    fn assignment_picks_containing_bucket() {
        let buckets = build_buckets(d(2024, 1, 1), d(2024, 12, 31), Granularity::Monthly);
        for (date, expected) in [(d(2024, 1, 1), 0), (d(2024, 1, 31), 0), (d(2024, 7, 15), 6)] {
            let idx = assign_bucket(date, &buckets).unwrap();
            assert_eq!(idx, expected);
            assert!(buckets[idx].start <= date && date < buckets[idx].end);
        }
    }

    #[test]
    fn every_day_in_range_lands_in_its_containing_bucket() {
        let (start, end) = (d(2023, 11, 15), d(2024, 2, 3));
        for granularity in [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Quarterly,
            Granularity::Yearly,
        ] {
            let buckets = build_buckets(start, end, granularity);
            for date in start.iter_days().take_while(|date| *date <= end) {
                let idx = assign_bucket(date, &buckets).unwrap();
                let bucket = &buckets[idx];
                assert!(
                    bucket.start <= date && date < bucket.end,
                    "{granularity}: {date} assigned to {}",
                    bucket.bucket
                );
            }
        }
    }

    #[test]
    fn assignment_below_range_falls_back_to_first() {
        let buckets = build_buckets(d(2024, 1, 1), d(2024, 3, 31), Granularity::Monthly);
        assert_eq!(assign_bucket(d(2023, 6, 1), &buckets), Some(0));
        assert!(!covers(&buckets, d(2023, 6, 1)));
    }

    #[test]
    fn assignment_past_range_lands_in_last() {
        let buckets = build_buckets(d(2024, 1, 1), d(2024, 3, 31), Granularity::Monthly);
        assert_eq!(assign_bucket(d(2024, 9, 1), &buckets), Some(2));
        assert!(!covers(&buckets, d(2024, 9, 1)));
        assert!(covers(&buckets, d(2024, 3, 31)));
    }

    #[test]
    fn assignment_on_empty_sequence_is_none() {
        assert_eq!(assign_bucket(d(2024, 1, 1), &[]), None);
    }
}
