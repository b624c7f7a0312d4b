//! Standard scores over a whole series.

/// Population mean and standard deviation, or `None` for an empty series.
fn mean_and_stddev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

/// Per-point z-scores `(x - mean) / stddev` using the population standard
/// deviation of the entire series.
///
/// Returns an empty vec for an empty series and all zeros when the series
/// has no spread, so the output never contains NaN or infinity for finite input.
#[must_use]
pub fn zscores(values: &[f64]) -> Vec<f64> {
    let Some((mean, stddev)) = mean_and_stddev(values) else {
        return Vec::new();
    };
    if stddev == 0.0 || !stddev.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / stddev).collect()
}

/// Z-scores of a count series.
#[must_use]
pub fn zscores_of_counts(counts: &[usize]) -> Vec<f64> {
    #[allow(clippy::cast_precision_loss)]
    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    zscores(&values)
}

/// Z-score of a single value against a history.
///
/// Histories shorter than two points, or without spread, score `0.0`.
#[must_use]
pub fn zscore_of(value: f64, history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    match mean_and_stddev(history) {
        Some((mean, stddev)) if stddev > 0.0 && stddev.is_finite() => (value - mean) / stddev,
        _ => 0.0,
    }
}

/// Round to `decimals` places, halves going up (`-0.125` becomes `-0.12`).
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_returns_empty() {
        assert!(zscores(&[]).is_empty());
    }

    #[test]
    fn constant_series_is_all_zero() {
        assert_eq!(zscores(&[3.0, 3.0, 3.0, 3.0]), vec![0.0; 4]);
        assert_eq!(zscores(&[0.0, 0.0]), vec![0.0; 2]);
    }

    #[test]
    fn single_point_is_zero() {
        assert_eq!(zscores(&[42.0]), vec![0.0]);
    }

    #[test]
    fn output_length_matches_input() {
        let values = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 0.0];
        assert_eq!(zscores(&values).len(), values.len());
    }

    #[test]
    fn zscores_are_zero_mean() {
        let values = [1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 0.0, 14.5];
        let sum: f64 = zscores(&values).iter().sum();
        assert!(sum.abs() < 1e-9, "sum of z-scores should be ~0, got {sum}");
    }

    #[test]
    fn uses_population_stddev() {
        // mean 4, population variance 64, stddev 8
        let z = zscores(&[0.0, 0.0, 0.0, 0.0, 20.0]);
        assert!((z[4] - 2.0).abs() < 1e-12, "got {}", z[4]);
        assert!((z[0] + 0.5).abs() < 1e-12, "got {}", z[0]);
    }

    #[test]
    fn counts_are_scored_like_floats() {
        assert_eq!(zscores_of_counts(&[2, 2, 2]), vec![0.0; 3]);
        let z = zscores_of_counts(&[0, 0, 0, 0, 20]);
        assert!((z[4] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_value_against_short_history_is_zero() {
        assert_eq!(zscore_of(10.0, &[1.0]), 0.0);
        assert_eq!(zscore_of(10.0, &[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn single_value_against_history() {
        let z = zscore_of(12.0, &[0.0, 0.0, 0.0, 0.0, 20.0]);
        assert!((z - 1.0).abs() < 1e-12, "got {z}");
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(2.834, 2), 2.83);
        assert_eq!(round_to(-0.355, 1), -0.4);
        assert_eq!(round_to(66.6, 0), 67.0);
    }

    #[test]
    fn round_to_takes_halves_upward() {
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.12);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert!(round_to(-0.001, 2).is_sign_positive());
    }
}
