//! Numeric helpers shared by the plan comparator and the baseline analyzer
//!
//! All helpers are total: empty input yields 0.0 instead of NaN or a panic.

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of the values (average of the two middle values for even counts)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}

/// Sample standard deviation (n - 1 denominator), 0 when fewer than 2 values
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Nearest-rank percentile: sort ascending, index = floor(n * p), clamped to n - 1
///
/// `p` is a fraction (0.95 for the 95th percentile).
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let idx = (sorted.len() as f64 * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Ordinary least-squares slope of `values` against their index (0, 1, 2, ...)
///
/// Returns 0 when the index has no variance (fewer than 2 points).
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let (numerator, denominator) =
        values.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

/// Round to 2 decimal places for presentation
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percent change of `current` relative to `reference`, 0 when the reference is 0
#[inline]
pub fn percent_change(current: f64, reference: f64) -> f64 {
    if reference == 0.0 { 0.0 } else { (current - reference) / reference * 100.0 }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}
