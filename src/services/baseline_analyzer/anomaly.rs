//! Z-score anomaly detection on elapsed time

use super::trend::MIN_TREND_SAMPLES;
use crate::models::{Anomaly, MetricKind, Severity, TimeSeriesPoint};
use crate::utils::stats::{mean, round2, sample_std_dev};

/// Points further than this many standard deviations from the mean are anomalies
pub const ANOMALY_Z_SCORE: f64 = 2.0;
/// Anomalies beyond this z-score are high severity
pub const HIGH_SEVERITY_Z_SCORE: f64 = 3.0;

/// Flag elapsed-time outliers in a time series
///
/// Mean and sample standard deviation are taken over every point. Series shorter
/// than [`MIN_TREND_SAMPLES`] or with zero deviation produce no anomalies.
pub fn detect_anomalies(time_series: &[TimeSeriesPoint]) -> Vec<Anomaly> {
    if time_series.len() < MIN_TREND_SAMPLES {
        return Vec::new();
    }

    let values: Vec<f64> = time_series.iter().map(|p| p.get(MetricKind::ElapsedTime)).collect();
    let avg = mean(&values);
    let stdev = sample_std_dev(&values);
    if stdev <= 0.0 {
        return Vec::new();
    }

    time_series
        .iter()
        .zip(values)
        .filter_map(|(point, value)| {
            let z_score = (value - avg).abs() / stdev;
            (z_score > ANOMALY_Z_SCORE).then(|| Anomaly {
                timestamp: point.timestamp,
                metric: MetricKind::ElapsedTime,
                value: round2(value),
                mean: round2(avg),
                z_score: round2(z_score),
                severity: if z_score > HIGH_SEVERITY_Z_SCORE {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
        })
        .collect()
}
