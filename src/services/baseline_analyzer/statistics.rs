//! Baseline statistics and metric-vs-baseline comparison

use crate::models::{BaselineStatistics, MetricComparison, MetricKind, MetricSample};
use crate::utils::stats::{mean, median, percent_change, percentile, round2, sample_std_dev};
use std::collections::BTreeMap;

/// Percentile used for `p95` everywhere in the analyzer
pub const BASELINE_PERCENTILE: f64 = 0.95;

/// Per-execution values of one metric, in sample order
pub fn metric_values(samples: &[MetricSample], kind: MetricKind) -> Vec<f64> {
    samples.iter().map(|s| s.per_execution(kind)).collect()
}

/// Full-precision statistics of a value series
pub fn statistics_of(values: &[f64]) -> BaselineStatistics {
    BaselineStatistics {
        sample_count: values.len(),
        mean: mean(values),
        median: median(values),
        stdev: sample_std_dev(values),
        p95: percentile(values, BASELINE_PERCENTILE),
    }
}

/// Full-precision statistics for all four metrics
pub fn statistics_by_metric(samples: &[MetricSample]) -> BTreeMap<MetricKind, BaselineStatistics> {
    MetricKind::ALL
        .iter()
        .map(|&kind| (kind, statistics_of(&metric_values(samples, kind))))
        .collect()
}

/// Copy of the statistics rounded for presentation
pub fn rounded(stats: &BaselineStatistics) -> BaselineStatistics {
    BaselineStatistics {
        sample_count: stats.sample_count,
        mean: round2(stats.mean),
        median: round2(stats.median),
        stdev: round2(stats.stdev),
        p95: round2(stats.p95),
    }
}

pub fn rounded_map(
    stats: &BTreeMap<MetricKind, BaselineStatistics>,
) -> BTreeMap<MetricKind, BaselineStatistics> {
    stats.iter().map(|(kind, s)| (*kind, rounded(s))).collect()
}

/// Compare a value against full-precision baseline statistics
///
/// Flags are decided on the unrounded change; the returned numbers are rounded.
pub fn compare_metric(
    current: f64,
    baseline: &BaselineStatistics,
    threshold_percent: f64,
) -> MetricComparison {
    let change = percent_change(current, baseline.mean);
    MetricComparison {
        current_value: round2(current),
        baseline_mean: round2(baseline.mean),
        baseline_p95: round2(baseline.p95),
        change_percent: round2(change),
        regression: change > threshold_percent,
        improvement: change < -threshold_percent,
    }
}
