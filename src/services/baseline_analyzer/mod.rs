//! Historical Baseline Analyzer
//!
//! Statistical baselines over time-series samples of a query: current-vs-baseline
//! comparison, linear trends, z-score anomalies and period-over-period regression.
//!
//! All entry points are pure functions of their inputs. Numbers in the outputs are
//! rounded to 2 decimals; every decision is taken on full-precision values.

pub mod anomaly;
pub mod statistics;
pub mod trend;


pub use anomaly::detect_anomalies;
pub use trend::{MIN_TREND_SAMPLES, STABLE_SLOPE};

use crate::models::{
    AnalysisStatus, Anomaly, BaselineStatistics, ComparisonOutcome, CurrentMetrics, HistoricalTrend,
    MetricComparison, MetricKind, MetricSample, RegressionOutcome, Severity, TimeSeriesPoint,
    TrendOutcome,
};
use crate::utils::stats::{percent_change, round2};
use statistics::{compare_metric, rounded_map, statistics_by_metric};
use std::collections::BTreeMap;

/// Minimum number of historical samples for a current-vs-baseline comparison
pub const MIN_BASELINE_SAMPLES: usize = 3;

/// Change above which a period regression is critical
pub const CRITICAL_CHANGE_PERCENT: f64 = 100.0;
/// Change above which a period regression is high
pub const HIGH_CHANGE_PERCENT: f64 = 50.0;

/// Baseline analyzer entry points
pub struct BaselineAnalyzer;

impl BaselineAnalyzer {
    /// Baseline statistics per metric over per-execution values
    pub fn calculate_baseline(samples: &[MetricSample]) -> BTreeMap<MetricKind, BaselineStatistics> {
        rounded_map(&statistics_by_metric(samples))
    }

    /// Compare current metrics against the baseline built from `samples`
    ///
    /// Metrics missing from `current` are not compared.
    pub fn compare_current_vs_historical(
        current: &CurrentMetrics,
        samples: &[MetricSample],
        threshold_percent: f64,
    ) -> ComparisonOutcome {
        if samples.len() < MIN_BASELINE_SAMPLES {
            return ComparisonOutcome {
                trend: HistoricalTrend::InsufficientData,
                sample_count: samples.len(),
                threshold_percent,
                baseline: None,
                comparisons: None,
                recommendations: vec![format!(
                    "At least {} historical samples are needed for a baseline, found {}",
                    MIN_BASELINE_SAMPLES,
                    samples.len()
                )],
            };
        }

        let baseline = statistics_by_metric(samples);
        let comparisons: BTreeMap<MetricKind, MetricComparison> = baseline
            .iter()
            .filter_map(|(kind, stats)| {
                current
                    .get(*kind)
                    .map(|value| (*kind, compare_metric(value, stats, threshold_percent)))
            })
            .collect();

        let trend = classify_trend(&comparisons);
        let recommendations = comparison_recommendations(&comparisons);

        tracing::debug!(
            "Baseline comparison over {} samples: trend={:?}, compared={}",
            samples.len(),
            trend,
            comparisons.len()
        );

        ComparisonOutcome {
            trend,
            sample_count: samples.len(),
            threshold_percent,
            baseline: Some(rounded_map(&baseline)),
            comparisons: Some(comparisons),
            recommendations,
        }
    }

    /// Fit trends to all four metrics and flag elapsed-time anomalies
    ///
    /// Samples are ordered by timestamp before fitting.
    pub fn analyze_trend(samples: &[MetricSample]) -> TrendOutcome {
        let mut ordered: Vec<&MetricSample> = samples.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);
        let time_series: Vec<TimeSeriesPoint> =
            ordered.into_iter().map(TimeSeriesPoint::from_sample).collect();

        if time_series.len() < MIN_TREND_SAMPLES {
            return TrendOutcome {
                overall_trend: HistoricalTrend::InsufficientData,
                sample_count: time_series.len(),
                time_series: time_series.iter().map(TimeSeriesPoint::rounded).collect(),
                metrics_trends: BTreeMap::new(),
                anomalies: Vec::new(),
            };
        }

        let metrics_trends: BTreeMap<_, _> = MetricKind::ALL
            .iter()
            .map(|&kind| {
                let values: Vec<f64> = time_series.iter().map(|p| p.get(kind)).collect();
                (kind, trend::fit(&values))
            })
            .collect();

        let overall_trend = metrics_trends
            .get(&MetricKind::ElapsedTime)
            .map(|t| trend::overall_trend(t.direction))
            .unwrap_or(HistoricalTrend::Stable);
        let anomalies = detect_anomalies(&time_series);

        tracing::debug!(
            "Trend analysis over {} samples: overall={:?}, anomalies={}",
            time_series.len(),
            overall_trend,
            anomalies.len()
        );

        TrendOutcome {
            overall_trend,
            sample_count: time_series.len(),
            time_series: time_series.iter().map(TimeSeriesPoint::rounded).collect(),
            metrics_trends,
            anomalies,
        }
    }

    /// Flag elapsed-time outliers in a time series
    pub fn detect_anomalies(time_series: &[TimeSeriesPoint]) -> Vec<Anomaly> {
        detect_anomalies(time_series)
    }

    /// Compare a recent period against an older baseline period
    ///
    /// The mean of each recent metric plays the part of the current value.
    pub fn detect_regression(
        baseline_samples: &[MetricSample],
        recent_samples: &[MetricSample],
        threshold_percent: f64,
    ) -> RegressionOutcome {
        if baseline_samples.is_empty() || recent_samples.is_empty() {
            let empty = if baseline_samples.is_empty() { "baseline" } else { "recent" };
            return RegressionOutcome {
                status: AnalysisStatus::InsufficientData,
                reason: Some(format!("No samples in the {} period", empty)),
                regression_detected: false,
                severity: Severity::None,
                threshold_percent,
                baseline_sample_count: baseline_samples.len(),
                recent_sample_count: recent_samples.len(),
                baseline_period: None,
                recent_period: None,
                comparisons: BTreeMap::new(),
                regressed_metrics: Vec::new(),
                max_change_percent: None,
            };
        }

        let baseline = statistics_by_metric(baseline_samples);
        let recent = statistics_by_metric(recent_samples);

        let mut comparisons = BTreeMap::new();
        let mut regressed_metrics = Vec::new();
        let mut max_change: Option<f64> = None;

        for kind in MetricKind::ALL {
            let base = &baseline[&kind];
            let recent_mean = recent[&kind].mean;
            let comparison = compare_metric(recent_mean, base, threshold_percent);
            if comparison.regression {
                let change = percent_change(recent_mean, base.mean);
                max_change = Some(max_change.map_or(change, |m| m.max(change)));
                regressed_metrics.push(kind);
            }
            comparisons.insert(kind, comparison);
        }

        let severity = match max_change {
            Some(change) => regression_severity(change),
            None => Severity::None,
        };

        tracing::debug!(
            "Period regression: baseline={} recent={} samples, severity={}, regressed={:?}",
            baseline_samples.len(),
            recent_samples.len(),
            severity,
            regressed_metrics
        );

        RegressionOutcome {
            status: AnalysisStatus::Ok,
            reason: None,
            regression_detected: !regressed_metrics.is_empty(),
            severity,
            threshold_percent,
            baseline_sample_count: baseline_samples.len(),
            recent_sample_count: recent_samples.len(),
            baseline_period: Some(rounded_map(&baseline)),
            recent_period: Some(rounded_map(&recent)),
            comparisons,
            regressed_metrics,
            max_change_percent: max_change.map(round2),
        }
    }
}

/// Severity of the largest change that exceeded the threshold
pub fn regression_severity(max_change_percent: f64) -> Severity {
    if max_change_percent > CRITICAL_CHANGE_PERCENT {
        Severity::Critical
    } else if max_change_percent > HIGH_CHANGE_PERCENT {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn classify_trend(comparisons: &BTreeMap<MetricKind, MetricComparison>) -> HistoricalTrend {
    let regressions = comparisons.values().filter(|c| c.regression).count();
    let improvements = comparisons.values().filter(|c| c.improvement).count();

    if regressions > improvements {
        HistoricalTrend::Degrading
    } else if improvements > regressions {
        HistoricalTrend::Improving
    } else {
        HistoricalTrend::Stable
    }
}

fn comparison_recommendations(comparisons: &BTreeMap<MetricKind, MetricComparison>) -> Vec<String> {
    let recommendations: Vec<String> = comparisons
        .iter()
        .filter(|(_, c)| c.regression)
        .map(|(kind, c)| {
            format!(
                "{} is {:.1}% above the historical mean ({} vs {})",
                kind.label(),
                c.change_percent,
                c.current_value,
                c.baseline_mean
            )
        })
        .collect();

    if recommendations.is_empty() {
        vec!["All metrics are within the expected range of the historical baseline".to_string()]
    } else {
        recommendations
    }
}
