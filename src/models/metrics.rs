//! Historical performance data models
//!
//! Time-series samples delivered by the historical metrics provider and the
//! statistics, comparisons, trends and anomalies the baseline analyzer derives.

use super::plan::Severity;
use crate::utils::stats::round2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============================================================================
// Metric Kinds
// ============================================================================

/// The four per-execution metrics tracked for every query
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum MetricKind {
    #[serde(rename = "elapsedTimeSec")]
    ElapsedTime,
    #[serde(rename = "cpuTimeSec")]
    CpuTime,
    #[serde(rename = "bufferGetsPerExec")]
    BufferGets,
    #[serde(rename = "diskReadsPerExec")]
    DiskReads,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] =
        [Self::ElapsedTime, Self::CpuTime, Self::BufferGets, Self::DiskReads];

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElapsedTime => "elapsedTimeSec",
            Self::CpuTime => "cpuTimeSec",
            Self::BufferGets => "bufferGetsPerExec",
            Self::DiskReads => "diskReadsPerExec",
        }
    }

    /// Human-readable label for messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::ElapsedTime => "Elapsed time per execution",
            Self::CpuTime => "CPU time per execution",
            Self::BufferGets => "Buffer gets per execution",
            Self::DiskReads => "Disk reads per execution",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Samples (input)
// ============================================================================

/// One time-series observation for a query
///
/// Metric values are totals over the sample interval unless the provider already
/// normalized them (in which case `executions_delta` is 1 or absent). The analyzer
/// always divides by `max(executions_delta, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub elapsed_time_sec: Option<f64>,
    #[serde(default)]
    pub cpu_time_sec: Option<f64>,
    #[serde(default)]
    pub buffer_gets_per_exec: Option<f64>,
    #[serde(default)]
    pub disk_reads_per_exec: Option<f64>,
    #[serde(default)]
    pub executions_delta: Option<i64>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            elapsed_time_sec: None,
            cpu_time_sec: None,
            buffer_gets_per_exec: None,
            disk_reads_per_exec: None,
            executions_delta: None,
        }
    }

    pub fn with_metric(mut self, kind: MetricKind, value: f64) -> Self {
        match kind {
            MetricKind::ElapsedTime => self.elapsed_time_sec = Some(value),
            MetricKind::CpuTime => self.cpu_time_sec = Some(value),
            MetricKind::BufferGets => self.buffer_gets_per_exec = Some(value),
            MetricKind::DiskReads => self.disk_reads_per_exec = Some(value),
        }
        self
    }

    pub fn with_executions(mut self, executions: i64) -> Self {
        self.executions_delta = Some(executions);
        self
    }

    /// Raw value as supplied (absent reads as 0)
    pub fn raw(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::ElapsedTime => self.elapsed_time_sec,
            MetricKind::CpuTime => self.cpu_time_sec,
            MetricKind::BufferGets => self.buffer_gets_per_exec,
            MetricKind::DiskReads => self.disk_reads_per_exec,
        }
        .unwrap_or(0.0)
    }

    /// Executions in this interval, floored at 1
    pub fn executions(&self) -> i64 {
        self.executions_delta.unwrap_or(0).max(1)
    }

    /// Value divided by the number of executions
    pub fn per_execution(&self, kind: MetricKind) -> f64 {
        self.raw(kind) / self.executions() as f64
    }
}

/// Current per-execution metrics of a query; absent metrics are not compared
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMetrics {
    #[serde(default)]
    pub elapsed_time_sec: Option<f64>,
    #[serde(default)]
    pub cpu_time_sec: Option<f64>,
    #[serde(default)]
    pub buffer_gets_per_exec: Option<f64>,
    #[serde(default)]
    pub disk_reads_per_exec: Option<f64>,
}

impl CurrentMetrics {
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::ElapsedTime => self.elapsed_time_sec,
            MetricKind::CpuTime => self.cpu_time_sec,
            MetricKind::BufferGets => self.buffer_gets_per_exec,
            MetricKind::DiskReads => self.disk_reads_per_exec,
        }
    }
}

// ============================================================================
// Statistics & Comparisons
// ============================================================================

/// Baseline statistics of one metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaselineStatistics {
    pub sample_count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, 0 with fewer than 2 samples
    pub stdev: f64,
    pub p95: f64,
}

/// Current value of one metric against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub current_value: f64,
    pub baseline_mean: f64,
    pub baseline_p95: f64,
    /// (current - mean) / mean * 100, 0 when the mean is 0
    pub change_percent: f64,
    pub regression: bool,
    pub improvement: bool,
}

/// Outcome classification of a baseline analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoricalTrend {
    InsufficientData,
    Degrading,
    Improving,
    Stable,
}

/// Whether an analysis had enough data to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Ok,
    InsufficientData,
}

/// Result of comparing current metrics against the historical baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    pub trend: HistoricalTrend,
    pub sample_count: usize,
    pub threshold_percent: f64,
    pub baseline: Option<BTreeMap<MetricKind, BaselineStatistics>>,
    pub comparisons: Option<BTreeMap<MetricKind, MetricComparison>>,
    pub recommendations: Vec<String>,
}

// ============================================================================
// Trends & Anomalies
// ============================================================================

/// Per-execution view of one sample
///
/// Trends and anomalies are computed on full-precision points; the points returned
/// in a [`TrendOutcome`] are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub elapsed_time_sec: f64,
    pub cpu_time_sec: f64,
    pub buffer_gets_per_exec: f64,
    pub disk_reads_per_exec: f64,
    pub executions: i64,
}

impl TimeSeriesPoint {
    pub fn from_sample(sample: &MetricSample) -> Self {
        Self {
            timestamp: sample.timestamp,
            elapsed_time_sec: sample.per_execution(MetricKind::ElapsedTime),
            cpu_time_sec: sample.per_execution(MetricKind::CpuTime),
            buffer_gets_per_exec: sample.per_execution(MetricKind::BufferGets),
            disk_reads_per_exec: sample.per_execution(MetricKind::DiskReads),
            executions: sample.executions(),
        }
    }

    /// Copy with every metric rounded to 2 decimals
    pub fn rounded(&self) -> Self {
        Self {
            elapsed_time_sec: round2(self.elapsed_time_sec),
            cpu_time_sec: round2(self.cpu_time_sec),
            buffer_gets_per_exec: round2(self.buffer_gets_per_exec),
            disk_reads_per_exec: round2(self.disk_reads_per_exec),
            ..self.clone()
        }
    }

    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::ElapsedTime => self.elapsed_time_sec,
            MetricKind::CpuTime => self.cpu_time_sec,
            MetricKind::BufferGets => self.buffer_gets_per_exec,
            MetricKind::DiskReads => self.disk_reads_per_exec,
        }
    }
}

/// Direction of a fitted trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Linear trend of one metric over the sample index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    pub direction: TrendDirection,
    pub slope: f64,
    pub first_value: f64,
    pub last_value: f64,
    pub mean: f64,
}

/// A sample whose value deviates from the series mean by more than 2 standard deviations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub metric: MetricKind,
    pub value: f64,
    pub mean: f64,
    pub z_score: f64,
    /// high when z > 3, medium otherwise
    pub severity: Severity,
}

/// Result of a trend analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendOutcome {
    pub overall_trend: HistoricalTrend,
    pub sample_count: usize,
    pub time_series: Vec<TimeSeriesPoint>,
    pub metrics_trends: BTreeMap<MetricKind, MetricTrend>,
    pub anomalies: Vec<Anomaly>,
}

// ============================================================================
// Period-over-Period Regression
// ============================================================================

/// Result of comparing a recent period against an older baseline period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegressionOutcome {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub regression_detected: bool,
    /// none, medium, high or critical
    pub severity: Severity,
    pub threshold_percent: f64,
    pub baseline_sample_count: usize,
    pub recent_sample_count: usize,
    pub baseline_period: Option<BTreeMap<MetricKind, BaselineStatistics>>,
    pub recent_period: Option<BTreeMap<MetricKind, BaselineStatistics>>,
    pub comparisons: BTreeMap<MetricKind, MetricComparison>,
    pub regressed_metrics: Vec<MetricKind>,
    pub max_change_percent: Option<f64>,
}
