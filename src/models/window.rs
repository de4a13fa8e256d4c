//! Look-back windows requested from the historical metrics provider

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Half-open time window `[start, end)` in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days ending at `end`
    pub fn trailing(end: DateTime<Utc>, days: i64) -> Self {
        Self { start: end - Duration::days(days), end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The two disjoint periods compared by regression detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegressionWindows {
    /// Older reference period
    pub baseline: TimeWindow,
    /// Most recent period, ends at `now`
    pub recent: TimeWindow,
}

impl RegressionWindows {
    /// recent = [now - recent_days, now), baseline = the `baseline_days` before that
    pub fn ending_at(now: DateTime<Utc>, baseline_days: i64, recent_days: i64) -> Self {
        let recent = TimeWindow::trailing(now, recent_days);
        let baseline = TimeWindow::trailing(recent.start, baseline_days);
        Self { baseline, recent }
    }
}
