//! Execution Plan Comparator
//!
//! Structurally diffs two versions of a query's execution plan and classifies
//! cost, cardinality and access-method regressions.
//!
//! # Pipeline
//!
//! ```text
//! current ops ──┐                       ┌─► classifier   ─► RegressionAnalysis
//!               ├─► metrics aggregator ─┤
//! historic ops ─┘                       └─► signature diff ─► PlanDiff
//!                      │
//!                      └─► significant changes (access method, join order)
//!                                      │
//!                                      └─► recommendations / baseline advice
//! ```
//!
//! Every function here is pure: no I/O, no shared state. The only non-deterministic
//! field of a [`ComparisonResult`] is `generated_at`.

pub mod changes;
pub mod classifier;
pub mod metrics;
pub mod recommendation;
pub mod signature;

#[cfg(test)]
mod tests;

pub use changes::{AccessMethod, detect_significant_changes, join_sequence};
pub use classifier::classify;
pub use recommendation::{derive_recommendations, recommend_baseline};
pub use signature::{OperationSignature, diff_plans};

use crate::models::{BaselineRecommendation, ComparisonResult, PlanMetadata, PlanOperation};
use chrono::Utc;

/// Plan comparator entry points
pub struct PlanComparator;

impl PlanComparator {
    /// Compare the current plan against a historical plan version
    ///
    /// Never fails: an empty operation list on either side yields
    /// `comparison_possible = false` with a reason.
    pub fn compare(
        current: &[PlanOperation],
        historical: &[PlanOperation],
        current_metadata: Option<&PlanMetadata>,
        historical_metadata: Option<&PlanMetadata>,
    ) -> ComparisonResult {
        if current.is_empty() || historical.is_empty() {
            let side = match (current.is_empty(), historical.is_empty()) {
                (true, true) => "Current and historical plans are",
                (true, false) => "Current plan is",
                _ => "Historical plan is",
            };
            let mut result = ComparisonResult::not_possible(format!("{} not available", side));
            result.current_metadata = current_metadata.cloned();
            result.historical_metadata = historical_metadata.cloned();
            return result;
        }

        let current_metrics = metrics::aggregate(current);
        let historical_metrics = metrics::aggregate(historical);

        let plans_identical =
            current_metrics.plan_hash_value == historical_metrics.plan_hash_value;

        let regression_analysis = classify(&current_metrics, &historical_metrics);
        let plan_diff = diff_plans(current, historical);
        let significant_changes = detect_significant_changes(current, historical);
        let recommendations =
            derive_recommendations(&regression_analysis, &significant_changes, plans_identical);

        tracing::debug!(
            "Plan comparison: identical={}, regressions={}, severity={}, diff_changes={}, significant_changes={}",
            plans_identical,
            regression_analysis.regression_count,
            regression_analysis.overall_severity,
            plan_diff.total_changes,
            significant_changes.len()
        );

        ComparisonResult {
            comparison_possible: true,
            reason: None,
            plans_identical,
            current_metadata: current_metadata.cloned(),
            historical_metadata: historical_metadata.cloned(),
            current_metrics: Some(current_metrics),
            historical_metrics: Some(historical_metrics),
            regression_analysis: Some(regression_analysis),
            plan_diff: Some(plan_diff),
            significant_changes,
            recommendations,
            generated_at: Utc::now(),
        }
    }

    /// Decide whether to pin the historical plan for `identifier`
    pub fn recommend_baseline(result: &ComparisonResult, identifier: &str) -> BaselineRecommendation {
        recommend_baseline(result, identifier)
    }
}
