//! Regression classification between two plan versions
//!
//! Thresholds are fixed; they are part of the contract with downstream consumers
//! and intentionally not configurable.

use crate::models::{
    FindingType, ImprovementFinding, PlanMetrics, RegressionAnalysis, RegressionFinding, Severity,
};
use crate::utils::stats::round2;

// ============================================================================
// Thresholds
// ============================================================================

/// current/historical cost ratio that counts as a regression
pub const COST_REGRESSION_RATIO: f64 = 1.5;
/// Cost ratio at which a cost regression becomes high severity
pub const COST_HIGH_SEVERITY_RATIO: f64 = 2.0;
/// Cost improves when the ratio drops to 1 / this value or below
pub const COST_IMPROVEMENT_RATIO: f64 = 1.2;
/// Cardinality estimate error factor (either direction)
pub const CARDINALITY_ERROR_RATIO: f64 = 10.0;
/// Depth growth beyond which the plan counts as more complex
pub const COMPLEXITY_DEPTH_MARGIN: u32 = 2;
/// Per-operation cost ratio (either direction) that marks an operation as modified
pub const OPERATION_COST_CHANGE_RATIO: f64 = 1.2;
/// Per-operation cardinality change reported in diff details
pub const CARDINALITY_CHANGE_PERCENT: f64 = 20.0;

// ============================================================================
// Classifier
// ============================================================================

#[derive(Default)]
struct Findings {
    regressions: Vec<RegressionFinding>,
    improvements: Vec<ImprovementFinding>,
}

impl Findings {
    fn regression(
        &mut self,
        finding_type: FindingType,
        severity: Severity,
        current: f64,
        historical: f64,
        ratio: f64,
        message: String,
    ) {
        self.regressions.push(RegressionFinding {
            finding_type,
            severity,
            current_value: round2(current),
            historical_value: round2(historical),
            ratio: round2(ratio),
            change_percent: round2((ratio - 1.0) * 100.0),
            message,
        });
    }

    fn improvement(
        &mut self,
        finding_type: FindingType,
        current: f64,
        historical: f64,
        ratio: f64,
        message: String,
    ) {
        self.improvements.push(ImprovementFinding {
            finding_type,
            current_value: round2(current),
            historical_value: round2(historical),
            ratio: round2(ratio),
            change_percent: round2((ratio - 1.0) * 100.0),
            message,
        });
    }
}

/// Classify the metric deltas between the current and the historical plan
pub fn classify(current: &PlanMetrics, historical: &PlanMetrics) -> RegressionAnalysis {
    let mut findings = Findings::default();

    classify_cost(current, historical, &mut findings);
    classify_cardinality(current, historical, &mut findings);
    classify_resource_cost(
        FindingType::CpuCostIncrease,
        "CPU cost",
        current.total_cpu_cost,
        historical.total_cpu_cost,
        &mut findings,
    );
    classify_resource_cost(
        FindingType::IoCostIncrease,
        "I/O cost",
        current.total_io_cost,
        historical.total_io_cost,
        &mut findings,
    );
    classify_complexity(current, historical, &mut findings);

    let overall_severity = findings
        .regressions
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(Severity::None);

    RegressionAnalysis {
        has_regression: !findings.regressions.is_empty(),
        regression_count: findings.regressions.len(),
        improvement_count: findings.improvements.len(),
        overall_severity,
        regressions: findings.regressions,
        improvements: findings.improvements,
    }
}

fn classify_cost(current: &PlanMetrics, historical: &PlanMetrics, findings: &mut Findings) {
    let (cur, hist) = (current.total_cost, historical.total_cost);
    if hist <= 0.0 {
        return;
    }
    let ratio = cur / hist;

    if ratio >= COST_REGRESSION_RATIO {
        let severity = if ratio >= COST_HIGH_SEVERITY_RATIO {
            Severity::High
        } else {
            Severity::Medium
        };
        findings.regression(
            FindingType::CostIncrease,
            severity,
            cur,
            hist,
            ratio,
            format!("Plan cost increased {:.1}x (from {:.0} to {:.0})", ratio, hist, cur),
        );
    } else if ratio <= 1.0 / COST_IMPROVEMENT_RATIO {
        findings.improvement(
            FindingType::CostDecrease,
            cur,
            hist,
            ratio,
            format!(
                "Plan cost decreased by {:.1}% (from {:.0} to {:.0})",
                (1.0 - ratio) * 100.0,
                hist,
                cur
            ),
        );
    }
}

fn classify_cardinality(current: &PlanMetrics, historical: &PlanMetrics, findings: &mut Findings) {
    let (cur, hist) = (current.total_cardinality, historical.total_cardinality);
    if cur <= 0.0 || hist <= 0.0 {
        return;
    }
    let ratio = cur / hist;

    if ratio >= CARDINALITY_ERROR_RATIO {
        findings.regression(
            FindingType::CardinalityOverestimation,
            Severity::High,
            cur,
            hist,
            ratio,
            format!(
                "Estimated rows grew {:.1}x (from {:.0} to {:.0}); optimizer statistics may be stale",
                ratio, hist, cur
            ),
        );
    } else if ratio <= 1.0 / CARDINALITY_ERROR_RATIO {
        findings.regression(
            FindingType::CardinalityUnderestimation,
            Severity::High,
            cur,
            hist,
            ratio,
            format!(
                "Estimated rows dropped {:.1}x (from {:.0} to {:.0}); optimizer statistics may be stale",
                hist / cur,
                hist,
                cur
            ),
        );
    }
}

fn classify_resource_cost(
    finding_type: FindingType,
    label: &str,
    cur: f64,
    hist: f64,
    findings: &mut Findings,
) {
    if hist <= 0.0 {
        return;
    }
    let ratio = cur / hist;
    if ratio >= COST_REGRESSION_RATIO {
        findings.regression(
            finding_type,
            Severity::Medium,
            cur,
            hist,
            ratio,
            format!("{} increased {:.1}x (from {:.0} to {:.0})", label, ratio, hist, cur),
        );
    }
}

fn classify_complexity(current: &PlanMetrics, historical: &PlanMetrics, findings: &mut Findings) {
    let (cur, hist) = (current.max_depth, historical.max_depth);
    if cur.saturating_sub(hist) > COMPLEXITY_DEPTH_MARGIN {
        let ratio = if hist > 0 { cur as f64 / hist as f64 } else { 0.0 };
        findings.regression(
            FindingType::PlanComplexityIncrease,
            Severity::Low,
            cur as f64,
            hist as f64,
            ratio,
            format!("Plan depth grew from {} to {} levels", hist, cur),
        );
    }
}
