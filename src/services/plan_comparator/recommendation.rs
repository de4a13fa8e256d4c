//! Baseline recommendation and derived comparison advice

use crate::models::{
    BaselineRecommendation, ChangeType, ComparisonResult, FindingType, Priority,
    RegressionAnalysis, Severity, SignificantChange,
};

/// Number of significant operation changes that on their own justify a baseline
pub const SIGNIFICANT_CHANGE_COUNT: usize = 3;

/// Decide whether the historical plan should be pinned with a plan baseline
///
/// `baseline_sql` is a template for downstream tooling and is only filled in when a
/// baseline is recommended and the historical plan hash is known.
pub fn recommend_baseline(result: &ComparisonResult, identifier: &str) -> BaselineRecommendation {
    if !result.comparison_possible {
        return BaselineRecommendation {
            recommend: false,
            priority: Priority::Low,
            reasons: vec![
                result
                    .reason
                    .clone()
                    .unwrap_or_else(|| "Plans could not be compared".to_string()),
            ],
            baseline_sql: None,
            instructions: Vec::new(),
        };
    }

    let mut priority: Option<Priority> = None;
    let mut reasons = Vec::new();
    let mut raise = |p: Priority, reason: String, reasons: &mut Vec<String>| {
        priority = Some(priority.map_or(p, |cur| cur.max(p)));
        reasons.push(reason);
    };

    match result.overall_severity() {
        Severity::High | Severity::Critical => raise(
            Priority::High,
            format!("Plan regression with {} severity detected", result.overall_severity()),
            &mut reasons,
        ),
        Severity::Medium => raise(
            Priority::Medium,
            "Medium severity plan regression detected".to_string(),
            &mut reasons,
        ),
        Severity::Low | Severity::None => {},
    }

    if result.significant_changes.len() >= SIGNIFICANT_CHANGE_COUNT {
        raise(
            Priority::Medium,
            format!("{} significant operation changes", result.significant_changes.len()),
            &mut reasons,
        );
    }

    for change in result
        .significant_changes
        .iter()
        .filter(|c| c.change_type == ChangeType::AccessMethodChange && c.severity == Severity::High)
    {
        raise(Priority::High, change.message.clone(), &mut reasons);
    }

    let Some(priority) = priority else {
        return BaselineRecommendation {
            recommend: false,
            priority: Priority::Low,
            reasons: vec!["No regression requiring a plan baseline".to_string()],
            baseline_sql: None,
            instructions: Vec::new(),
        };
    };

    let historical_hash = result
        .historical_metrics
        .as_ref()
        .and_then(|m| m.plan_hash_value);

    let (baseline_sql, instructions) = match historical_hash {
        Some(hash) => (Some(baseline_sql(identifier, hash)), baseline_instructions(hash)),
        None => (
            None,
            vec![
                "The historical plan hash is unknown; identify the plan version to pin before \
                 creating a baseline"
                    .to_string(),
            ],
        ),
    };

    BaselineRecommendation { recommend: true, priority, reasons, baseline_sql, instructions }
}

/// Procedure invocation that loads the historical plan from the cursor cache
pub fn baseline_sql(identifier: &str, plan_hash_value: i64) -> String {
    format!(
        "DECLARE\n  l_plans_loaded PLS_INTEGER;\nBEGIN\n  \
         l_plans_loaded := DBMS_SPM.LOAD_PLANS_FROM_CURSOR_CACHE(\n    \
         sql_id => '{}',\n    plan_hash_value => {}\n  );\nEND;",
        identifier.replace('\'', "''"),
        plan_hash_value
    )
}

fn baseline_instructions(plan_hash_value: i64) -> Vec<String> {
    vec![
        format!(
            "Verify that plan {} is still available in the cursor cache or AWR",
            plan_hash_value
        ),
        "Run the baseline SQL as a user with the ADMINISTER SQL MANAGEMENT OBJECT privilege"
            .to_string(),
        "Confirm the new baseline is ENABLED and ACCEPTED in DBA_SQL_PLAN_BASELINES".to_string(),
        "Re-run the plan comparison after the next execution to confirm the pinned plan is used"
            .to_string(),
    ]
}

/// Advice attached to every comparison result
pub fn derive_recommendations(
    analysis: &RegressionAnalysis,
    changes: &[SignificantChange],
    plans_identical: bool,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    for finding in &analysis.regressions {
        let advice = match finding.finding_type {
            FindingType::CostIncrease => format!(
                "Plan cost rose {:.1}x; review what changed in the plan before the next peak load",
                finding.ratio
            ),
            FindingType::CardinalityOverestimation | FindingType::CardinalityUnderestimation => {
                "Gather fresh optimizer statistics on the accessed objects; row estimates moved \
                 by an order of magnitude"
                    .to_string()
            },
            FindingType::CpuCostIncrease => {
                "CPU cost increased; look for new sorts, hash joins or per-row function calls"
                    .to_string()
            },
            FindingType::IoCostIncrease => {
                "I/O cost increased; check for full scans that replaced index access".to_string()
            },
            FindingType::PlanComplexityIncrease => {
                "Plan depth increased; check for added views, subqueries or join steps".to_string()
            },
            FindingType::CostDecrease => continue,
        };
        if !recommendations.contains(&advice) {
            recommendations.push(advice);
        }
    }

    for change in changes {
        match change.change_type {
            ChangeType::AccessMethodChange if change.severity == Severity::High => {
                recommendations.push(format!(
                    "{}: index access was replaced by a full table scan; verify the index still \
                     exists and is usable",
                    change.object_name.as_deref().unwrap_or("object")
                ));
            },
            ChangeType::JoinOrderChange => recommendations.push(
                "Join order changed; compare join cardinality estimates between the two plans"
                    .to_string(),
            ),
            _ => {},
        }
    }

    if analysis.has_regression && !plans_identical {
        recommendations
            .push("Consider creating a SQL plan baseline for the historical plan".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("No action needed: no regression between the plan versions".to_string());
    }

    recommendations
}
