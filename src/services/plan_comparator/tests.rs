//! Scenario tests for the plan comparator

use super::*;
use crate::models::{ChangeType, FindingType, PlanMetadata, PlanOperation, Priority, Severity};
use proptest::prelude::*;

/// Two-operation plan: SELECT STATEMENT over one table access
fn two_step_plan(
    hash: i64,
    root_cost: f64,
    cardinality: f64,
    options: &str,
    scan_cost: f64,
) -> Vec<PlanOperation> {
    vec![
        PlanOperation::new(0, "SELECT STATEMENT")
            .with_cost(root_cost)
            .with_cardinality(cardinality)
            .with_plan_hash(hash),
        PlanOperation::new(1, "TABLE ACCESS")
            .with_parent(0)
            .with_depth(1)
            .with_options(options)
            .with_object("EMPLOYEES")
            .with_cost(scan_cost)
            .with_cardinality(cardinality),
    ]
}

fn cost_only_plan(hash: i64, cost: f64) -> Vec<PlanOperation> {
    vec![PlanOperation::new(0, "SELECT STATEMENT").with_cost(cost).with_plan_hash(hash)]
}

mod compare_tests {
    use super::*;

    #[test]
    fn test_end_to_end_index_to_full_scan_regression() {
        let current = two_step_plan(12345, 1000.0, 10000.0, "FULL", 800.0);
        let historical = two_step_plan(67890, 100.0, 1000.0, "BY INDEX ROWID", 80.0);

        let result = PlanComparator::compare(&current, &historical, None, None);

        assert!(result.comparison_possible);
        assert!(!result.plans_identical);
        assert!(result.regression_detected());

        let analysis = result.regression_analysis.as_ref().unwrap();
        assert_eq!(analysis.overall_severity, Severity::High);

        let cost = analysis
            .regressions
            .iter()
            .find(|f| f.finding_type == FindingType::CostIncrease)
            .expect("cost_increase finding");
        assert_eq!(cost.ratio, 10.0);
        assert_eq!(cost.severity, Severity::High);

        assert!(
            analysis
                .regressions
                .iter()
                .any(|f| f.finding_type == FindingType::CardinalityOverestimation)
        );

        let access_changes: Vec<_> = result
            .significant_changes
            .iter()
            .filter(|c| c.change_type == ChangeType::AccessMethodChange)
            .collect();
        assert_eq!(access_changes.len(), 1);
        assert_eq!(access_changes[0].object_name.as_deref(), Some("EMPLOYEES"));
        assert_eq!(access_changes[0].historical_method.as_deref(), Some("INDEX ACCESS"));
        assert_eq!(access_changes[0].current_method.as_deref(), Some("TABLE ACCESS FULL"));
        assert_eq!(access_changes[0].severity, Severity::High);

        // Root changed cost, the table access changed signature
        let diff = result.plan_diff.as_ref().unwrap();
        assert_eq!(diff.added_count, 1);
        assert_eq!(diff.removed_count, 1);
        assert_eq!(diff.modified_count, 1);
        assert_eq!(diff.total_changes, 3);

        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.contains("EMPLOYEES") && r.contains("full table scan"))
        );
    }

    #[test]
    fn test_plan_against_itself_is_identical() {
        let plan = two_step_plan(12345, 1000.0, 10000.0, "FULL", 800.0);
        let result = PlanComparator::compare(&plan, &plan, None, None);

        assert!(result.comparison_possible);
        assert!(result.plans_identical);
        assert!(!result.regression_detected());
        assert_eq!(result.regression_analysis.as_ref().unwrap().regression_count, 0);
        assert!(result.significant_changes.is_empty());
        assert_eq!(result.plan_diff.as_ref().unwrap().total_changes, 0);
    }

    #[test]
    fn test_empty_plan_is_not_comparable() {
        let plan = cost_only_plan(1, 10.0);

        let result = PlanComparator::compare(&[], &plan, None, None);
        assert!(!result.comparison_possible);
        assert_eq!(result.reason.as_deref(), Some("Current plan is not available"));
        assert!(result.current_metrics.is_none());

        let result = PlanComparator::compare(&plan, &[], None, None);
        assert_eq!(result.reason.as_deref(), Some("Historical plan is not available"));

        let result = PlanComparator::compare(&[], &[], None, None);
        assert!(!result.comparison_possible);
    }

    #[test]
    fn test_hashless_plan_is_identical_to_itself() {
        let plan = vec![
            PlanOperation::new(0, "SELECT STATEMENT").with_cost(5.0),
            PlanOperation::new(1, "TABLE ACCESS").with_parent(0).with_depth(1).with_cost(5.0),
        ];
        let result = PlanComparator::compare(&plan, &plan, None, None);
        assert!(result.plans_identical);
        assert!(!result.regression_detected());
    }

    #[test]
    fn test_known_hash_differs_from_missing_hash() {
        let hashed = cost_only_plan(1, 5.0);
        let hashless = vec![PlanOperation::new(0, "SELECT STATEMENT").with_cost(5.0)];
        let result = PlanComparator::compare(&hashed, &hashless, None, None);
        assert!(!result.plans_identical);
    }

    #[test]
    fn test_metadata_is_echoed() {
        let meta = PlanMetadata {
            sql_id: Some("7h35uxf5uhmm1".to_string()),
            child_number: Some(0),
            ..Default::default()
        };
        let plan = cost_only_plan(1, 10.0);
        let result = PlanComparator::compare(&plan, &plan, Some(&meta), None);

        assert_eq!(result.current_metadata.as_ref(), Some(&meta));
        assert!(result.historical_metadata.is_none());
    }

    #[test]
    fn test_results_are_deterministic_apart_from_timestamp() {
        let current = two_step_plan(12345, 1000.0, 10000.0, "FULL", 800.0);
        let historical = two_step_plan(67890, 100.0, 1000.0, "BY INDEX ROWID", 80.0);

        let mut a = PlanComparator::compare(&current, &historical, None, None);
        let mut b = PlanComparator::compare(&current, &historical, None, None);
        b.generated_at = a.generated_at;
        assert_eq!(a, b);

        a.generated_at = b.generated_at;
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_result_serializes_in_camel_case() {
        let current = two_step_plan(12345, 1000.0, 10000.0, "FULL", 800.0);
        let historical = two_step_plan(67890, 100.0, 1000.0, "BY INDEX ROWID", 80.0);
        let value =
            serde_json::to_value(PlanComparator::compare(&current, &historical, None, None))
                .unwrap();

        assert_eq!(value["comparisonPossible"], true);
        assert_eq!(value["regressionAnalysis"]["overallSeverity"], "high");
        assert_eq!(value["historicalMetrics"]["planHashValue"], 67890);
        assert_eq!(value["significantChanges"][0]["type"], "access_method_change");
    }
}

mod recommendation_tests {
    use super::*;

    #[test]
    fn test_high_severity_recommends_with_high_priority() {
        let current = two_step_plan(12345, 1000.0, 10000.0, "FULL", 800.0);
        let historical = two_step_plan(67890, 100.0, 1000.0, "BY INDEX ROWID", 80.0);
        let result = PlanComparator::compare(&current, &historical, None, None);

        let rec = PlanComparator::recommend_baseline(&result, "7h35uxf5uhmm1");
        assert!(rec.recommend);
        assert_eq!(rec.priority, Priority::High);
        let sql = rec.baseline_sql.expect("baseline sql");
        assert!(sql.contains("'7h35uxf5uhmm1'"));
        assert!(sql.contains("67890"));
        assert!(!rec.instructions.is_empty());
    }

    #[test]
    fn test_medium_severity_recommends_with_medium_priority() {
        let result =
            PlanComparator::compare(&cost_only_plan(2, 150.0), &cost_only_plan(1, 100.0), None, None);
        assert_eq!(result.overall_severity(), Severity::Medium);

        let rec = recommend_baseline(&result, "abc");
        assert!(rec.recommend);
        assert_eq!(rec.priority, Priority::Medium);
    }

    #[test]
    fn test_three_significant_changes_force_medium_priority() {
        let historical = vec![
            PlanOperation::new(0, "SELECT STATEMENT").with_cost(100.0).with_plan_hash(1),
            PlanOperation::new(1, "INDEX").with_parent(0).with_options("RANGE SCAN").with_object("A_IDX"),
            PlanOperation::new(2, "INDEX").with_parent(0).with_options("RANGE SCAN").with_object("B_IDX"),
        ];
        let current = vec![
            PlanOperation::new(0, "SELECT STATEMENT").with_cost(100.0).with_plan_hash(2),
            PlanOperation::new(1, "INDEX").with_parent(0).with_options("RANGE SCAN").with_object("C_IDX"),
        ];
        let result = PlanComparator::compare(&current, &historical, None, None);
        assert!(!result.regression_detected());
        assert_eq!(result.significant_changes.len(), 3);
        assert!(result.significant_changes.iter().all(|c| c.severity == Severity::Low));

        let rec = recommend_baseline(&result, "abc");
        assert!(rec.recommend);
        assert_eq!(rec.priority, Priority::Medium);
    }

    #[test]
    fn test_high_access_change_forces_high_priority_without_cost_regression() {
        let current = two_step_plan(2, 100.0, 1000.0, "FULL", 80.0);
        let historical = two_step_plan(1, 100.0, 1000.0, "BY INDEX ROWID", 80.0);
        let result = PlanComparator::compare(&current, &historical, None, None);
        assert!(!result.regression_detected());

        let rec = recommend_baseline(&result, "abc");
        assert!(rec.recommend);
        assert_eq!(rec.priority, Priority::High);
    }

    #[test]
    fn test_no_recommendation_without_findings() {
        let plan = two_step_plan(1, 100.0, 1000.0, "FULL", 80.0);
        let result = PlanComparator::compare(&plan, &plan, None, None);

        let rec = recommend_baseline(&result, "abc");
        assert!(!rec.recommend);
        assert_eq!(rec.priority, Priority::Low);
        assert!(rec.baseline_sql.is_none());
    }

    #[test]
    fn test_not_comparable_is_not_recommended() {
        let result = PlanComparator::compare(&[], &cost_only_plan(1, 1.0), None, None);
        let rec = recommend_baseline(&result, "abc");
        assert!(!rec.recommend);
        assert_eq!(rec.reasons, vec!["Current plan is not available"]);
    }

    #[test]
    fn test_unknown_historical_hash_leaves_sql_empty() {
        let current = vec![PlanOperation::new(0, "SELECT STATEMENT").with_cost(300.0)];
        let historical = vec![PlanOperation::new(0, "SELECT STATEMENT").with_cost(100.0)];
        let result = PlanComparator::compare(&current, &historical, None, None);

        let rec = recommend_baseline(&result, "abc");
        assert!(rec.recommend);
        assert!(rec.baseline_sql.is_none());
        assert_eq!(rec.instructions.len(), 1);
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn cost_at_one_and_a_half_times_is_medium(c in 1u32..1_000_000) {
            let hist = f64::from(c);
            let result = PlanComparator::compare(
                &cost_only_plan(2, hist * 1.5), &cost_only_plan(1, hist), None, None);
            let analysis = result.regression_analysis.unwrap();

            prop_assert_eq!(analysis.regression_count, 1);
            prop_assert_eq!(analysis.regressions[0].finding_type, FindingType::CostIncrease);
            prop_assert_eq!(analysis.regressions[0].severity, Severity::Medium);
        }

        #[test]
        fn cost_at_double_is_high(c in 1u32..1_000_000) {
            let hist = f64::from(c);
            let result = PlanComparator::compare(
                &cost_only_plan(2, hist * 2.0), &cost_only_plan(1, hist), None, None);
            let analysis = result.regression_analysis.unwrap();

            prop_assert_eq!(analysis.regression_count, 1);
            prop_assert_eq!(analysis.overall_severity, Severity::High);
        }

        #[test]
        fn cost_at_eighty_percent_is_improvement(c in 1u32..1_000_000) {
            let hist = f64::from(c);
            let result = PlanComparator::compare(
                &cost_only_plan(2, hist * 0.8), &cost_only_plan(1, hist), None, None);
            let analysis = result.regression_analysis.unwrap();

            prop_assert!(!analysis.has_regression);
            prop_assert_eq!(analysis.improvement_count, 1);
            prop_assert_eq!(analysis.improvements[0].finding_type, FindingType::CostDecrease);
        }

        #[test]
        fn self_comparison_never_regresses(cost in 0.0f64..1e9, card in 0.0f64..1e9) {
            let plan = two_step_plan(7, cost, card, "FULL", cost / 2.0);
            let result = PlanComparator::compare(&plan, &plan, None, None);

            prop_assert!(result.plans_identical);
            prop_assert!(!result.regression_detected());
            prop_assert!(result.significant_changes.is_empty());
            prop_assert_eq!(result.plan_diff.unwrap().total_changes, 0);
        }
    }
}
