//! Plan metrics aggregation
//!
//! Reduces a flat operation list into the summary used by regression classification.

use crate::models::{PlanMetrics, PlanOperation};

/// Root operation of a plan: the first operation without a parent,
/// falling back to the shallowest (then lowest id) operation.
pub fn root_operation(operations: &[PlanOperation]) -> Option<&PlanOperation> {
    operations
        .iter()
        .find(|op| op.parent_id.is_none())
        .or_else(|| operations.iter().min_by_key(|op| (op.depth, op.id)))
}

/// Plan hash of the plan version (root first, then any operation that carries one)
pub fn plan_hash_value(operations: &[PlanOperation]) -> Option<i64> {
    root_operation(operations)
        .and_then(|root| root.plan_hash_value)
        .or_else(|| operations.iter().find_map(|op| op.plan_hash_value))
}

/// Aggregate an operation list into [`PlanMetrics`]
///
/// `total_cost` is the root cost only (it already includes descendants); cardinality,
/// CPU and I/O cost are summed. Unknown values count as 0.
pub fn aggregate(operations: &[PlanOperation]) -> PlanMetrics {
    let total_cost = root_operation(operations)
        .and_then(|root| root.cost)
        .unwrap_or(0.0);

    let sum = |f: fn(&PlanOperation) -> Option<f64>| -> f64 {
        operations.iter().filter_map(f).sum()
    };

    PlanMetrics {
        total_cost,
        total_cardinality: sum(|op| op.cardinality),
        total_cpu_cost: sum(|op| op.cpu_cost),
        total_io_cost: sum(|op| op.io_cost),
        max_depth: operations.iter().map(|op| op.depth).max().unwrap_or(0),
        operation_count: operations.len(),
        plan_hash_value: plan_hash_value(operations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Vec<PlanOperation> {
        vec![
            PlanOperation::new(0, "SELECT STATEMENT").with_cost(120.0).with_plan_hash(777),
            PlanOperation::new(1, "HASH JOIN")
                .with_parent(0)
                .with_depth(1)
                .with_cost(120.0)
                .with_cardinality(50.0)
                .with_cpu_io(1000.0, 10.0),
            PlanOperation::new(2, "TABLE ACCESS")
                .with_parent(1)
                .with_depth(2)
                .with_options("FULL")
                .with_object("ORDERS")
                .with_cost(70.0)
                .with_cardinality(5000.0)
                .with_cpu_io(600.0, 6.0),
            PlanOperation::new(3, "INDEX")
                .with_parent(1)
                .with_depth(2)
                .with_options("RANGE SCAN")
                .with_object("CUSTOMERS_PK"),
        ]
    }

    #[test]
    fn test_total_cost_is_root_cost_not_sum() {
        let metrics = aggregate(&sample_plan());
        assert_eq!(metrics.total_cost, 120.0);
        assert_eq!(metrics.total_cardinality, 5050.0);
        assert_eq!(metrics.total_cpu_cost, 1600.0);
        assert_eq!(metrics.total_io_cost, 16.0);
        assert_eq!(metrics.max_depth, 2);
        assert_eq!(metrics.operation_count, 4);
        assert_eq!(metrics.plan_hash_value, Some(777));
    }

    #[test]
    fn test_root_falls_back_to_shallowest_operation() {
        let ops = vec![
            PlanOperation::new(5, "SORT").with_parent(4).with_depth(2).with_cost(9.0),
            PlanOperation::new(4, "VIEW").with_parent(3).with_depth(1).with_cost(30.0),
        ];
        assert_eq!(root_operation(&ops).map(|op| op.id), Some(4));
        assert_eq!(aggregate(&ops).total_cost, 30.0);
    }

    #[test]
    fn test_empty_plan_aggregates_to_zero() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics, PlanMetrics::default());
    }
}
