//! Operation signatures and structural plan diff
//!
//! A signature identifies "the same operation" across two plan versions. It is a
//! composite key, so separator characters inside names cannot cause collisions.

use super::classifier::{CARDINALITY_CHANGE_PERCENT, OPERATION_COST_CHANGE_RATIO};
use crate::models::{ModifiedOperation, OperationSummary, PlanDiff, PlanOperation};
use crate::utils::collection_ext::{diff_keys, index_by};
use crate::utils::stats::percent_change;

/// Stable identity of an operation within a plan version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationSignature {
    pub id: i64,
    pub operation: String,
    pub options: Option<String>,
    pub object_name: Option<String>,
}

impl OperationSignature {
    pub fn of(op: &PlanOperation) -> Self {
        Self {
            id: op.id,
            operation: op.operation.clone(),
            options: op.options.clone(),
            object_name: op.object_name.clone(),
        }
    }
}

/// Diff two plan versions by operation signature
///
/// Added/removed come from the set difference; operations present in both plans
/// are reported as modified when their cost moved by 20% or more in either
/// direction, or when a predicate string changed.
pub fn diff_plans(current: &[PlanOperation], historical: &[PlanOperation]) -> PlanDiff {
    let current_map = index_by(current, OperationSignature::of);
    let historical_map = index_by(historical, OperationSignature::of);
    let keys = diff_keys(&current_map, &historical_map);

    let added: Vec<OperationSummary> = keys
        .only_left
        .iter()
        .map(|sig| OperationSummary::from(current_map[sig]))
        .collect();
    let removed: Vec<OperationSummary> = keys
        .only_right
        .iter()
        .map(|sig| OperationSummary::from(historical_map[sig]))
        .collect();
    let modified: Vec<ModifiedOperation> = keys
        .both
        .iter()
        .filter_map(|sig| compare_operation(current_map[sig], historical_map[sig]))
        .collect();

    PlanDiff {
        added_count: added.len(),
        removed_count: removed.len(),
        modified_count: modified.len(),
        total_changes: added.len() + removed.len() + modified.len(),
        added,
        removed,
        modified,
    }
}

/// Whether two versions of the same operation differ significantly
pub fn differs_significantly(current: &PlanOperation, historical: &PlanOperation) -> bool {
    let cost_moved = match (current.cost, historical.cost) {
        (Some(cur), Some(hist)) if hist > 0.0 => {
            let ratio = cur / hist;
            ratio >= OPERATION_COST_CHANGE_RATIO || ratio <= 1.0 / OPERATION_COST_CHANGE_RATIO
        },
        _ => false,
    };

    cost_moved
        || current.access_predicates != historical.access_predicates
        || current.filter_predicates != historical.filter_predicates
}

fn compare_operation(
    current: &PlanOperation,
    historical: &PlanOperation,
) -> Option<ModifiedOperation> {
    if !differs_significantly(current, historical) {
        return None;
    }

    let mut changes = Vec::new();

    if let (Some(cur), Some(hist)) = (current.cost, historical.cost)
        && hist > 0.0
    {
        changes.push(format!(
            "Cost changed from {} to {} ({:+.1}%)",
            hist,
            cur,
            percent_change(cur, hist)
        ));
    }
    if current.access_predicates != historical.access_predicates {
        changes.push("Access predicates changed".to_string());
    }
    if current.filter_predicates != historical.filter_predicates {
        changes.push("Filter predicates changed".to_string());
    }
    if let (Some(cur), Some(hist)) = (current.cardinality, historical.cardinality)
        && hist > 0.0
    {
        let pct = percent_change(cur, hist);
        if pct.abs() > CARDINALITY_CHANGE_PERCENT {
            changes.push(format!("Cardinality changed from {} to {} ({:+.1}%)", hist, cur, pct));
        }
    }

    Some(ModifiedOperation {
        id: current.id,
        operation: current.operation.clone(),
        options: current.options.clone(),
        object_name: current.object_name.clone(),
        historical_cost: historical.cost,
        current_cost: current.cost,
        historical_cardinality: historical.cardinality,
        current_cardinality: current.cardinality,
        changes,
    })
}
