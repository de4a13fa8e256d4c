//! Operation-level significant changes
//!
//! Compares how each object is accessed in both plans and whether the join
//! sequence moved.

use crate::models::{ChangeType, PlanOperation, Severity, SignificantChange};
use crate::utils::collection_ext::{diff_keys, group_by_key};
use std::fmt;

// ============================================================================
// Access Method
// ============================================================================

/// Normalized access method of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMethod {
    /// TABLE ACCESS FULL
    FullScan,
    /// TABLE ACCESS BY INDEX ROWID
    IndexRowid,
    /// INDEX with its options, e.g. "RANGE SCAN"
    Index(String),
    /// Anything else: operation and options as reported
    Other { operation: String, options: String },
}

impl AccessMethod {
    pub fn of(op: &PlanOperation) -> Self {
        let operation = op.operation.trim().to_uppercase();
        let options = op.options_str().trim().to_uppercase();

        match (operation.as_str(), options.as_str()) {
            ("TABLE ACCESS", "FULL") => Self::FullScan,
            ("TABLE ACCESS", "BY INDEX ROWID") => Self::IndexRowid,
            ("INDEX", _) => Self::Index(options),
            _ => Self::Other { operation, options },
        }
    }

    pub fn is_full_scan(&self) -> bool {
        matches!(self, Self::FullScan)
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::IndexRowid | Self::Index(_))
    }

    /// INDEX -> FULL is high, FULL -> INDEX is low, anything else medium
    pub fn transition_severity(historical: &AccessMethod, current: &AccessMethod) -> Severity {
        if historical.is_index() && current.is_full_scan() {
            Severity::High
        } else if historical.is_full_scan() && current.is_index() {
            Severity::Low
        } else {
            Severity::Medium
        }
    }
}

impl fmt::Display for AccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullScan => f.write_str("TABLE ACCESS FULL"),
            Self::IndexRowid => f.write_str("INDEX ACCESS"),
            Self::Index(options) if options.is_empty() => f.write_str("INDEX"),
            Self::Index(options) => write!(f, "INDEX {}", options),
            Self::Other { operation, options } if options.is_empty() => f.write_str(operation),
            Self::Other { operation, options } => write!(f, "{} {}", operation, options),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Detect access-method, object-set and join-order changes between two plans
///
/// Object changes are reported in object-name order, followed by at most one
/// join-order change.
pub fn detect_significant_changes(
    current: &[PlanOperation],
    historical: &[PlanOperation],
) -> Vec<SignificantChange> {
    let current_objects = group_by_key(current, |op| op.object_name.clone());
    let historical_objects = group_by_key(historical, |op| op.object_name.clone());
    let keys = diff_keys(&current_objects, &historical_objects);

    let mut changes: Vec<(String, SignificantChange)> = Vec::new();

    for object in keys.both {
        let cur = AccessMethod::of(current_objects[&object][0]);
        let hist = AccessMethod::of(historical_objects[&object][0]);
        if cur == hist {
            continue;
        }
        let severity = AccessMethod::transition_severity(&hist, &cur);
        changes.push((
            object.clone(),
            SignificantChange {
                change_type: ChangeType::AccessMethodChange,
                message: format!("Access method for {} changed from {} to {}", object, hist, cur),
                object_name: Some(object),
                historical_method: Some(hist.to_string()),
                current_method: Some(cur.to_string()),
                historical_sequence: None,
                current_sequence: None,
                severity,
            },
        ));
    }

    for object in keys.only_left {
        changes.push((object.clone(), object_change(ChangeType::NewObjectAccess, object)));
    }
    for object in keys.only_right {
        changes.push((object.clone(), object_change(ChangeType::RemovedObjectAccess, object)));
    }

    changes.sort_by(|a, b| a.0.cmp(&b.0));
    let mut changes: Vec<SignificantChange> = changes.into_iter().map(|(_, c)| c).collect();

    let current_sequence = join_sequence(current);
    let historical_sequence = join_sequence(historical);
    if current_sequence != historical_sequence {
        changes.push(SignificantChange {
            change_type: ChangeType::JoinOrderChange,
            object_name: None,
            historical_method: None,
            current_method: None,
            message: format!(
                "Join order changed from [{}] to [{}]",
                historical_sequence.join(", "),
                current_sequence.join(", ")
            ),
            historical_sequence: Some(historical_sequence),
            current_sequence: Some(current_sequence),
            severity: Severity::Medium,
        });
    }

    changes
}

/// Object names attached to join operations, in plan order
pub fn join_sequence(operations: &[PlanOperation]) -> Vec<String> {
    operations
        .iter()
        .filter(|op| op.is_join())
        .filter_map(|op| op.object_name.clone())
        .collect()
}

fn object_change(change_type: ChangeType, object: String) -> SignificantChange {
    let message = match change_type {
        ChangeType::NewObjectAccess => format!("Current plan accesses new object {}", object),
        _ => format!("Current plan no longer accesses {}", object),
    };
    SignificantChange {
        change_type,
        object_name: Some(object),
        historical_method: None,
        current_method: None,
        historical_sequence: None,
        current_sequence: None,
        severity: Severity::Low,
        message,
    }
}
