//! Execution plan data models
//!
//! Plan operations as delivered by the execution plan provider, and every value
//! the plan comparator produces from them. All types serialize in camelCase so the
//! API layer can return them as response bodies unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Severity / Priority
// ============================================================================

/// Severity of a finding, totally ordered: none < low < medium < high < critical
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a baseline recommendation
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

// ============================================================================
// Plan Operation (input)
// ============================================================================

/// One node of an execution plan
///
/// Numeric fields are `None` when the optimizer did not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanOperation {
    /// Unique within one plan version
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Physical operator, e.g. "TABLE ACCESS"
    pub operation: String,
    /// Operator options, e.g. "FULL" or "BY INDEX ROWID"
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub cardinality: Option<f64>,
    #[serde(default)]
    pub cpu_cost: Option<f64>,
    #[serde(default)]
    pub io_cost: Option<f64>,
    /// Tree depth from the root (root = 0)
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub access_predicates: Option<String>,
    #[serde(default)]
    pub filter_predicates: Option<String>,
    /// Plan version this operation belongs to
    #[serde(default)]
    pub plan_hash_value: Option<i64>,
}

impl PlanOperation {
    pub fn new(id: i64, operation: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            operation: operation.into(),
            options: None,
            object_name: None,
            cost: None,
            cardinality: None,
            cpu_cost: None,
            io_cost: None,
            depth: 0,
            access_predicates: None,
            filter_predicates: None,
            plan_hash_value: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn with_object(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_cardinality(mut self, cardinality: f64) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_cpu_io(mut self, cpu_cost: f64, io_cost: f64) -> Self {
        self.cpu_cost = Some(cpu_cost);
        self.io_cost = Some(io_cost);
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_access_predicates(mut self, predicates: impl Into<String>) -> Self {
        self.access_predicates = Some(predicates.into());
        self
    }

    pub fn with_filter_predicates(mut self, predicates: impl Into<String>) -> Self {
        self.filter_predicates = Some(predicates.into());
        self
    }

    pub fn with_plan_hash(mut self, plan_hash_value: i64) -> Self {
        self.plan_hash_value = Some(plan_hash_value);
        self
    }

    /// Options as a plain string ("" when absent)
    pub fn options_str(&self) -> &str {
        self.options.as_deref().unwrap_or("")
    }

    /// Whether this is a join operator (its name contains "JOIN")
    pub fn is_join(&self) -> bool {
        self.operation.to_uppercase().contains("JOIN")
    }
}

/// Optional context describing where a plan version came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
    /// e.g. "cursor_cache" or "awr"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A plan version as returned by the plan provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub operations: Vec<PlanOperation>,
    #[serde(default)]
    pub metadata: Option<PlanMetadata>,
}

/// A known plan version of a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanVersion {
    pub plan_hash_value: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

// ============================================================================
// Comparison Output
// ============================================================================

/// Aggregate metrics over one plan version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetrics {
    /// Cost of the root operation (already includes descendants)
    pub total_cost: f64,
    pub total_cardinality: f64,
    pub total_cpu_cost: f64,
    pub total_io_cost: f64,
    pub max_depth: u32,
    pub operation_count: usize,
    pub plan_hash_value: Option<i64>,
}

/// Kind of a metric-level finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    CostIncrease,
    CostDecrease,
    CardinalityOverestimation,
    CardinalityUnderestimation,
    CpuCostIncrease,
    IoCostIncrease,
    PlanComplexityIncrease,
}

/// A classified regression between the historical and the current plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegressionFinding {
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub severity: Severity,
    pub current_value: f64,
    pub historical_value: f64,
    pub ratio: f64,
    pub change_percent: f64,
    pub message: String,
}

/// A classified improvement (carries no severity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementFinding {
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub current_value: f64,
    pub historical_value: f64,
    pub ratio: f64,
    pub change_percent: f64,
    pub message: String,
}

/// Regression classification summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegressionAnalysis {
    pub has_regression: bool,
    pub regression_count: usize,
    pub improvement_count: usize,
    pub overall_severity: Severity,
    pub regressions: Vec<RegressionFinding>,
    pub improvements: Vec<ImprovementFinding>,
}

/// Kind of an operation-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    AccessMethodChange,
    NewObjectAccess,
    RemovedObjectAccess,
    JoinOrderChange,
}

/// An operation-level change keyed by object name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignificantChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_sequence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_sequence: Option<Vec<String>>,
    pub severity: Severity,
    pub message: String,
}

/// Short description of an added or removed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    pub id: i64,
    pub operation: String,
    pub options: Option<String>,
    pub object_name: Option<String>,
    pub cost: Option<f64>,
    pub cardinality: Option<f64>,
}

impl From<&PlanOperation> for OperationSummary {
    fn from(op: &PlanOperation) -> Self {
        Self {
            id: op.id,
            operation: op.operation.clone(),
            options: op.options.clone(),
            object_name: op.object_name.clone(),
            cost: op.cost,
            cardinality: op.cardinality,
        }
    }
}

/// An operation present in both plans whose cost or predicates changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedOperation {
    pub id: i64,
    pub operation: String,
    pub options: Option<String>,
    pub object_name: Option<String>,
    pub historical_cost: Option<f64>,
    pub current_cost: Option<f64>,
    pub historical_cardinality: Option<f64>,
    pub current_cardinality: Option<f64>,
    /// Human-readable change descriptions
    pub changes: Vec<String>,
}

/// Structural diff of two plan versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanDiff {
    pub added_count: usize,
    pub removed_count: usize,
    pub modified_count: usize,
    pub total_changes: usize,
    pub added: Vec<OperationSummary>,
    pub removed: Vec<OperationSummary>,
    pub modified: Vec<ModifiedOperation>,
}

/// Top-level result of comparing two plan versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub comparison_possible: bool,
    /// Why the comparison was not possible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub plans_identical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_metadata: Option<PlanMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_metadata: Option<PlanMetadata>,
    pub current_metrics: Option<PlanMetrics>,
    pub historical_metrics: Option<PlanMetrics>,
    pub regression_analysis: Option<RegressionAnalysis>,
    pub plan_diff: Option<PlanDiff>,
    pub significant_changes: Vec<SignificantChange>,
    pub recommendations: Vec<String>,
    /// Generation time, informational only
    pub generated_at: DateTime<Utc>,
}

impl ComparisonResult {
    /// Result for a pair of plans that cannot be compared
    pub fn not_possible(reason: impl Into<String>) -> Self {
        Self {
            comparison_possible: false,
            reason: Some(reason.into()),
            plans_identical: false,
            current_metadata: None,
            historical_metadata: None,
            current_metrics: None,
            historical_metrics: None,
            regression_analysis: None,
            plan_diff: None,
            significant_changes: Vec::new(),
            recommendations: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Overall regression severity (none when nothing was compared)
    pub fn overall_severity(&self) -> Severity {
        self.regression_analysis
            .as_ref()
            .map(|a| a.overall_severity)
            .unwrap_or_default()
    }

    pub fn regression_detected(&self) -> bool {
        self.regression_analysis
            .as_ref()
            .is_some_and(|a| a.has_regression)
    }
}

/// Whether a plan baseline should be captured for the historical plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRecommendation {
    pub recommend: bool,
    pub priority: Priority,
    pub reasons: Vec<String>,
    /// Procedure invocation template for downstream tooling; never executed here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_sql: Option<String>,
    pub instructions: Vec<String>,
}
