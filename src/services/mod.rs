pub mod baseline_analyzer;
pub mod plan_comparator;
pub mod providers;
pub mod regression_service;

pub use baseline_analyzer::BaselineAnalyzer;
pub use plan_comparator::PlanComparator;
pub use providers::{
    ExecutionPlanProvider, HistoricalMetricsProvider, InMemoryMetricsProvider,
    InMemoryPlanProvider,
};
pub use regression_service::RegressionDetectionService;
