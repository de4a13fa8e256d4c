//! Stellar Regression Library
//!
//! Performance regression detection for database queries: an execution plan
//! comparator and a historical baseline analyzer, plus the provider traits and
//! service that feed them.
//!
//! The analysis core (`services::plan_comparator`, `services::baseline_analyzer`)
//! is synchronous and pure. [`RegressionDetectionService`] adds data fetching,
//! configuration and logging around it.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{AnalysisConfig, Config, LoggingConfig};
pub use error::{ProviderError, ServiceError, ServiceResult};
pub use services::{
    BaselineAnalyzer, ExecutionPlanProvider, HistoricalMetricsProvider, InMemoryMetricsProvider,
    InMemoryPlanProvider, PlanComparator, RegressionDetectionService,
};
