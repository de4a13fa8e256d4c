//! Error types for the provider and service layer
//!
//! The analysis core never fails; these errors only describe problems fetching
//! its inputs or invalid caller arguments.

use thiserror::Error;

/// Errors reported by plan and metrics providers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed provider data: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors returned by the regression detection service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("No plan found for {identifier} (plan hash {plan_hash:?})")]
    PlanNotFound { identifier: String, plan_hash: Option<i64> },

    #[error("Invalid threshold {0}: must be a finite, non-negative percentage")]
    InvalidThreshold(f64),
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
