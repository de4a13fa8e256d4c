//! Data collaborators of the regression engine
//!
//! The analysis core consumes plans and metric samples that something else fetched.
//! These traits are that boundary; database-backed implementations live with the
//! hosting application. The in-memory providers back tests and embedders that
//! already hold their data.

use crate::error::{ProviderError, ProviderResult};
use crate::models::{MetricSample, PlanMetadata, PlanOperation, PlanSnapshot, PlanVersion, TimeWindow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Source of execution plans for a query identifier
#[async_trait]
pub trait ExecutionPlanProvider: Send + Sync {
    /// Plan operations ordered by id; `None` resolves to the latest version
    async fn fetch_plan(
        &self,
        identifier: &str,
        plan_hash: Option<i64>,
    ) -> ProviderResult<PlanSnapshot>;

    /// Known plan versions, most recently seen first
    async fn list_plan_versions(&self, identifier: &str) -> ProviderResult<Vec<PlanVersion>>;
}

/// Source of time-ordered metric samples for a query identifier
#[async_trait]
pub trait HistoricalMetricsProvider: Send + Sync {
    async fn fetch_samples(
        &self,
        identifier: &str,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<MetricSample>>;
}

fn poisoned() -> ProviderError {
    ProviderError::Unavailable("in-memory store lock poisoned".to_string())
}

// ============================================================================
// In-memory plan provider
// ============================================================================

#[derive(Debug, Clone)]
struct StoredPlan {
    version: PlanVersion,
    snapshot: PlanSnapshot,
}

/// Plan registry keyed by identifier, holding every known version
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanProvider {
    plans: Arc<RwLock<HashMap<String, Vec<StoredPlan>>>>,
}

impl InMemoryPlanProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plan version, replacing any version with the same hash
    pub fn insert_version(
        &self,
        identifier: &str,
        version: PlanVersion,
        mut operations: Vec<PlanOperation>,
        metadata: Option<PlanMetadata>,
    ) -> ProviderResult<()> {
        operations.sort_by_key(|op| op.id);
        let mut guard = self.plans.write().map_err(|_| poisoned())?;
        let versions = guard.entry(identifier.to_string()).or_default();
        versions.retain(|p| p.version.plan_hash_value != version.plan_hash_value);
        versions.push(StoredPlan { version, snapshot: PlanSnapshot { operations, metadata } });
        Ok(())
    }
}

#[async_trait]
impl ExecutionPlanProvider for InMemoryPlanProvider {
    async fn fetch_plan(
        &self,
        identifier: &str,
        plan_hash: Option<i64>,
    ) -> ProviderResult<PlanSnapshot> {
        let guard = self.plans.read().map_err(|_| poisoned())?;
        let versions = guard
            .get(identifier)
            .ok_or_else(|| ProviderError::NotFound(identifier.to_string()))?;

        let found = match plan_hash {
            Some(hash) => versions.iter().find(|p| p.version.plan_hash_value == hash),
            None => versions.iter().max_by_key(|p| p.version.last_seen),
        };

        found.map(|p| p.snapshot.clone()).ok_or_else(|| {
            ProviderError::NotFound(format!("{} plan hash {:?}", identifier, plan_hash))
        })
    }

    async fn list_plan_versions(&self, identifier: &str) -> ProviderResult<Vec<PlanVersion>> {
        let guard = self.plans.read().map_err(|_| poisoned())?;
        let mut versions: Vec<PlanVersion> = guard
            .get(identifier)
            .map(|v| v.iter().map(|p| p.version.clone()).collect())
            .unwrap_or_default();
        versions.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then(a.plan_hash_value.cmp(&b.plan_hash_value))
        });
        Ok(versions)
    }
}

// ============================================================================
// In-memory metrics provider
// ============================================================================

/// Sample registry keyed by identifier
///
/// An identifier without samples yields an empty list, not an error.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsProvider {
    samples: Arc<RwLock<HashMap<String, Vec<MetricSample>>>>,
}

impl InMemoryMetricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_samples(
        &self,
        identifier: &str,
        samples: impl IntoIterator<Item = MetricSample>,
    ) -> ProviderResult<()> {
        let mut guard = self.samples.write().map_err(|_| poisoned())?;
        let stored = guard.entry(identifier.to_string()).or_default();
        stored.extend(samples);
        stored.sort_by_key(|s| s.timestamp);
        Ok(())
    }
}

#[async_trait]
impl HistoricalMetricsProvider for InMemoryMetricsProvider {
    async fn fetch_samples(
        &self,
        identifier: &str,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<MetricSample>> {
        let guard = self.samples.read().map_err(|_| poisoned())?;
        Ok(guard
            .get(identifier)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| window.contains(s.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
