//! Regression Detection Service
//!
//! Fetches plans and samples from the providers and runs the pure analyzers on them.
//! Holds no mutable state, so one instance can serve concurrent requests.

use crate::config::AnalysisConfig;
use crate::error::{ProviderError, ServiceError, ServiceResult};
use crate::models::{
    BaselineRecommendation, ComparisonOutcome, ComparisonResult, CurrentMetrics, PlanSnapshot,
    RegressionOutcome, RegressionWindows, TimeWindow, TrendOutcome,
};
use crate::services::baseline_analyzer::BaselineAnalyzer;
use crate::services::plan_comparator::{PlanComparator, metrics::plan_hash_value};
use crate::services::providers::{ExecutionPlanProvider, HistoricalMetricsProvider};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct RegressionDetectionService {
    plan_provider: Arc<dyn ExecutionPlanProvider>,
    metrics_provider: Arc<dyn HistoricalMetricsProvider>,
    config: AnalysisConfig,
}

impl RegressionDetectionService {
    pub fn new(
        plan_provider: Arc<dyn ExecutionPlanProvider>,
        metrics_provider: Arc<dyn HistoricalMetricsProvider>,
        config: AnalysisConfig,
    ) -> Self {
        Self { plan_provider, metrics_provider, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // ========================================
    // Plan comparison
    // ========================================

    /// Compare the latest plan of `identifier` against a historical version
    ///
    /// Without `historical_hash` the most recently seen version with a different hash
    /// is used. If there is none the latest plan is compared with itself.
    pub async fn compare_plans(
        &self,
        identifier: &str,
        historical_hash: Option<i64>,
    ) -> ServiceResult<ComparisonResult> {
        let current = self.fetch_plan(identifier, None).await?;
        let current_hash = plan_hash_value(&current.operations);

        let historical_hash = match historical_hash {
            Some(hash) => Some(hash),
            None => self.previous_plan_hash(identifier, current_hash).await?,
        };

        let historical = match historical_hash {
            Some(hash) => self.fetch_plan(identifier, Some(hash)).await?,
            None => {
                debug!("No other plan version for {}, comparing the latest plan with itself", identifier);
                current.clone()
            },
        };

        let result = PlanComparator::compare(
            &current.operations,
            &historical.operations,
            current.metadata.as_ref(),
            historical.metadata.as_ref(),
        );

        info!(
            "Compared plans for {}: current={:?} historical={:?} regression={} severity={}",
            identifier,
            current_hash,
            historical_hash.or(current_hash),
            result.regression_detected(),
            result.overall_severity()
        );

        Ok(result)
    }

    /// Compare plans and decide whether the historical plan should be pinned
    pub async fn recommend_baseline(
        &self,
        identifier: &str,
        historical_hash: Option<i64>,
    ) -> ServiceResult<BaselineRecommendation> {
        let result = self.compare_plans(identifier, historical_hash).await?;
        let recommendation = PlanComparator::recommend_baseline(&result, identifier);

        info!(
            "Baseline recommendation for {}: recommend={} priority={:?}",
            identifier, recommendation.recommend, recommendation.priority
        );

        Ok(recommendation)
    }

    async fn fetch_plan(
        &self,
        identifier: &str,
        plan_hash: Option<i64>,
    ) -> ServiceResult<PlanSnapshot> {
        let snapshot = self
            .plan_provider
            .fetch_plan(identifier, plan_hash)
            .await
            .map_err(|e| match e {
                ProviderError::NotFound(_) => {
                    ServiceError::PlanNotFound { identifier: identifier.to_string(), plan_hash }
                },
                other => ServiceError::Provider(other),
            })?;

        debug!(
            "Fetched plan for {} (hash {:?}): {} operations",
            identifier,
            plan_hash,
            snapshot.operations.len()
        );
        Ok(snapshot)
    }

    async fn previous_plan_hash(
        &self,
        identifier: &str,
        current_hash: Option<i64>,
    ) -> ServiceResult<Option<i64>> {
        let versions = self.plan_provider.list_plan_versions(identifier).await?;
        let mut hashes = versions.iter().map(|v| v.plan_hash_value);
        Ok(match current_hash {
            Some(current) => hashes.find(|hash| *hash != current),
            // The latest version is the current plan itself
            None => hashes.nth(1),
        })
    }

    // ========================================
    // Historical metrics
    // ========================================

    /// Compare current metrics against the trailing `history_days` baseline
    pub async fn compare_current_vs_historical(
        &self,
        identifier: &str,
        current: &CurrentMetrics,
        threshold_percent: Option<f64>,
    ) -> ServiceResult<ComparisonOutcome> {
        let threshold = self.resolve_threshold(threshold_percent)?;
        let window = TimeWindow::trailing(Utc::now(), self.config.history_days);
        let samples = self.metrics_provider.fetch_samples(identifier, &window).await?;

        let outcome = BaselineAnalyzer::compare_current_vs_historical(current, &samples, threshold);
        info!(
            "Baseline comparison for {} over {} samples: trend={:?}",
            identifier,
            samples.len(),
            outcome.trend
        );
        Ok(outcome)
    }

    /// Trend analysis over the trailing `trend_days`
    pub async fn analyze_trend(&self, identifier: &str) -> ServiceResult<TrendOutcome> {
        let window = TimeWindow::trailing(Utc::now(), self.config.trend_days);
        let samples = self.metrics_provider.fetch_samples(identifier, &window).await?;

        let outcome = BaselineAnalyzer::analyze_trend(&samples);
        if !outcome.anomalies.is_empty() {
            warn!("{} elapsed-time anomalies for {}", outcome.anomalies.len(), identifier);
        }
        info!(
            "Trend analysis for {} over {} samples: {:?}",
            identifier, outcome.sample_count, outcome.overall_trend
        );
        Ok(outcome)
    }

    /// Compare the recent period against the baseline period before it
    pub async fn detect_regression(
        &self,
        identifier: &str,
        threshold_percent: Option<f64>,
    ) -> ServiceResult<RegressionOutcome> {
        let threshold = self.resolve_threshold(threshold_percent)?;
        let windows = RegressionWindows::ending_at(
            Utc::now(),
            self.config.baseline_days,
            self.config.recent_days,
        );

        let baseline = self.metrics_provider.fetch_samples(identifier, &windows.baseline).await?;
        let recent = self.metrics_provider.fetch_samples(identifier, &windows.recent).await?;

        let outcome = BaselineAnalyzer::detect_regression(&baseline, &recent, threshold);
        if outcome.regression_detected {
            warn!(
                "Regression detected for {}: severity={} metrics={:?}",
                identifier, outcome.severity, outcome.regressed_metrics
            );
        } else {
            info!(
                "No regression for {} (baseline={} recent={} samples)",
                identifier,
                baseline.len(),
                recent.len()
            );
        }
        Ok(outcome)
    }

    fn resolve_threshold(&self, threshold_percent: Option<f64>) -> ServiceResult<f64> {
        match threshold_percent {
            Some(t) if !t.is_finite() || t < 0.0 => Err(ServiceError::InvalidThreshold(t)),
            Some(t) => Ok(t),
            None => Ok(self.config.default_threshold_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderResult;
    use crate::models::{
        AnalysisStatus, HistoricalTrend, MetricKind, MetricSample, PlanOperation, PlanVersion,
        Priority, Severity,
    };
    use crate::services::providers::{InMemoryMetricsProvider, InMemoryPlanProvider};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    fn plan(hash: i64, root_cost: f64, options: &str) -> Vec<PlanOperation> {
        vec![
            PlanOperation::new(0, "SELECT STATEMENT")
                .with_cost(root_cost)
                .with_cardinality(1000.0)
                .with_plan_hash(hash),
            PlanOperation::new(1, "TABLE ACCESS")
                .with_parent(0)
                .with_depth(1)
                .with_options(options)
                .with_object("EMPLOYEES")
                .with_cost(root_cost * 0.8)
                .with_cardinality(1000.0),
        ]
    }

    fn version(hash: i64, last_seen: DateTime<Utc>) -> PlanVersion {
        PlanVersion { plan_hash_value: hash, first_seen: last_seen - Duration::days(1), last_seen }
    }

    fn elapsed(ts: DateTime<Utc>, value: f64) -> MetricSample {
        MetricSample::new(ts).with_metric(MetricKind::ElapsedTime, value)
    }

    fn service(
        plans: InMemoryPlanProvider,
        metrics: InMemoryMetricsProvider,
    ) -> RegressionDetectionService {
        RegressionDetectionService::new(Arc::new(plans), Arc::new(metrics), AnalysisConfig::default())
    }

    /// Current full scan at 1000 replaced an index plan at 100
    fn regressed_plans() -> InMemoryPlanProvider {
        let now = Utc::now();
        let plans = InMemoryPlanProvider::new();
        plans
            .insert_version("q1", version(111, now - Duration::days(10)), plan(111, 120.0, "FULL"), None)
            .unwrap();
        plans
            .insert_version(
                "q1",
                version(67890, now - Duration::days(3)),
                plan(67890, 100.0, "BY INDEX ROWID"),
                None,
            )
            .unwrap();
        plans
            .insert_version("q1", version(12345, now), plan(12345, 1000.0, "FULL"), None)
            .unwrap();
        plans
    }

    struct UnavailableProvider;

    #[async_trait]
    impl HistoricalMetricsProvider for UnavailableProvider {
        async fn fetch_samples(
            &self,
            _identifier: &str,
            _window: &TimeWindow,
        ) -> ProviderResult<Vec<MetricSample>> {
            Err(ProviderError::Unavailable("AWR offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_compare_plans_picks_most_recent_other_version() {
        let svc = service(regressed_plans(), InMemoryMetricsProvider::new());
        let result = svc.compare_plans("q1", None).await.unwrap();

        assert!(result.comparison_possible);
        assert!(!result.plans_identical);
        assert_eq!(result.historical_metrics.as_ref().unwrap().plan_hash_value, Some(67890));
        assert_eq!(result.overall_severity(), Severity::High);
    }

    #[tokio::test]
    async fn test_compare_plans_with_explicit_hash() {
        let svc = service(regressed_plans(), InMemoryMetricsProvider::new());
        let result = svc.compare_plans("q1", Some(111)).await.unwrap();
        assert_eq!(result.historical_metrics.unwrap().plan_hash_value, Some(111));

        let err = svc.compare_plans("q1", Some(5)).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::PlanNotFound { identifier: "q1".to_string(), plan_hash: Some(5) }
        );
    }

    #[tokio::test]
    async fn test_single_version_compares_with_itself() {
        let plans = InMemoryPlanProvider::new();
        plans.insert_version("q2", version(7, Utc::now()), plan(7, 50.0, "FULL"), None).unwrap();
        let svc = service(plans, InMemoryMetricsProvider::new());

        let result = svc.compare_plans("q2", None).await.unwrap();
        assert!(result.plans_identical);
        assert!(!result.regression_detected());
    }

    #[tokio::test]
    async fn test_hashless_current_plan_compares_with_previous_version() {
        let now = Utc::now();
        let hashless: Vec<PlanOperation> = plan(0, 400.0, "FULL")
            .into_iter()
            .map(|mut op| {
                op.plan_hash_value = None;
                op
            })
            .collect();
        let plans = InMemoryPlanProvider::new();
        plans
            .insert_version("q3", version(111, now - Duration::days(2)), plan(111, 100.0, "FULL"), None)
            .unwrap();
        plans.insert_version("q3", version(222, now), hashless, None).unwrap();
        let svc = service(plans, InMemoryMetricsProvider::new());

        let result = svc.compare_plans("q3", None).await.unwrap();
        assert!(!result.plans_identical);
        assert_eq!(result.current_metrics.as_ref().unwrap().plan_hash_value, None);
        assert_eq!(result.historical_metrics.as_ref().unwrap().plan_hash_value, Some(111));
        assert!(result.regression_detected());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_plan_not_found() {
        let svc = service(InMemoryPlanProvider::new(), InMemoryMetricsProvider::new());
        let err = svc.compare_plans("nope", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::PlanNotFound { plan_hash: None, .. }));
    }

    #[tokio::test]
    async fn test_recommend_baseline_for_regressed_plan() {
        let svc = service(regressed_plans(), InMemoryMetricsProvider::new());
        let rec = svc.recommend_baseline("q1", None).await.unwrap();

        assert!(rec.recommend);
        assert_eq!(rec.priority, Priority::High);
        assert!(rec.baseline_sql.unwrap().contains("67890"));
    }

    #[tokio::test]
    async fn test_compare_current_vs_history_window() {
        let now = Utc::now();
        let metrics = InMemoryMetricsProvider::new();
        metrics
            .insert_samples(
                "q1",
                vec![
                    elapsed(now - Duration::days(1), 1.0),
                    elapsed(now - Duration::days(2), 1.0),
                    elapsed(now - Duration::days(3), 1.0),
                    // Outside the default 7 day history
                    elapsed(now - Duration::days(20), 100.0),
                ],
            )
            .unwrap();
        let svc = service(InMemoryPlanProvider::new(), metrics);
        let current = CurrentMetrics { elapsed_time_sec: Some(1.5), ..Default::default() };

        let outcome = svc.compare_current_vs_historical("q1", &current, None).await.unwrap();
        assert_eq!(outcome.sample_count, 3);
        assert_eq!(outcome.threshold_percent, 20.0);
        assert_eq!(outcome.trend, HistoricalTrend::Degrading);

        let outcome = svc.compare_current_vs_historical("q1", &current, Some(60.0)).await.unwrap();
        assert_eq!(outcome.trend, HistoricalTrend::Stable);
    }

    #[tokio::test]
    async fn test_invalid_threshold_is_rejected() {
        let svc = service(InMemoryPlanProvider::new(), InMemoryMetricsProvider::new());
        let current = CurrentMetrics::default();

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = svc.compare_current_vs_historical("q1", &current, Some(bad)).await;
            assert!(matches!(err, Err(ServiceError::InvalidThreshold(_))));
        }
        assert!(matches!(
            svc.detect_regression("q1", Some(-5.0)).await,
            Err(ServiceError::InvalidThreshold(_))
        ));
        // Zero is a valid threshold
        assert!(svc.detect_regression("q1", Some(0.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_analyze_trend_over_trend_window() {
        let now = Utc::now();
        let metrics = InMemoryMetricsProvider::new();
        metrics
            .insert_samples(
                "q1",
                (1..=6).map(|day| elapsed(now - Duration::days(day), 10.0 - day as f64)),
            )
            .unwrap();
        let svc = service(InMemoryPlanProvider::new(), metrics);

        // Oldest sample is lowest: elapsed time rises toward now
        let outcome = svc.analyze_trend("q1").await.unwrap();
        assert_eq!(outcome.sample_count, 6);
        assert_eq!(outcome.overall_trend, HistoricalTrend::Degrading);

        let empty = svc.analyze_trend("other").await.unwrap();
        assert_eq!(empty.overall_trend, HistoricalTrend::InsufficientData);
    }

    #[tokio::test]
    async fn test_detect_regression_uses_disjoint_windows() {
        let now = Utc::now();
        let metrics = InMemoryMetricsProvider::new();
        metrics
            .insert_samples(
                "q1",
                vec![
                    elapsed(now - Duration::days(3), 100.0),
                    elapsed(now - Duration::days(5), 100.0),
                    elapsed(now - Duration::hours(2), 250.0),
                ],
            )
            .unwrap();
        let svc = service(InMemoryPlanProvider::new(), metrics);

        let outcome = svc.detect_regression("q1", None).await.unwrap();
        assert_eq!(outcome.status, AnalysisStatus::Ok);
        assert_eq!(outcome.baseline_sample_count, 2);
        assert_eq!(outcome.recent_sample_count, 1);
        assert_eq!(outcome.severity, Severity::Critical);

        let none = svc.detect_regression("other", None).await.unwrap();
        assert_eq!(none.status, AnalysisStatus::InsufficientData);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let svc = RegressionDetectionService::new(
            Arc::new(InMemoryPlanProvider::new()),
            Arc::new(UnavailableProvider),
            AnalysisConfig::default(),
        );
        let err = svc.analyze_trend("q1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Provider(ProviderError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_service_runs_on_concurrent_tasks() {
        let svc = service(regressed_plans(), InMemoryMetricsProvider::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.compare_plans("q1", None).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert!(result.regression_detected());
        }
    }
}
