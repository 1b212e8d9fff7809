//! Check evaluation: validate, evaluate, stamp. Faults become `ERROR` results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::assertions;
use crate::errors::EngineResult;
use crate::model::{Assertion, CheckDefinition, CheckResult, Verdict};
use crate::providers::{BoundedProvider, DataProvider};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Deadline for every single provider call.
    pub call_timeout: Duration,
    /// Upper bound on evaluations in flight during `evaluate_all`.
    pub max_concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            max_concurrency: 4,
        }
    }
}

impl EngineSettings {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }
}

/// Evaluates check definitions against a data provider.
///
/// Holds no mutable state; clones share the provider (and its connection
/// pool) and may evaluate concurrently.
#[derive(Clone)]
pub struct CheckEngine {
    provider: Arc<dyn DataProvider>,
    settings: EngineSettings,
}

impl CheckEngine {
    pub fn new(provider: Arc<dyn DataProvider>, settings: EngineSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Evaluate one definition. Never fails: every fault is reported as an
    /// `ERROR` result carrying the error message and no evidence.
    pub async fn evaluate(&self, def: &CheckDefinition) -> CheckResult {
        let started = Instant::now();
        match self.try_evaluate(def).await {
            Ok(verdict) => {
                let result = CheckResult::from_verdict(def, verdict, Utc::now());
                debug!(
                    check_id = %def.id,
                    status = %result.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "check evaluated"
                );
                result
            }
            Err(e) => {
                warn!(
                    check_id = %def.id,
                    kind = %e.kind(),
                    error = %e,
                    "check evaluation failed"
                );
                CheckResult::error(def, e.result_message(), Utc::now())
            }
        }
    }

    /// Validate and evaluate without converting faults.
    pub async fn try_evaluate(&self, def: &CheckDefinition) -> EngineResult<Verdict> {
        let assertion = Assertion::from_definition(def)?;
        let provider = BoundedProvider::new(self.provider.as_ref(), self.settings.call_timeout);
        assertions::evaluate(&assertion, &provider).await
    }

    /// Evaluate a batch. Output order matches input order; at most
    /// `max_concurrency` evaluations run at once, and one faulty check
    /// never affects the others.
    pub async fn evaluate_all(&self, defs: &[CheckDefinition]) -> Vec<CheckResult> {
        let sem = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));

        let handles: Vec<_> = defs
            .iter()
            .map(|def| {
                let engine = self.clone();
                let def = def.clone();
                let sem = Arc::clone(&sem);
                tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await;
                    engine.evaluate(&def).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(defs.len());
        for (def, handle) in defs.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(check_id = %def.id, error = %e, "evaluation task aborted");
                    CheckResult::error(def, format!("evaluation task failed: {}", e), Utc::now())
                }
            };
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EngineError, ErrorKind};
    use crate::model::CheckStatus;
    use crate::providers::FakeProvider;
    use serde_json::{json, Value};

    fn definition(value: Value) -> CheckDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn trending_check(id: &str, title_id: &str) -> CheckDefinition {
        definition(json!({
            "id": id,
            "description": "title is trending",
            "severity": "high",
            "assert": {"type": "contains_title", "title_id": title_id},
            "target": {"region": "US", "locale": "en-US"}
        }))
    }

    fn engine(provider: FakeProvider) -> CheckEngine {
        CheckEngine::new(Arc::new(provider), EngineSettings::default())
    }

    #[tokio::test]
    async fn test_pass_result_copies_definition_metadata() {
        let provider = FakeProvider::new().with_trending("US", "en-US", &["t_foo", "t_palm_springs"]);
        let result = engine(provider)
            .evaluate(&trending_check("trending_palm", "t_palm_springs"))
            .await;

        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.check_id, "trending_palm");
        assert_eq!(result.description, "title is trending");
        assert_eq!(result.severity, "high");
        assert!(result.suspected_causes.is_empty());
        assert!(result.error.is_none());
        assert!(!result.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_type_becomes_error_without_fetching() {
        let provider = FakeProvider::new();
        let engine = engine(provider.clone());
        let def = definition(json!({"id": "c1", "assert": {"type": "bogus_type"}}));

        let result = engine.evaluate(&def).await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.error.as_deref().unwrap().contains("bogus_type"));
        assert!(result.evidence.is_empty());
        assert!(result.suspected_causes.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_mapping_assert_block_is_config_error_result() {
        let provider = FakeProvider::new().with_trending("US", "en-US", &["t_palm_springs"]);
        let engine = engine(provider.clone());
        let odd = definition(json!({"id": "odd", "severity": "high", "assert": "contains_title"}));

        let results = engine
            .evaluate_all(&[odd, trending_check("trending_palm", "t_palm_springs")])
            .await;

        assert_eq!(results[0].check_id, "odd");
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(results[0].severity, "high");
        let msg = results[0].error.as_deref().unwrap();
        assert!(msg.starts_with("configuration error: invalid check definition"), "{msg}");
        assert!(msg.contains("`assert` must be a mapping"), "{msg}");
        assert!(results[0].evidence.is_empty());

        assert_eq!(results[1].status, CheckStatus::Pass);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_status_error_is_error_not_fail() {
        let provider = FakeProvider::new().with_failure(503);
        let result = engine(provider)
            .evaluate(&trending_check("c1", "t_palm_springs"))
            .await;
        assert_eq!(result.status, CheckStatus::Error);
        let msg = result.error.unwrap();
        assert!(msg.starts_with("fetch error:"), "{msg}");
        assert!(msg.contains("HTTP 503"), "{msg}");
    }

    #[tokio::test]
    async fn test_unknown_title_is_fetch_error() {
        let def = definition(json!({
            "id": "c1",
            "assert": {"type": "field_exists", "field": "id"},
            "target": {"title_id": "t_missing"}
        }));
        let err = engine(FakeProvider::new()).try_evaluate(&def).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(matches!(err, EngineError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_malformed_timestamp_is_error() {
        let provider = FakeProvider::new().with_title(
            "t_foo",
            json!({"assets": {"tv_4k": {"artwork_updated_at": "not-a-date"}}}),
        );
        let def = definition(json!({
            "id": "c1",
            "assert": {"type": "asset_freshness_hours", "max_age_hours": 24},
            "target": {"title_id": "t_foo"}
        }));
        let result = engine(provider).evaluate(&def).await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.error.unwrap().starts_with("parse error:"));
    }

    #[tokio::test]
    async fn test_timeout_is_error() {
        let provider = FakeProvider::new()
            .with_trending("US", "en-US", &["t_palm_springs"])
            .with_delay(Duration::from_secs(5));
        let engine = CheckEngine::new(
            Arc::new(provider),
            EngineSettings::default().with_call_timeout(Duration::from_millis(20)),
        );
        let result = engine.evaluate(&trending_check("c1", "t_palm_springs")).await;
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_evaluate_all_preserves_order_and_isolates_faults() {
        let provider = FakeProvider::new().with_trending("US", "en-US", &["t_foo", "t_palm_springs"]);
        let defs = vec![
            trending_check("a", "t_palm_springs"),
            definition(json!({"id": "b", "assert": {"type": "bogus_type"}})),
            trending_check("c", "t_other"),
            trending_check("d", "t_foo"),
        ];

        let results = engine(provider).evaluate_all(&defs).await;
        let summary: Vec<(&str, CheckStatus)> = results
            .iter()
            .map(|r| (r.check_id.as_str(), r.status))
            .collect();
        assert_eq!(
            summary,
            [
                ("a", CheckStatus::Pass),
                ("b", CheckStatus::Error),
                ("c", CheckStatus::Fail),
                ("d", CheckStatus::Pass),
            ]
        );
    }

    #[tokio::test]
    async fn test_evaluate_all_empty_batch() {
        assert!(engine(FakeProvider::new()).evaluate_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_evaluation_is_stable() {
        let provider = FakeProvider::new().with_trending("US", "en-US", &["t_foo"]);
        let engine = engine(provider);
        let def = trending_check("c1", "t_other");

        let first = engine.evaluate(&def).await;
        let second = engine.evaluate(&def).await;
        assert_eq!(first.status, second.status);
        assert_eq!(first.evidence, second.evidence);
        assert_eq!(first.suspected_causes, second.suspected_causes);
    }
}
