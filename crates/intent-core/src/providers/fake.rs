//! In-memory data provider for tests and demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::DataProvider;
use crate::errors::{ProviderCall, ProviderError, ProviderResult};

/// In-memory provider for tests.
///
/// Unknown region/locale pairs yield an empty trending list; unknown titles
/// yield a 404 status error, matching the catalog service.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    trending: HashMap<(String, String), Vec<String>>,
    titles: HashMap<String, Value>,
    delay: Option<Duration>,
    fail_status: Option<u16>,
    calls: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trending(mut self, region: &str, locale: &str, ids: &[&str]) -> Self {
        self.trending.insert(
            (region.to_string(), locale.to_string()),
            ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_title(mut self, title_id: &str, record: Value) -> Self {
        self.titles.insert(title_id.to_string(), record);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer every call with this HTTP status.
    pub fn with_failure(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Calls received so far (shared across clones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn before_call(&self, call: &ProviderCall) -> ProviderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_status {
            Some(status) => Err(ProviderError::Status {
                call: call.clone(),
                status,
                body: "injected failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_trending(&self, region: &str, locale: &str) -> ProviderResult<Vec<String>> {
        self.before_call(&ProviderCall::trending(region, locale))
            .await?;
        Ok(self
            .trending
            .get(&(region.to_string(), locale.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_title(&self, title_id: &str) -> ProviderResult<Value> {
        let call = ProviderCall::title(title_id);
        self.before_call(&call).await?;
        self.titles
            .get(title_id)
            .cloned()
            .ok_or_else(|| ProviderError::Status {
                call,
                status: 404,
                body: "title not found".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
