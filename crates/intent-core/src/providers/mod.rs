//! Data provider port: the trending surface and the title catalog.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::{ProviderCall, ProviderError, ProviderResult};

pub mod fake;
pub mod http;

pub use fake::FakeProvider;
pub use http::{HttpProvider, ProviderConfig};

#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Ordered title ids on the trending surface for a region/locale.
    async fn fetch_trending(&self, region: &str, locale: &str) -> ProviderResult<Vec<String>>;

    /// Full title record (arbitrary nested mapping).
    async fn fetch_title(&self, title_id: &str) -> ProviderResult<Value>;

    fn name(&self) -> &'static str;
}

/// Provider access with a hard per-call deadline. Evaluators only reach
/// providers through this.
pub struct BoundedProvider<'a> {
    inner: &'a dyn DataProvider,
    timeout: Duration,
}

impl<'a> BoundedProvider<'a> {
    pub fn new(inner: &'a dyn DataProvider, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub async fn trending(&self, region: &str, locale: &str) -> ProviderResult<Vec<String>> {
        let call = ProviderCall::trending(region, locale);
        debug!(provider = self.inner.name(), call = %call, "provider call");
        match tokio::time::timeout(self.timeout, self.inner.fetch_trending(region, locale)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                call,
                after: self.timeout,
            }),
        }
    }

    pub async fn title(&self, title_id: &str) -> ProviderResult<Value> {
        let call = ProviderCall::title(title_id);
        debug!(provider = self.inner.name(), call = %call, "provider call");
        match tokio::time::timeout(self.timeout, self.inner.fetch_title(title_id)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                call,
                after: self.timeout,
            }),
        }
    }
}
