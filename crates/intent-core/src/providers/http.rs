//! HTTP provider: the surface service and the catalog service.
//!
//! This is the only place that interprets HTTP status codes. One attempt per
//! call; retry policy, if any, belongs to whoever schedules evaluations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::DataProvider;
use crate::errors::{ProviderCall, ProviderError, ProviderResult};

const USER_AGENT_VALUE: &str = concat!("intent-core/", env!("CARGO_PKG_VERSION"));

/// Longest error-body excerpt kept in a status error.
const MAX_BODY_EXCERPT: usize = 200;

/// Provider endpoints and the per-request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Catalog service base URL (`GET /titles/{id}`).
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Surface service base URL (`GET /surfaces/trending`).
    #[serde(default = "default_surface_url")]
    pub surface_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_catalog_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_surface_url() -> String {
    "http://localhost:8002".to_string()
}

fn default_timeout() -> u64 {
    5
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            surface_url: default_surface_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `CATALOG_BASE_URL` | Catalog service base URL |
    /// | `SURFACE_BASE_URL` | Surface service base URL |
    /// | `INTENT_HTTP_TIMEOUT_SECS` | Request timeout in seconds (default: 5) |
    pub fn from_env() -> Self {
        Self {
            catalog_url: std::env::var("CATALOG_BASE_URL").unwrap_or_else(|_| default_catalog_url()),
            surface_url: std::env::var("SURFACE_BASE_URL").unwrap_or_else(|_| default_surface_url()),
            timeout_secs: std::env::var("INTENT_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or_else(default_timeout),
        }
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = url.into();
        self
    }

    pub fn with_surface_url(mut self, url: impl Into<String>) -> Self {
        self.surface_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Errors building an [`HttpProvider`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    title_ids: Vec<String>,
}

/// Provider backed by the catalog and surface HTTP services.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    catalog_url: Url,
    surface_url: Url,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, BuildError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            catalog_url: parse_base_url(&config.catalog_url)?,
            surface_url: parse_base_url(&config.surface_url)?,
            timeout,
        })
    }

    pub fn from_env() -> Result<Self, BuildError> {
        Self::new(ProviderConfig::from_env())
    }

    fn trending_url(&self) -> Url {
        join_segments(&self.surface_url, &["surfaces", "trending"])
    }

    fn title_url(&self, title_id: &str) -> Url {
        join_segments(&self.catalog_url, &["titles", title_id])
    }

    async fn get_json(&self, call: ProviderCall, request: reqwest::RequestBuilder) -> ProviderResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(call.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                call,
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(call, e)
            } else {
                ProviderError::InvalidResponse {
                    call,
                    message: format!("body is not JSON: {}", e),
                }
            }
        })
    }

    fn transport_error(&self, call: ProviderCall, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                call,
                after: self.timeout,
            }
        } else {
            ProviderError::Network {
                call,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn fetch_trending(&self, region: &str, locale: &str) -> ProviderResult<Vec<String>> {
        let url = self.trending_url();
        debug!(url = %url, region, locale, "fetching trending surface");

        let call = ProviderCall::trending(region, locale);
        let request = self
            .client
            .get(url)
            .query(&[("region", region), ("locale", locale)]);
        let body = self.get_json(call.clone(), request).await?;

        serde_json::from_value::<TrendingResponse>(body)
            .map(|r| r.title_ids)
            .map_err(|e| ProviderError::InvalidResponse {
                call,
                message: format!("unexpected trending payload: {}", e),
            })
    }

    async fn fetch_title(&self, title_id: &str) -> ProviderResult<Value> {
        let url = self.title_url(title_id);
        debug!(url = %url, "fetching title record");

        let request = self.client.get(url);
        self.get_json(ProviderCall::title(title_id), request).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BuildError> {
    let url = Url::parse(raw.trim()).map_err(|e| BuildError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BuildError::InvalidUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments to a base URL, keeping any base path.
fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_EXCERPT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_join_segments_keeps_base_path_and_encodes() {
        let base = parse_base_url("http://catalog.local/api/").unwrap();
        assert_eq!(
            join_segments(&base, &["titles", "t/odd id"]).as_str(),
            "http://catalog.local/api/titles/t%2Fodd%20id"
        );

        let bare = parse_base_url("http://catalog.local").unwrap();
        assert_eq!(
            join_segments(&bare, &["titles", "t_foo"]).as_str(),
            "http://catalog.local/titles/t_foo"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = ProviderConfig::default().with_catalog_url("not a url");
        assert!(matches!(
            HttpProvider::new(config),
            Err(BuildError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_excerpt_bounds_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), MAX_BODY_EXCERPT + 3);
        assert_eq!(excerpt("  short  "), "short");
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        std::env::remove_var("CATALOG_BASE_URL");
        std::env::remove_var("SURFACE_BASE_URL");
        std::env::remove_var("INTENT_HTTP_TIMEOUT_SECS");

        let config = ProviderConfig::from_env();
        assert_eq!(config.catalog_url, "http://localhost:8001");
        assert_eq!(config.surface_url, "http://localhost:8002");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        std::env::set_var("CATALOG_BASE_URL", "http://catalog:8001");
        std::env::set_var("INTENT_HTTP_TIMEOUT_SECS", "0");

        let config = ProviderConfig::from_env();
        assert_eq!(config.catalog_url, "http://catalog:8001");
        assert_eq!(config.timeout_secs, 5, "zero timeout falls back to default");

        std::env::remove_var("CATALOG_BASE_URL");
        std::env::remove_var("INTENT_HTTP_TIMEOUT_SECS");
    }

    #[test]
    fn test_config_builder() {
        let config = ProviderConfig::default()
            .with_catalog_url("http://a")
            .with_surface_url("http://b")
            .with_timeout_secs(2);
        assert_eq!(config.catalog_url, "http://a");
        assert_eq!(config.surface_url, "http://b");
        assert_eq!(config.timeout(), Duration::from_secs(2));
    }
}
