//! Fetch transport.

use async_trait::async_trait;
use theme_core::FetchError;
use url::Url;

use crate::response::FetchResponse;
use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;

/// Transport used by components to GET storefront URLs.
///
/// URLs are passed as the components build them: a path plus query string
/// relative to the storefront origin.
#[async_trait(?Send)]
pub trait Fetcher {
    /// Perform a GET request and read the whole body.
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Fetch policy combining timeout and retry configuration.
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    /// Timeout configuration.
    pub timeout: TimeoutConfig,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl FetchPolicy {
    /// Create a new fetch policy.
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }
}

/// HTTP transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
    policy: FetchPolicy,
}

impl HttpFetcher {
    /// Create a fetcher for a storefront origin.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_policy(base_url, FetchPolicy::default())
    }

    /// Create a fetcher with an explicit policy.
    pub fn with_policy(base_url: &str, policy: FetchPolicy) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let client = reqwest::Client::builder()
            .connect_timeout(policy.timeout.connect)
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            policy,
        })
    }

    /// Storefront origin.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a component URL against the origin.
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))
    }

    async fn send_once(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(self.policy.timeout.total)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = resp.text().await.map_err(|e| FetchError::Body(e.to_string()))?;

        let mut response = FetchResponse::new(status, body);
        response.content_type = content_type;
        Ok(response)
    }
}

fn classify(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::Connection(e.to_string())
    }
}

#[async_trait(?Send)]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let target = self.resolve(url)?;
        let retry = &self.policy.retry;

        let mut attempt = 0;
        loop {
            match self.send_once(&target).await {
                Ok(resp) if retry.should_retry_status(resp.status.as_u16(), attempt) => {
                    tracing::debug!(url = %target, status = resp.status.as_u16(), attempt, "retrying fetch");
                }
                Ok(resp) => return Ok(resp),
                Err(FetchError::Timeout(_)) if retry.should_retry_timeout(attempt) => {
                    tracing::debug!(url = %target, attempt, "retrying fetch after timeout");
                }
                Err(FetchError::Connection(_)) if retry.should_retry_connection(attempt) => {
                    tracing::debug!(url = %target, attempt, "retrying fetch after connection error");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(retry.backoff.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_urls() {
        let fetcher = HttpFetcher::new("https://shop.example.com/").unwrap();
        assert_eq!(
            fetcher
                .resolve("/collections/x?filter.v.option.color=Red&section_id=main")
                .unwrap()
                .as_str(),
            "https://shop.example.com/collections/x?filter.v.option.color=Red&section_id=main"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpFetcher::new("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
