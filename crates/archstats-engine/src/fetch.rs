//! HTTP metrics fetch.

use archstats_core::FetchError;
use async_trait::async_trait;

pub type FetchResult<T> = Result<T, FetchError>;

/// Issues one management-API request and returns the raw body.
///
/// Kept as a trait so the engine can be driven by scripted responses in
/// tests; the production implementation is [`HttpFetcher`].
#[async_trait]
pub trait MetricsFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        parameters: &[(String, String)],
    ) -> FetchResult<String>;
}

#[async_trait]
impl<F: MetricsFetcher> MetricsFetcher for std::sync::Arc<F> {
    async fn fetch(
        &self,
        url: &str,
        parameters: &[(String, String)],
    ) -> FetchResult<String> {
        (**self).fetch(url, parameters).await
    }
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        parameters: &[(String, String)],
    ) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .query(parameters)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout { url: url.to_string() }
                } else {
                    FetchError::Transport {
                        details: e.to_string().into(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            details: format!("reading body from {url}: {e}").into(),
        })
    }
}
