use archstats_core::{SnapshotStore, StoreError, StoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Elasticsearch-style HTTP snapshot store.
///
/// Documents go to `POST <base>/<index>/_doc`; the prior-document probe
/// is `GET <base>/<index>/_count`. A 404 on the count endpoint means the
/// index has never been written, which is exactly the "no prior
/// document" answer.
pub struct EsSnapshotStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl EsSnapshotStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl SnapshotStore for EsSnapshotStore {
    async fn exists(&self, index: &str) -> StoreResult<bool> {
        let url = format!("{}/{}/_count", self.base_url, index);

        let response = timeout(REQUEST_TIMEOUT, self.client.get(&url).send())
            .await
            .map_err(|_| StoreError::Connect {
                details: format!("timeout probing {url}").into(),
            })?
            .map_err(|e| StoreError::Connect {
                details: format!("probing {url}: {e}").into(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(StoreError::Rejected {
                index: index.to_string(),
                details: format!("count returned {}", response.status()).into(),
            });
        }

        let body: CountResponse =
            response.json().await.map_err(|e| StoreError::Rejected {
                index: index.to_string(),
                details: format!("malformed count response: {e}").into(),
            })?;

        Ok(body.count > 0)
    }

    async fn store(&self, index: &str, document: &Value) -> StoreResult<()> {
        let url = format!("{}/{}/_doc", self.base_url, index);

        let response = timeout(
            REQUEST_TIMEOUT,
            self.client.post(&url).json(document).send(),
        )
        .await
        .map_err(|_| StoreError::Connect {
            details: format!("timeout storing to {url}").into(),
        })?
        .map_err(|e| StoreError::Connect {
            details: format!("storing to {url}: {e}").into(),
        })?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected {
                index: index.to_string(),
                details: format!("store returned {}", response.status()).into(),
            });
        }

        debug!(%index, "snapshot stored");
        Ok(())
    }
}
