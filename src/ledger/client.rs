//! Gateway client: anchor, price, commit and receipt lookups.
//!
//! # Responsibilities
//! - Expose the four gateway operations behind [`NetworkClient`]
//! - Enforce a per-request timeout and the caller's cancellation scope
//! - Map transport failures and non-success statuses into `LedgerError`

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::ledger::transaction::Transaction;
use crate::ledger::types::{CommitAck, LedgerError, LedgerResult};
use crate::lifecycle::Cancellation;

/// Operations the uploader needs from the network.
///
/// Every call honors `cancel`: once the scope ends the call returns
/// `Cancelled` or `DeadlineExceeded` without waiting for the response.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Anchor reference to embed in the next transaction.
    async fn tx_anchor(&self, cancel: &Cancellation) -> LedgerResult<String>;

    /// Reward, as a decimal string, for storing `data`.
    async fn get_price(&self, cancel: &Cancellation, data: &[u8]) -> LedgerResult<String>;

    /// Submit a marshaled transaction.
    async fn commit(&self, cancel: &Cancellation, body: Vec<u8>) -> LedgerResult<CommitAck>;

    /// Look up a transaction by its URL-safe base64 id.
    ///
    /// `Ok(None)` means not found yet.
    async fn get_transaction(
        &self,
        cancel: &Cancellation,
        id: &str,
    ) -> LedgerResult<Option<Transaction>>;
}

/// HTTP client for a gateway node.
#[derive(Clone)]
pub struct HttpNetworkClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpNetworkClient {
    /// Create a client from gateway configuration.
    pub fn new(config: &GatewayConfig) -> LedgerResult<Self> {
        let base_url = config.base_url()?;
        Self::with_base_url(base_url, Duration::from_secs(config.request_timeout_secs))
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(mut base_url: Url, timeout: Duration) -> LedgerResult<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::network("client setup", e))?;

        tracing::debug!(base_url = %base_url, timeout_secs = timeout.as_secs(), "Gateway client initialized");

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, op: &'static str, path: &str) -> LedgerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::network(op, format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn get_text(&self, cancel: &Cancellation, op: &'static str, path: &str) -> LedgerResult<String> {
        let url = self.endpoint(op, path)?;
        cancel
            .run(async {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| LedgerError::network(op, e))?;
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|e| LedgerError::network(op, e))?;
                if !status.is_success() {
                    return Err(LedgerError::Status {
                        op,
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body.trim().to_string())
            })
            .await
    }
}

#[async_trait]
impl NetworkClient for HttpNetworkClient {
    async fn tx_anchor(&self, cancel: &Cancellation) -> LedgerResult<String> {
        let anchor = self.get_text(cancel, "fetch anchor", "tx_anchor").await?;
        tracing::debug!(anchor = %anchor, "Fetched transaction anchor");
        Ok(anchor)
    }

    async fn get_price(&self, cancel: &Cancellation, data: &[u8]) -> LedgerResult<String> {
        let path = format!("price/{}", data.len());
        let price = self.get_text(cancel, "fetch price", &path).await?;
        tracing::debug!(bytes = data.len(), price = %price, "Fetched price");
        Ok(price)
    }

    async fn commit(&self, cancel: &Cancellation, body: Vec<u8>) -> LedgerResult<CommitAck> {
        const OP: &str = "commit transaction";
        let url = self.endpoint(OP, "tx")?;
        cancel
            .run(async {
                let response = self
                    .http
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| LedgerError::network(OP, e))?;
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .map_err(|e| LedgerError::network(OP, e))?;
                if !status.is_success() {
                    return Err(LedgerError::Status {
                        op: OP,
                        status: status.as_u16(),
                        body: text,
                    });
                }
                Ok(CommitAck {
                    status: status.as_u16(),
                    body: text,
                })
            })
            .await
    }

    async fn get_transaction(
        &self,
        cancel: &Cancellation,
        id: &str,
    ) -> LedgerResult<Option<Transaction>> {
        const OP: &str = "fetch transaction";
        let url = self.endpoint(OP, &format!("tx/{}", id))?;
        cancel
            .run(async {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| LedgerError::network(OP, e))?;
                let status = response.status();
                if status == StatusCode::ACCEPTED || status == StatusCode::NOT_FOUND {
                    tracing::debug!(id = %id, status = status.as_u16(), "Transaction pending");
                    return Ok(None);
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| LedgerError::network(OP, e))?;
                if !status.is_success() {
                    return Err(LedgerError::Status {
                        op: OP,
                        status: status.as_u16(),
                        body: String::from_utf8_lossy(&body).into_owned(),
                    });
                }
                Transaction::unmarshal(&body).map(Some)
            })
            .await
    }
}

impl std::fmt::Debug for HttpNetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNetworkClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpNetworkClient {
        HttpNetworkClient::with_base_url(base.parse().unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoints_resolve_under_base() {
        let client = client("https://arweave.net:443");
        assert_eq!(
            client.endpoint("test", "tx_anchor").unwrap().as_str(),
            "https://arweave.net/tx_anchor"
        );

        let nested = self::client("http://localhost:1984/gateway");
        assert_eq!(
            nested.endpoint("test", "price/5").unwrap().as_str(),
            "http://localhost:1984/gateway/price/5"
        );
    }

    #[test]
    fn test_from_config() {
        let config = GatewayConfig::default().insecure();
        let client = HttpNetworkClient::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "http://arweave.net/");
        assert_eq!(client.timeout(), Duration::from_secs(config.request_timeout_secs));
    }

    #[tokio::test]
    async fn test_cancelled_scope_skips_request() {
        // Port 9 is discard; the request is never attempted anyway.
        let client = client("http://127.0.0.1:9");
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = client.tx_anchor(&cancel).await.unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled));
    }
}
