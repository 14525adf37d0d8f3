//! Upload orchestration: anchor, price, sign, commit, confirm.
//!
//! # Ordering
//! The anchor is fetched before signing and the commit happens after it,
//! since the signature covers the anchor.
//!
//! # Confirmation
//! Polling has no retry limit of its own. It ends on a receipt, on the first
//! network error, or when the caller's [`Cancellation`] ends.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::config::schema::UploaderConfig;
use crate::ledger::client::{HttpNetworkClient, NetworkClient};
use crate::ledger::transaction::Transaction;
use crate::ledger::types::{LedgerError, LedgerResult, Tag};
use crate::ledger::wallet::Wallet;
use crate::lifecycle::Cancellation;
use crate::observability::metrics;

/// Default interval between confirmation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Turns payloads into committed, optionally confirmed, transactions.
pub struct Uploader {
    client: Arc<dyn NetworkClient>,
    wallet: Option<Wallet>,
    poll_interval: Duration,
}

impl Uploader {
    pub fn new(client: Arc<dyn NetworkClient>, wallet: Option<Wallet>) -> Self {
        Self {
            client,
            wallet,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build an uploader talking HTTP to the configured gateway, loading the
    /// wallet file if one is configured.
    pub fn from_config(config: &UploaderConfig) -> LedgerResult<Self> {
        let client = HttpNetworkClient::new(&config.gateway)?;
        let wallet = config
            .wallet
            .path
            .as_deref()
            .map(Wallet::from_file)
            .transpose()?;

        if let Some(wallet) = &wallet {
            tracing::info!(address = %wallet.address(), "Wallet initialized");
        }

        Self::new(Arc::new(client), wallet).with_poll_interval(config.upload.poll_interval())
    }

    /// Set the interval between confirmation polls. Zero is rejected.
    pub fn with_poll_interval(mut self, interval: Duration) -> LedgerResult<Self> {
        if interval.is_zero() {
            return Err(LedgerError::InvalidSetting {
                field: "poll_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    pub fn client(&self) -> &dyn NetworkClient {
        self.client.as_ref()
    }

    /// Sign and commit `data` as a pure data transaction.
    ///
    /// Returning does not mean the network has confirmed it.
    pub async fn upload(&self, cancel: &Cancellation, data: Vec<u8>) -> LedgerResult<Transaction> {
        self.upload_with_tags(cancel, data, &[]).await
    }

    /// Like [`Uploader::upload`], attaching `tags` in order.
    pub async fn upload_with_tags(
        &self,
        cancel: &Cancellation,
        data: Vec<u8>,
        tags: &[Tag],
    ) -> LedgerResult<Transaction> {
        let wallet = self
            .wallet
            .as_ref()
            .filter(|w| w.has_private_key())
            .ok_or(LedgerError::NoWallet)?;

        tracing::debug!(
            wallet = %wallet.address(),
            content_size = data.len(),
            tags = tags.len(),
            "Uploading content"
        );

        let anchor = self.client.tx_anchor(cancel).await?;
        let price = self.client.get_price(cancel, &data).await?;
        tracing::debug!(anchor = %anchor, price = %price, "Building transaction");

        let mut tx = Transaction::new(anchor, wallet.owner().clone(), "0", "", data, price);
        for tag in tags {
            tx.add_tag(tag.name.clone(), tag.value.clone());
        }

        let signed = tx.sign(wallet)?;
        let body = signed.marshal()?;

        match self.client.commit(cancel, body).await {
            Ok(ack) => {
                metrics::record_commit(true);
                tracing::info!(
                    id = %signed.id(),
                    status = ack.status,
                    reward = %signed.reward(),
                    "Transaction committed"
                );
                Ok(signed)
            }
            Err(e) => {
                metrics::record_commit(false);
                Err(e)
            }
        }
    }

    /// Upload, then poll until the network returns the transaction.
    pub async fn upload_and_confirm(
        &self,
        cancel: &Cancellation,
        data: Vec<u8>,
    ) -> LedgerResult<Transaction> {
        self.upload_and_confirm_with_tags(cancel, data, &[]).await
    }

    pub async fn upload_and_confirm_with_tags(
        &self,
        cancel: &Cancellation,
        data: Vec<u8>,
        tags: &[Tag],
    ) -> LedgerResult<Transaction> {
        let tx = self.upload_with_tags(cancel, data, tags).await?;
        self.wait_for_confirmation(cancel, &tx.id()).await
    }

    /// Poll for `id` once per interval until a receipt arrives.
    pub async fn wait_for_confirmation(
        &self,
        cancel: &Cancellation,
        id: &str,
    ) -> LedgerResult<Transaction> {
        let mut ticker: Option<Interval> = None;

        loop {
            if let Err(reason) = cancel.check() {
                metrics::record_confirmation("cancelled");
                return Err(reason);
            }

            metrics::record_confirmation_poll();
            match self.client.get_transaction(cancel, id).await {
                Ok(Some(receipt)) => {
                    metrics::record_confirmation("confirmed");
                    tracing::info!(id = %id, "Transaction confirmed");
                    return Ok(receipt);
                }
                Ok(None) => {
                    tracing::debug!(id = %id, "Transaction not yet available");
                }
                Err(e) => {
                    let outcome = if e.is_cancellation() { "cancelled" } else { "error" };
                    metrics::record_confirmation(outcome);
                    return Err(e);
                }
            }

            tokio::select! {
                biased;
                reason = cancel.cancelled() => {
                    metrics::record_confirmation("cancelled");
                    return Err(reason);
                }
                _ = next_tick(&mut ticker, self.poll_interval) => {}
            }
        }
    }
}

/// Wait for the next poll slot, starting the ticker on first use.
async fn next_tick(ticker: &mut Option<Interval>, period: Duration) {
    let ticker = ticker.get_or_insert_with(|| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    ticker.tick().await;
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("wallet", &self.wallet)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
