//! Ledger upload subsystem.
//!
//! # Data Flow
//! ```text
//! JWK document
//!     → jwk.rs (decode RSA members)
//!     → wallet.rs (key pair, address, RSA-PSS sign/verify)
//!
//! payload bytes
//!     → uploader.rs asks client.rs for anchor + price
//!     → transaction.rs (build, signing message, sign, marshal)
//!     → client.rs commit
//!     → uploader.rs polls client.rs for the receipt until found or cancelled
//! ```
//!
//! # Security Constraints
//! - Private key material never reaches logs or `Debug` output
//! - A signature is verified before it can be committed
//! - Every network call honors the caller's cancellation scope

pub mod client;
pub mod encoding;
pub mod jwk;
pub mod transaction;
pub mod types;
pub mod uploader;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{HttpNetworkClient, NetworkClient};
pub use transaction::Transaction;
pub use types::{CommitAck, LedgerError, LedgerResult, Tag};
pub use uploader::Uploader;
pub use wallet::Wallet;
