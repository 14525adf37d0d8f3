//! Signing and submission of data transactions to a content-addressed
//! ledger gateway.

pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod observability;

pub use config::schema::UploaderConfig;
pub use ledger::{Transaction, Uploader, Wallet};
pub use lifecycle::Cancellation;
