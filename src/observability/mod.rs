//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger operations produce:
//!     → tracing events (wallet address, sizes, anchor, price, ids)
//!     → metrics.rs (commit / poll / confirmation counters)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//!     → whatever metrics recorder the embedding binary installs
//! ```
//!
//! # Design Decisions
//! - Key material is never part of any event
//! - Metrics go through the `metrics` facade and are no-ops without a recorder

pub mod logging;
pub mod metrics;
