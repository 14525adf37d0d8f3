//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI command starts:
//!     Cancellation::new() → optional with_timeout(confirm deadline)
//!     signals.rs: SIGINT → Cancellation::cancel()
//!
//! Every network round-trip and confirmation poll:
//!     Cancellation::run(request) / Cancellation::cancelled()
//!     → Cancelled or DeadlineExceeded ends the operation
//! ```
//!
//! # Design Decisions
//! - Cancellation is level-triggered (watch channel), so late subscribers
//!   still observe an earlier cancel
//! - A deadline is part of the scope, not a separate timer per call

pub mod cancel;
pub mod signals;

pub use cancel::Cancellation;
