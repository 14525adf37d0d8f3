//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → UploaderConfig (validated, immutable)
//!     → CLI flags override gateway/wallet settings
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty or missing file is usable
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{GatewayConfig, LogFormat, ObservabilityConfig, UploadConfig, UploaderConfig, WalletConfig};
