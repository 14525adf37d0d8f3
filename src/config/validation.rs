//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All problems are collected
//! and returned together rather than stopping at the first one.

use crate::config::schema::UploaderConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration.
pub fn validate_config(config: &UploaderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host", "must not be empty".to_string());
    }
    if config.gateway.port == 0 {
        fail("gateway.port", "must be greater than 0".to_string());
    }
    if !matches!(config.gateway.protocol.as_str(), "http" | "https") {
        fail(
            "gateway.protocol",
            format!("expected 'http' or 'https', got '{}'", config.gateway.protocol),
        );
    }
    if config.gateway.request_timeout_secs == 0 {
        fail("gateway.request_timeout_secs", "must be greater than 0".to_string());
    }
    if config.upload.poll_interval_ms == 0 {
        fail("upload.poll_interval_ms", "must be greater than 0".to_string());
    }
    if config.upload.confirm_timeout_secs == Some(0) {
        fail("upload.confirm_timeout_secs", "must be greater than 0 when set".to_string());
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.to_lowercase().as_str()) {
        fail(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
