//! Upload metrics.
//!
//! # Metrics
//! - `uploader_commits_total` (counter): commits by `outcome` (ok, error)
//! - `uploader_confirmation_polls_total` (counter): receipt lookups issued
//! - `uploader_confirmations_total` (counter): poll loops by `outcome`
//!   (confirmed, error, cancelled)

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn record_commit(ok: bool) {
    if enabled() {
        let outcome = if ok { "ok" } else { "error" };
        metrics::counter!("uploader_commits_total", "outcome" => outcome).increment(1);
    }
}

pub fn record_confirmation_poll() {
    if enabled() {
        metrics::counter!("uploader_confirmation_polls_total").increment(1);
    }
}

pub fn record_confirmation(outcome: &'static str) {
    if enabled() {
        metrics::counter!("uploader_confirmations_total", "outcome" => outcome).increment(1);
    }
}
