//! Log setup
//!
//! Terraform reads plugin logs from stderr. The level follows
//! `TF_LOG_PROVIDER`, then `TF_LOG`, and defaults to `info`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LEVEL: &str = "info";

/// Directive for the subscriber filter
pub fn filter_directive() -> String {
    ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|level| level.trim().to_lowercase())
        .find(|level| !level.is_empty())
        .map(|level| match level.as_str() {
            // Terraform's most verbose level; tracing has no equivalent
            "json" => "trace".to_string(),
            _ => level,
        })
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install the stderr subscriber. Safe to call more than once; only the
/// first call has any effect.
pub fn init() {
    let filter = EnvFilter::try_new(filter_directive())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
