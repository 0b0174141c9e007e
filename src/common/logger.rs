use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::LocalTime},
    prelude::*,
};

use crate::configs::LoggingConfig;

/// Builds the filter directive from the configured level and extra filters.
pub fn filter_directive(logging: Option<&LoggingConfig>) -> String {
    let log_level = logging
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    let filters = logging
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    if filters.is_empty() {
        log_level.to_string()
    } else {
        format!("{},{}", log_level, filters)
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over config.
pub fn init(logging: Option<&LoggingConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(logging)));

    let stdout_layer = fmt::layer()
        .with_timer(LocalTime::rfc_3339())
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}
