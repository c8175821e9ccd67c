//! Logging Infrastructure
//!
//! Subscriber setup for the embedding process. Library code only emits
//! `tracing` events; whoever hosts the service decides where they go.

use tracing_subscriber::EnvFilter;

/// Initialize the logger with the default level
pub fn init_logger() {
    init_logger_with_level(None);
}

/// Initialize the logger, honoring `RUST_LOG` over the given fallback level
pub fn init_logger_with_level(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .init();
}
