//! Logging setup for binaries and examples.
//!
//! Every routine reports progress through `tracing`: start and termination
//! events at `INFO` when its `verbose` flag is set and at `DEBUG` otherwise,
//! inner line-search and CG steps at `TRACE`. This module installs a
//! `tracing-subscriber` formatter that prints them.

use tracing::Level;

/// Initialize the tracing subscriber with the default INFO level
///
/// The level can be overridden with the `RUST_LOG` environment variable.
/// Does nothing if a global subscriber is already installed.
///
/// # Example
/// ```no_run
/// use descentopt::init_logger;
///
/// fn main() {
///     init_logger();
///     tracing::info!("Application started");
/// }
/// ```
///
/// # Environment Variables
/// ```bash
/// RUST_LOG=debug cargo run --example course_checks
/// RUST_LOG=descentopt_core=trace cargo run --example course_checks
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// # Arguments
/// * `default_level` - The default log level (overrideable via RUST_LOG)
pub fn init_logger_with_level(default_level: Level) {
    use tracing_subscriber::fmt::time::SystemTime;

    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_timer(SystemTime)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();

    if installed.is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}
