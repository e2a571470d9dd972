//! Logging setup for programs that drive resource updates.
//!
//! Updates log through `tracing`: one span per update carrying the resource
//! type, an `info` event with the outgoing update mask, `warn` on every
//! retried failure and `error` when an update gives up. Change detection
//! logs each changed attribute path at `debug`, never its values.
//!
//! Output goes to **stderr**, leaving stdout to the plugin protocol of the
//! host process.
//!
//! # Quick Start
//!
//! ```no_run
//! use yc_update_mask::init_logging;
//!
//! init_logging();
//! tracing::info!("Provider starting");
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `yc_update_mask=debug`)
//!
//! ```bash
//! # Show every changed attribute and every retry
//! RUST_LOG=yc_update_mask=debug ./my-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the default logging subscriber.
///
/// Reads `RUST_LOG`, defaulting to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level, used when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
///
/// # Example
///
/// ```no_run
/// yc_update_mask::init_logging_with_default("yc_update_mask=debug,warn");
/// ```
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`], this does not panic when a subscriber is
/// already set, which makes it safe to call from tests.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

/// The filter from `RUST_LOG`, or `default_level` when it is unset or
/// unparsable.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}
