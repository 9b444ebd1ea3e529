//! Diagnostic logging for the runner itself.
//!
//! Events go to stderr so they never interleave with the status line and the
//! report on stdout. Filtering is read from `SPECLINE_LOG` and defaults to
//! `warn`.
//!
//! ```bash
//! SPECLINE_LOG=specline=debug cargo test --test my_specs
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "SPECLINE_LOG";

/// Install the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
