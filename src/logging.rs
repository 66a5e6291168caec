//! Logging setup
//!
//! Engine code logs through the `log` facade. `init` installs a
//! `tracing_subscriber` formatter that also receives `log` records.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Safe to call multiple
/// times; only the first call has an effect, and an already installed
/// subscriber from the host application is left alone.
pub fn init(default_filter: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init();
    });
}
