//! Tracing subscriber setup.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`; later
/// calls are ignored.
pub fn init_tracing(verbose: bool, json: bool) {
    INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "info" };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let registry = tracing_subscriber::registry().with(env_filter);

        if json {
            registry
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    });
}
