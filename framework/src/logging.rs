//! Log output
//!
//! Everything in the crate logs through `tracing`. Call [`init`] once at
//! startup to print those events; `RUST_LOG` takes precedence over the
//! defaults.

use crate::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive when `RUST_LOG` is unset
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install a formatted subscriber filtered by `RUST_LOG`
///
/// Without `RUST_LOG` the level is `info`, or `debug` when `APP_DEBUG` is
/// enabled. Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(Config::is_debug())));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_ok()
}
