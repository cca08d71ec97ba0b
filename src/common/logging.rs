//! Structured logging setup
//!
//! Workers log through `tracing`; applications embedding the coordinators
//! install a subscriber once, usually at startup.

use crate::common::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `config.log_level`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(config: &Config) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
