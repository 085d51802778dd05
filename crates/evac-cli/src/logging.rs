//! Subscriber setup.  Logs go to stderr so stdout carries only JSON output.

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use crate::config::LoggingConfig;

/// Install the global subscriber.  `RUST_LOG` wins over `config.level`.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(io::stderr);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
