//! Tracing subscriber setup
//!
//! Logs always go to stderr so stdout carries nothing but blob content.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}
