use tracing_subscriber::{EnvFilter, fmt};

/// Initialise logging to stderr.
///
/// `RUST_LOG` overrides the default filter of `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
