use tracing_subscriber::EnvFilter;

pub(crate) const DEFAULT_LOG_FILTER: &str = "warn,gl=info";

/// Installs the stderr subscriber. `RUST_LOG` overrides the default filter.
pub(crate) fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
