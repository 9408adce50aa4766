use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

const DEFAULT_LOG_FILTER: &str = "info";

/// Initialises the stdout tracer, filtered by `RUST_LOG` when it is set,
/// or at [DEFAULT_LOG_FILTER] otherwise.
/// # Error Modes
/// - Fails if a global subscriber has already been set.
pub(crate) fn init_tracer() -> anyhow::Result<()> {
    let stdout_tracer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    // This filter is applied to the stdout tracer
    let log_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber =
        tracing_subscriber::Registry::default().with(stdout_tracer.with_filter(log_filter));

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
