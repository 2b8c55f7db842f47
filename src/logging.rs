use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "sim_timeline=info";
const VERBOSE_FILTER: &str = "sim_timeline=debug";

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Calling it twice is harmless; the second subscriber is dropped.
pub fn init(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
