use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "schoold=info";

/// Installs the stderr subscriber. stdout carries the protocol, so nothing
/// else may write there.
pub fn init(filter: Option<&str>) {
    let filter = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
