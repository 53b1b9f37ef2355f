use anyhow::Error;
use tracing::span::Span;

pub trait LogError {
    fn log_error(&self, error: Error);
}

impl LogError for Span {
    fn log_error(&self, error: Error) {
        self.in_scope(|| {
            tracing::error!("Error: {error:?}");
        });
    }
}

/// Installs the global `tracing` subscriber. The filter is read from `RUST_LOG`, defaulting to
/// `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
