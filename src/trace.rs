//! Tracing infrastructure for the benchmark binaries.

/// Initialize the tracing subscriber.
///
/// Call this at the start of each binary. Diagnostics go to stderr so that
/// stdout carries nothing but the periodic report lines; the filter
/// defaults to `synthbench=info` and honors `RUST_LOG`.
pub fn init() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("synthbench=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
