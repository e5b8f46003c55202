//! Tracing subscriber setup shared by the binaries and the test suite.

#[cfg(test)]
use once_cell::sync::Lazy;

/// Install the test subscriber once per process; safe to call from every
/// test that wants `RUST_LOG` control (e.g. `RUST_LOG=rustyook48::beacon=debug`).
#[cfg(test)]
pub fn init_test_tracing() {
    static TRACING: Lazy<()> = Lazy::new(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("rustyook48=warn"));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_test_writer()
            .init();
    });

    Lazy::force(&TRACING);
}

/// Subscriber for the offline binaries; `RUST_LOG` overrides the default
/// info level.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rustyook48=info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
