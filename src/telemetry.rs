//! Logging setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used. Calling this
/// more than once is harmless, which lets tests share it.
pub fn init_tracing(default_filter: &str) {
    static INIT_TELEMETRY: Once = Once::new();
    INIT_TELEMETRY.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // Another subscriber may already be installed (e.g. by a test harness).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_tracing("debug");
        init_tracing("not a [valid filter");
        tracing::debug!("still logging");
    }
}
