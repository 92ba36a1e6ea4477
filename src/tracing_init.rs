//! Tracing initialization for tests and binaries
//!
//! Every synchronization stage runs inside an `#[instrument]` span
//! (`correct_frequency`, `correct_phase`, `estimate_clock`, `schedule`,
//! `synchronize`). Binaries log those spans as they close, so one run of
//! `iqsync` with `RUST_LOG=iqsync=info` shows how long each stage took on the
//! capture.
//!
//! Useful `RUST_LOG` settings:
//! - `iqsync=debug` - per-stage estimates (regression, crossings, grid origin)
//! - `iqsync::sync::timing=debug` - decision grid only
//! - `iqsync=info,iqsync::acquire=debug` - block-by-block acquisition

use once_cell::sync::Lazy;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used by binaries when `RUST_LOG` is unset
pub const BINARY_FILTER: &str = "iqsync=info";

/// Filter used by tests when `RUST_LOG` is unset: only eye-mask violations
/// and other warnings
pub const TEST_FILTER: &str = "iqsync=warn";

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing for unit and integration tests
///
/// Multiple calls are safe (uses once_cell); a subscriber installed elsewhere
/// is left in place.
pub fn init_test_tracing() {
    static TRACING: Lazy<()> = Lazy::new(|| {
        let _ = fmt()
            .with_env_filter(env_filter(TEST_FILTER))
            .with_target(true)
            .with_line_number(true)
            .with_test_writer()
            .try_init();
    });

    Lazy::force(&TRACING);
}

/// Initialize tracing for binaries; call early in main()
///
/// Stage spans are reported on close with their busy/idle time.
pub fn init_tracing() {
    fmt()
        .with_env_filter(env_filter(BINARY_FILTER))
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_line_number(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        assert!(EnvFilter::try_new(BINARY_FILTER).is_ok());
        assert!(EnvFilter::try_new(TEST_FILTER).is_ok());
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::warn!(target: "iqsync::tracing_init", "visible under the test filter");
    }
}
