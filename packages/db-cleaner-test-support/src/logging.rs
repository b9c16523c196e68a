//! Tracing for test binaries.
//!
//! Quiet by default. Set `DB_CLEANER_TEST_LOG` (or the generic `TEST_LOG`,
//! then `RUST_LOG`) to an `EnvFilter` directive to see what a cleaner
//! issues, e.g. `DB_CLEANER_TEST_LOG=db_cleaner=trace`.

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

const FILTER_VARS: &[&str] = &["DB_CLEANER_TEST_LOG", "TEST_LOG", "RUST_LOG"];
const DEFAULT_FILTER: &str = "warn";

static SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    // Another harness may already own the global subscriber.
    let _ = fmt()
        .with_env_filter(filter())
        .with_test_writer()
        .without_time()
        .with_target(true)
        .try_init();
});

/// Install the test subscriber once per process. Later calls do nothing.
pub fn init() {
    Lazy::force(&SUBSCRIBER);
}

fn filter() -> EnvFilter {
    FILTER_VARS
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
