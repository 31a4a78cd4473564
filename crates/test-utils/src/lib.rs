//! Shared helpers for deckbuild's integration and property tests.
//!
//! - [`fake_task`]: in-memory task graphs for exercising the engine alone.
//! - [`fake_runner`]: a stand-in for the converter and merge tools.
//! - [`pptx_fixture`]: tiny but valid `.pptx` decks.
//! - [`builders`]: config and pipeline environment builders.

pub mod builders;
pub mod fake_runner;
pub mod fake_task;
pub mod pptx_fixture;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use deckbuild::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

/// Upper bound for a single engine pass in tests.
pub const PASS_TIMEOUT: Duration = Duration::from_secs(10);

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and only shown for failing tests.
/// The filter comes from `RUST_LOG`, then `DECKBUILD_LOG`, then `warn`:
/// `RUST_LOG=deckbuild=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`PASS_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(PASS_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test timed out after {PASS_TIMEOUT:?}"),
    }
}
