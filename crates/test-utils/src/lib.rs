//! Shared fixtures for the runner's integration tests.

pub mod buffer;
pub mod builders;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Longest a single supervised run may take inside a test.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(10);

static TRACING: Once = Once::new();

/// Route runner diagnostics into the test harness's captured output.
/// `RUST_LOG` picks the level; `info` otherwise.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Fail the test instead of hanging when a child never exits.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(RUN_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("supervised run did not finish within {RUN_TIMEOUT:?}"))
}
