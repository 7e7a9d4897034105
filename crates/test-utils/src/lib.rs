pub mod builders;
pub mod fake_worker;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use calcdag::store::SchedulerStore;
use calcdag::types::ExpressionId;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test and only shown for failures (or with
/// `-- --nocapture`). The filter comes from `CALCDAG_LOG`, then `RUST_LOG`,
/// e.g. `CALCDAG_LOG=calcdag::store=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("CALCDAG_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("calcdag=info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Wait (bounded by [`with_timeout`]) until every listed expression is
/// `done` or `error`.
pub async fn wait_settled(store: &SchedulerStore, ids: &[ExpressionId]) {
    with_timeout(async {
        loop {
            let notified = store.settled_notified();
            if store.is_settled(ids) {
                break;
            }
            notified.await;
        }
    })
    .await
}
