#![allow(dead_code)]

pub use calcdag_test_utils::builders;
pub use calcdag_test_utils::fake_worker;
pub use calcdag_test_utils::init_tracing;

use std::sync::Arc;

use calcdag::clock::MockClock;
use calcdag::config::ConfigFile;
use calcdag::store::SchedulerStore;

/// Store on a manually advanced clock, plus the handle that advances it.
pub fn store_with_mock_clock(cfg: &ConfigFile) -> (SchedulerStore, MockClock) {
    let clock = MockClock::new();
    let store = SchedulerStore::with_clock(cfg, Arc::new(clock.clone()));
    (store, clock)
}
