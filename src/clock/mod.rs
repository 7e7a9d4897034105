// src/clock/mod.rs

//! Time source abstraction.
//!
//! The store reads "now" through a [`Clock`] so that lease deadlines can be
//! driven by [`mock::MockClock`] in tests instead of real sleeps.

use std::fmt::Debug;
use std::time::Instant;

pub mod mock;

pub use mock::MockClock;

/// Monotonic time source.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Implementation backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
