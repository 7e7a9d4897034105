// src/exec/mod.rs

//! In-process workers.
//!
//! Workers play the agent side of the protocol: they poll for a leased task,
//! spend its operation time, compute the value and submit it.
//!
//! - [`broker`] provides the `TaskBroker` trait workers poll through, and its
//!   implementation for the scheduler store.
//! - [`worker`] holds the polling loop of a single worker.
//! - [`pool`] spawns a fixed number of workers sharing one shutdown signal.

pub mod broker;
pub mod pool;
pub mod worker;

pub use broker::TaskBroker;
pub use pool::spawn_workers;
pub use worker::{Worker, WorkerStats};
