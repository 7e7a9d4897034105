// src/engine/mod.rs

//! Orchestration engine for calcdag.
//!
//! The scheduler store is passive: it only changes state when called. The
//! [`runtime`] here supplies the callers that keep it moving in a standalone
//! process, namely the lease monitor ticking on its interval and the worker
//! pool polling for tasks.

pub mod runtime;

pub use runtime::Runtime;
