// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::Operation;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [timing]
/// addition_ms = 100
/// subtraction_ms = 100
/// multiplication_ms = 200
/// division_ms = 200
///
/// [scheduler]
/// max_retries = 3
/// lease_check_interval_ms = 100
/// lease_grace_ms = 0
///
/// [worker]
/// computing_power = 2
/// poll_interval_ms = 50
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub worker: WorkerSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub timing: TimingSection,
    pub scheduler: SchedulerSection,
    pub worker: WorkerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        timing: TimingSection,
        scheduler: SchedulerSection,
        worker: WorkerSection,
    ) -> Self {
        Self {
            timing,
            scheduler,
            worker,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.timing, raw.scheduler, raw.worker)
    }
}

/// `[timing]` section: how long a worker is expected to spend on each
/// operation kind. Sizes the lease deadline of every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingSection {
    #[serde(default = "default_additive_ms")]
    pub addition_ms: u64,

    #[serde(default = "default_additive_ms")]
    pub subtraction_ms: u64,

    #[serde(default = "default_multiplicative_ms")]
    pub multiplication_ms: u64,

    #[serde(default = "default_multiplicative_ms")]
    pub division_ms: u64,
}

fn default_additive_ms() -> u64 {
    100
}

fn default_multiplicative_ms() -> u64 {
    200
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            addition_ms: default_additive_ms(),
            subtraction_ms: default_additive_ms(),
            multiplication_ms: default_multiplicative_ms(),
            division_ms: default_multiplicative_ms(),
        }
    }
}

impl TimingSection {
    /// Same budget for every operation kind.
    pub fn uniform(ms: u64) -> Self {
        Self {
            addition_ms: ms,
            subtraction_ms: ms,
            multiplication_ms: ms,
            division_ms: ms,
        }
    }

    pub fn operation_time(&self, op: Operation) -> Duration {
        let ms = match op {
            Operation::Add => self.addition_ms,
            Operation::Subtract => self.subtraction_ms,
            Operation::Multiply => self.multiplication_ms,
            Operation::Divide => self.division_ms,
        };
        Duration::from_millis(ms)
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SchedulerSection {
    /// How many lease expiries a task survives. The expiry after the last
    /// retry fails the expression with a timeout.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Tick period of the lease monitor.
    #[serde(default = "default_lease_check_interval_ms")]
    pub lease_check_interval_ms: u64,

    /// Optional slack added on top of the operation time when computing a
    /// lease deadline. The default of zero makes the deadline exactly
    /// `now + operation_time`.
    #[serde(default = "default_lease_grace_ms")]
    pub lease_grace_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_lease_check_interval_ms() -> u64 {
    100
}

fn default_lease_grace_ms() -> u64 {
    0
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            lease_check_interval_ms: default_lease_check_interval_ms(),
            lease_grace_ms: default_lease_grace_ms(),
        }
    }
}

impl SchedulerSection {
    pub fn lease_check_interval(&self) -> Duration {
        Duration::from_millis(self.lease_check_interval_ms)
    }

    pub fn lease_grace(&self) -> Duration {
        Duration::from_millis(self.lease_grace_ms)
    }
}

/// `[worker]` section for the in-process worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkerSection {
    /// Number of concurrent workers.
    #[serde(default = "default_computing_power")]
    pub computing_power: usize,

    /// Back-off between polls when the ready queue is empty.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_computing_power() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            computing_power: default_computing_power(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WorkerSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
