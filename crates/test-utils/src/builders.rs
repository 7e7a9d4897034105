#![allow(dead_code)]

use calcdag::config::{
    ConfigFile, RawConfigFile, SchedulerSection, TimingSection, WorkerSection,
};
use calcdag::types::Operation;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Defaults are tuned for tests rather than production: zero operation
/// times, no lease grace, and short monitor/poll intervals.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                timing: TimingSection::uniform(0),
                scheduler: SchedulerSection {
                    max_retries: 3,
                    lease_check_interval_ms: 10,
                    lease_grace_ms: 0,
                },
                worker: WorkerSection {
                    computing_power: 2,
                    poll_interval_ms: 5,
                },
            },
        }
    }

    pub fn with_operation_time(mut self, op: Operation, ms: u64) -> Self {
        match op {
            Operation::Add => self.config.timing.addition_ms = ms,
            Operation::Subtract => self.config.timing.subtraction_ms = ms,
            Operation::Multiply => self.config.timing.multiplication_ms = ms,
            Operation::Divide => self.config.timing.division_ms = ms,
        }
        self
    }

    pub fn with_uniform_operation_time(mut self, ms: u64) -> Self {
        self.config.timing = TimingSection::uniform(ms);
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.config.scheduler.max_retries = n;
        self
    }

    pub fn with_lease_grace_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.lease_grace_ms = ms;
        self
    }

    pub fn with_lease_check_interval_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.lease_check_interval_ms = ms;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.config.worker.computing_power = n;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.worker.poll_interval_ms = ms;
        self
    }

    /// The unvalidated config, for tests that exercise validation.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
