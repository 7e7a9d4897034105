// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CalcError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.timing, raw.scheduler, raw.worker))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_worker(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    // Timings and max_retries are unsigned; any value is acceptable.
    if cfg.scheduler.lease_check_interval_ms == 0 {
        return Err(CalcError::ConfigError(
            "[scheduler].lease_check_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_worker(cfg: &RawConfigFile) -> Result<()> {
    if cfg.worker.computing_power == 0 {
        return Err(CalcError::ConfigError(
            "[worker].computing_power must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.worker.poll_interval_ms == 0 {
        return Err(CalcError::ConfigError(
            "[worker].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
