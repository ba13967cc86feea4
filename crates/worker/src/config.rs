//! Worker configuration loaded from environment variables.

use std::time::Duration;

use modbot_core::error::CoreError;

/// Runtime knobs for the worker process.
///
/// | Env Var               | Default | Meaning                            |
/// |-----------------------|---------|------------------------------------|
/// | `WORKER_CONCURRENCY`  | `4`     | Max tasks executed in parallel     |
/// | `POLL_INTERVAL_MS`    | `1000`  | Queue polling interval             |
/// | `SWEEP_INTERVAL_SECS` | `900`   | Retry-sweeper interval             |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub sweep_interval: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        let concurrency: usize = std::env::var("WORKER_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .map_err(|_| CoreError::Validation("WORKER_CONCURRENCY must be a valid usize".into()))?;

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .map_err(|_| CoreError::Validation("POLL_INTERVAL_MS must be a valid u64".into()))?;

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .map_err(|_| CoreError::Validation("SWEEP_INTERVAL_SECS must be a valid u64".into()))?;

        Ok(Self {
            concurrency: concurrency.max(1),
            poll_interval: Duration::from_millis(poll_interval_ms),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
        })
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(900),
        }
    }
}
