//! Runtime configuration read from the environment.

use std::time::Duration;

use afterschool_core::retry::DEFAULT_RETRY_DELAY;

use crate::error::AppError;

/// Environment variable holding the retry delay in milliseconds.
pub const RETRY_DELAY_VAR: &str = "EVENT_RETRY_DELAY_MS";

/// Environment variable holding the shutdown drain timeout in milliseconds.
pub const DRAIN_TIMEOUT_VAR: &str = "EVENT_DRAIN_TIMEOUT_MS";

/// Default wait for in-flight deliveries on shutdown.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings of the composed platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Fixed delay before the single retry of a transient failure.
    pub retry_delay: Duration,
    /// How long shutdown waits for in-flight deliveries.
    pub drain_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but is not a whole
    /// number of milliseconds.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but is not a whole
    /// number of milliseconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            retry_delay: millis(&lookup, RETRY_DELAY_VAR)?.unwrap_or(defaults.retry_delay),
            drain_timeout: millis(&lookup, DRAIN_TIMEOUT_VAR)?.unwrap_or(defaults.drain_timeout),
        })
    }
}

fn millis<F>(lookup: &F, name: &str) -> Result<Option<Duration>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| AppError::Config(format!("{name} must be milliseconds: {e}")))
        })
        .transpose()
}
