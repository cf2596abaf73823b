//! Engine limits and their default values.

use std::time::Duration;
use tracing::warn;

use super::error::ConfigError;

/// Default maximum thought length, in characters.
pub const DEFAULT_MAX_THOUGHT_LENGTH: usize = 50_000;

/// Default step-count cap.
pub const DEFAULT_MAX_THOUGHTS: u32 = 1_000;

/// Environment variable overriding [`EngineConfig::max_thought_length`].
pub const ENV_MAX_THOUGHT_LENGTH: &str = "THOUGHTCHAIN_MAX_THOUGHT_LENGTH";

/// Environment variable overriding [`EngineConfig::max_thoughts`].
pub const ENV_MAX_THOUGHTS: &str = "THOUGHTCHAIN_MAX_THOUGHTS";

/// Environment variable overriding [`EngineConfig::operation_timeout`], in seconds.
/// `0` disables the timeout.
pub const ENV_TIMEOUT_SECS: &str = "THOUGHTCHAIN_TIMEOUT_SECS";

/// Limits consumed by the reasoning engine and the stdio server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum length of a thought's text, in characters.
    pub max_thought_length: usize,

    /// Highest `thought_number` accepted before the chain is aborted.
    pub max_thoughts: u32,

    /// Upper bound on how long a call may wait to acquire the engine.
    /// `None` waits indefinitely. Processing itself is never interrupted,
    /// and the stdio server handles requests one at a time, so the bound
    /// only matters when several callers share one engine.
    pub operation_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_thought_length: DEFAULT_MAX_THOUGHT_LENGTH,
            max_thoughts: DEFAULT_MAX_THOUGHTS,
            operation_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    ///
    /// # Environment Variables
    /// - `THOUGHTCHAIN_MAX_THOUGHT_LENGTH`
    /// - `THOUGHTCHAIN_MAX_THOUGHTS`
    /// - `THOUGHTCHAIN_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`.
    ///
    /// Unparseable values are logged and ignored, keeping the current value.
    pub fn with_env_overrides(self) -> Self {
        Self {
            max_thought_length: parse_env_warn(ENV_MAX_THOUGHT_LENGTH)
                .unwrap_or(self.max_thought_length),
            max_thoughts: parse_env_warn(ENV_MAX_THOUGHTS).unwrap_or(self.max_thoughts),
            operation_timeout: match parse_env_warn::<u64>(ENV_TIMEOUT_SECS) {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => self.operation_timeout,
            },
        }
    }

    /// Validate the limits.
    ///
    /// # Invariants
    /// 1. `max_thought_length` > 0
    /// 2. `max_thoughts` > 0
    /// 3. `operation_timeout`, when set, is non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_thought_length == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_thought_length",
                value: 0,
            });
        }
        if self.max_thoughts == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_thoughts",
                value: 0,
            });
        }
        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidLimit {
                field: "timeout",
                value: 0,
            });
        }
        Ok(())
    }
}

/// Parse an environment variable, warning on invalid values.
///
/// Returns `None` when the variable is unset or does not parse.
fn parse_env_warn<T: std::str::FromStr>(name: &str) -> Option<T> {
    let val = std::env::var(name).ok()?;
    match val.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(
                env_var = name,
                value = %val,
                "Invalid value for environment variable, keeping current setting"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching these variables are #[serial].
        unsafe {
            std::env::remove_var(ENV_MAX_THOUGHT_LENGTH);
            std::env::remove_var(ENV_MAX_THOUGHTS);
            std::env::remove_var(ENV_TIMEOUT_SECS);
        }
    }

    #[test]
    fn test_defaults() {
        let defaults = EngineConfig::default();
        assert_eq!(defaults.max_thought_length, 50_000);
        assert_eq!(defaults.max_thoughts, 1_000);
        assert_eq!(defaults.operation_timeout, None);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let cfg = EngineConfig {
            max_thoughts: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidLimit {
                field: "max_thoughts",
                ..
            })
        ));

        let cfg = EngineConfig {
            max_thought_length: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = EngineConfig {
            operation_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        // SAFETY: serialised with the other env tests.
        unsafe {
            std::env::set_var(ENV_MAX_THOUGHTS, "25");
            std::env::set_var(ENV_TIMEOUT_SECS, "3");
        }
        let cfg = EngineConfig::from_env();
        clear_env();

        assert_eq!(cfg.max_thoughts, 25);
        assert_eq!(cfg.max_thought_length, DEFAULT_MAX_THOUGHT_LENGTH);
        assert_eq!(cfg.operation_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    #[serial]
    fn test_env_invalid_value_keeps_previous() {
        clear_env();
        // SAFETY: serialised with the other env tests.
        unsafe {
            std::env::set_var(ENV_MAX_THOUGHTS, "lots");
        }
        let base = EngineConfig {
            max_thoughts: 42,
            ..Default::default()
        };
        let cfg = base.with_env_overrides();
        clear_env();

        assert_eq!(cfg.max_thoughts, 42);
    }

    #[test]
    #[serial]
    fn test_env_zero_timeout_disables() {
        clear_env();
        // SAFETY: serialised with the other env tests.
        unsafe {
            std::env::set_var(ENV_TIMEOUT_SECS, "0");
        }
        let base = EngineConfig {
            operation_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let cfg = base.with_env_overrides();
        clear_env();

        assert_eq!(cfg.operation_timeout, None);
    }

    #[test]
    #[serial]
    fn test_unset_env_preserves_subsecond_timeout() {
        clear_env();
        let base = EngineConfig {
            operation_timeout: Some(Duration::from_millis(500)),
            ..Default::default()
        };
        let cfg = base.with_env_overrides();
        assert_eq!(cfg.operation_timeout, Some(Duration::from_millis(500)));
    }
}
