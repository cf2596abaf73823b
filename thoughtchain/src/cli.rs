//! CLI argument types for `thoughtchain serve` and `thoughtchain check-config`.
//!
//! Defined separately from `main.rs` so integration tests can parse them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use thoughtchain_core::config::{ConfigError, EngineConfig, resolve_config};

/// Limit overrides shared by every subcommand.
///
/// Flags win over environment variables, which win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct LimitArgs {
    /// YAML config file (defaults to $THOUGHTCHAIN_CONFIG when set).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum characters per thought.
    #[arg(long)]
    pub max_thought_length: Option<usize>,

    /// Highest thought_number accepted before the chain is aborted.
    #[arg(long)]
    pub max_thoughts: Option<u32>,

    /// Seconds a call may wait for the engine lock (0 disables). Requests are
    /// served one at a time, so this does not bound processing time.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl LimitArgs {
    /// Resolve the effective engine configuration.
    ///
    /// Validation runs once, after the flags are applied, so a flag can
    /// replace an invalid file or environment value.
    pub fn resolve(&self) -> Result<EngineConfig, ConfigError> {
        let base = resolve_config(self.config.as_deref())?;
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Overlay the flags on `base` without validating.
    pub fn apply(&self, base: EngineConfig) -> EngineConfig {
        EngineConfig {
            max_thought_length: self.max_thought_length.unwrap_or(base.max_thought_length),
            max_thoughts: self.max_thoughts.unwrap_or(base.max_thoughts),
            operation_timeout: match self.timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => base.operation_timeout,
            },
        }
    }
}

/// Arguments for `thoughtchain serve`.
///
/// Runs the stdio server until stdin closes.
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub limits: LimitArgs,

    /// Enable debug logging on stderr.
    #[arg(long)]
    pub verbose: bool,
}

/// Arguments for `thoughtchain check-config`.
///
/// Resolves and prints the effective limits, then exits.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub limits: LimitArgs,
}
