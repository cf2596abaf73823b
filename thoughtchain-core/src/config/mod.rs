//! Engine configuration: defaults, environment overrides and the optional
//! YAML config file.
//!
//! Resolution order, later sources winning: built-in defaults, config file,
//! environment variables. The CLI layers its own flags on top.

pub mod defaults;
pub mod duration_format;
pub mod error;
pub mod loader;

pub use defaults::EngineConfig;
pub use error::ConfigError;
pub use loader::{ConfigFile, LimitsSection, find_config_file, load_config_file, resolve_config};
