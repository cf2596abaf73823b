//! Optional YAML configuration file.
//!
//! ```yaml
//! limits:
//!   max_thought_length: 20000
//!   max_thoughts: 200
//!   timeout: 30s
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::defaults::EngineConfig;
use super::duration_format;
use super::error::ConfigError;

/// Environment variable naming a config file when `--config` is not given.
pub const ENV_CONFIG_PATH: &str = "THOUGHTCHAIN_CONFIG";

/// Top-level config file document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Engine limits. Every key is optional.
    #[serde(default)]
    pub limits: LimitsSection,
}

/// The `limits:` section. Absent keys keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub max_thought_length: Option<usize>,
    pub max_thoughts: Option<u32>,
    #[serde(default, deserialize_with = "duration_format::deserialize_option")]
    pub timeout: Option<Duration>,
}

impl ConfigFile {
    /// Overlay the file's settings on `base`.
    pub fn apply(&self, base: EngineConfig) -> EngineConfig {
        EngineConfig {
            max_thought_length: self
                .limits
                .max_thought_length
                .unwrap_or(base.max_thought_length),
            max_thoughts: self.limits.max_thoughts.unwrap_or(base.max_thoughts),
            operation_timeout: self.limits.timeout.or(base.operation_timeout),
        }
    }
}

/// Locate the config file to load, if any.
///
/// An explicit path (CLI flag) must exist. Otherwise `THOUGHTCHAIN_CONFIG`
/// is consulted and must also exist when set. With neither, no file is
/// loaded and `Ok(None)` is returned.
pub fn find_config_file(explicit_path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let candidate = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
    };

    match candidate {
        Some(path) if path.exists() => Ok(Some(path)),
        Some(path) => Err(ConfigError::ConfigFileNotFound { path }),
        None => Ok(None),
    }
}

/// Read and parse a config file.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;

    if contents.trim().is_empty() {
        return Err(ConfigError::EmptyConfigFile);
    }

    let file: ConfigFile = serde_saphyr::from_str(&contents)?;
    Ok(file)
}

/// Resolve engine limits from defaults, the config file and the environment.
///
/// The result is not validated: callers layer their own overrides on top
/// and call [`EngineConfig::validate`] on the final value.
pub fn resolve_config(explicit_path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();

    if let Some(path) = find_config_file(explicit_path)? {
        let file = load_config_file(&path)?;
        tracing::debug!(path = %path.display(), limits = ?file.limits, "loaded config file");
        config = file.apply(config);
    }

    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_limits() {
        let file = write_config(
            "limits:\n  max_thought_length: 2000\n  max_thoughts: 12\n  timeout: 5s\n",
        );
        let cfg = load_config_file(file.path()).unwrap();
        assert_eq!(cfg.limits.max_thought_length, Some(2000));
        assert_eq!(cfg.limits.max_thoughts, Some(12));
        assert_eq!(cfg.limits.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_partial_limits_keep_base() {
        let file = write_config("limits:\n  max_thoughts: 7\n");
        let cfg = load_config_file(file.path()).unwrap();
        let merged = cfg.apply(EngineConfig::default());
        assert_eq!(merged.max_thoughts, 7);
        assert_eq!(
            merged.max_thought_length,
            EngineConfig::default().max_thought_length
        );
        assert_eq!(merged.operation_timeout, None);
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = write_config("   \n");
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyConfigFile));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("limits:\n  max_steps: 3\n");
        let err = load_config_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = find_config_file(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigFileNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_no_file_configured() {
        // SAFETY: serialised with the other env tests.
        unsafe {
            std::env::remove_var(ENV_CONFIG_PATH);
        }
        assert_eq!(find_config_file(None).unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_resolve_leaves_zero_cap_for_caller() {
        let file = write_config("limits:\n  max_thoughts: 0\n");
        let config = resolve_config(Some(file.path())).unwrap();
        assert_eq!(config.max_thoughts, 0);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidLimit {
                field: "max_thoughts",
                ..
            }
        ));
    }
}
