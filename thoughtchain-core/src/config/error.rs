//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A limit is outside its valid range.
    #[error("invalid {field} {value}: must be > 0")]
    InvalidLimit { field: &'static str, value: u64 },

    /// An explicitly requested config file does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    /// Empty configuration file.
    #[error("configuration file is empty")]
    EmptyConfigFile,

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    ParseError(#[from] serde_saphyr::Error),

    /// I/O error reading config file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidLimit {
            field: "max_thoughts",
            value: 0,
        };
        assert_eq!(err.to_string(), "invalid max_thoughts 0: must be > 0");

        let err = ConfigError::ConfigFileNotFound {
            path: PathBuf::from("/nope/thoughtchain.yaml"),
        };
        assert_eq!(
            err.to_string(),
            "configuration file not found: /nope/thoughtchain.yaml"
        );
    }
}
