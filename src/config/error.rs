//! Errors raised while resolving and reading `nomad.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("no configuration at {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed nomad.toml: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is unusable, e.g. a zero poll budget.
    #[error("{key}: {message}")]
    Invalid { key: String, message: String },

    /// A `NOMAD_*` override did not parse as the expected type.
    #[error("{var}={value:?}: {message}")]
    Env {
        var: String,
        value: String,
        message: String,
    },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env(var: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
