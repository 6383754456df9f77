//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "NOMAD";

/// Config file name
const CONFIG_FILE_NAME: &str = "nomad.toml";

/// Per-user config directory name
const APP_DIR_NAME: &str = "nomad-driver";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "NOMAD_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `NOMAD_CONFIG` environment variable (explicit path)
    /// 2. `./nomad.toml` (current directory)
    /// 3. `~/.config/nomad-driver/nomad.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\nomad-driver\nomad.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables override any file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Places a config file may live, highest priority first.
fn candidate_paths() -> Vec<PathBuf> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let local = Some(PathBuf::from(CONFIG_FILE_NAME));
    let per_user = user_config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));

    [explicit, local, per_user].into_iter().flatten().collect()
}

/// First candidate that exists on disk.
fn resolve_config_path() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|path| path.is_file())
}

#[cfg(target_os = "windows")]
fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(not(target_os = "windows"))]
fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Read and parse `NOMAD_<suffix>` if it is set.
fn env_value<T: FromStr>(suffix: &str, message: &str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, suffix);
    match std::env::var(&var) {
        Ok(val) => match val.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::env(var, val, message)),
        },
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `NOMAD_<SECTION>_<KEY>`
/// For example:
/// - `NOMAD_SERIAL_PORT=/dev/ttyACM0`
/// - `NOMAD_POLL_INTERVAL_MS=100`
/// - `NOMAD_LOG_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(port) = env_value::<String>("SERIAL_PORT", "expected a port name")? {
        config.serial.port = Some(port);
    }
    if let Some(baud) = env_value::<u32>("SERIAL_BAUD", "expected an integer")? {
        config.serial.baud = baud;
    }
    if let Some(timeout) = env_value::<u64>("SERIAL_TIMEOUT_MS", "expected milliseconds")? {
        config.serial.timeout_ms = timeout;
    }
    if let Some(reads) = env_value::<usize>("PROTOCOL_MAX_REPLY_READS", "expected a count")? {
        config.protocol.max_reply_reads = reads;
    }
    if let Some(tries) = env_value::<usize>("POLL_MAX_TRIES", "expected a count")? {
        config.polling.max_tries = tries;
    }
    if let Some(interval) = env_value::<u64>("POLL_INTERVAL_MS", "expected milliseconds")? {
        config.polling.interval_ms = interval;
    }
    if let Some(level) = env_value::<String>("LOG_LEVEL", "expected a filter directive")? {
        config.logging.level = level;
    }

    Ok(())
}
