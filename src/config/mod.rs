//! Configuration module for nomad-driver.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `NOMAD_CONFIG` environment variable (explicit path)
//! 2. `./nomad.toml` (current directory)
//! 3. `~/.config/nomad-driver/nomad.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\nomad-driver\nomad.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! `NOMAD_SERIAL_PORT`, `NOMAD_SERIAL_BAUD`, `NOMAD_SERIAL_TIMEOUT_MS`,
//! `NOMAD_PROTOCOL_MAX_REPLY_READS`, `NOMAD_POLL_MAX_TRIES`,
//! `NOMAD_POLL_INTERVAL_MS`, `NOMAD_LOG_LEVEL`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! timeout_ms = 2000
//! parity = "none"
//!
//! [protocol]
//! max_reply_reads = 50
//! ack_matching = "contains"
//!
//! [polling]
//! max_tries = 50
//! interval_ms = 300
//! on_exhausted = "assume_stopped"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    Config, HandshakeSection, LogFormat, LoggingConfig, PollingConfig, ProtocolConfig,
    SerialConfig,
};
