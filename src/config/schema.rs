//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the keys
//! it wants to change.

use super::error::{ConfigError, ConfigResult};
use crate::machine::MachineConfig;
use crate::port::{DataBits, FlowControl, Parity, PortConfiguration, StopBits};
use crate::protocol::{
    AckMatching, DriverConfig, ExhaustedPolicy, HandshakeConfig, PollConfig,
    DEFAULT_MAX_REPLY_READS, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_TRIES,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial transport
    pub serial: SerialConfig,
    /// Command/acknowledge protocol
    pub protocol: ProtocolConfig,
    /// Wait-until-stopped polling
    pub polling: PollingConfig,
    /// Startup banner handling
    pub handshake: HandshakeSection,
    /// Log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values the driver cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud == 0 {
            return Err(ConfigError::invalid("serial.baud", "must be greater than 0"));
        }
        if self.protocol.max_reply_reads == 0 {
            return Err(ConfigError::invalid(
                "protocol.max_reply_reads",
                "must be at least 1",
            ));
        }
        if self.polling.max_tries == 0 {
            return Err(ConfigError::invalid("polling.max_tries", "must be at least 1"));
        }
        Ok(())
    }

    /// Runtime configuration for [`Machine`](crate::machine::Machine).
    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            port: PortConfiguration {
                baud_rate: self.serial.baud,
                data_bits: self.serial.data_bits,
                flow_control: self.serial.flow_control,
                parity: self.serial.parity,
                stop_bits: self.serial.stop_bits,
                timeout: self.serial.timeout(),
            },
            driver: DriverConfig {
                max_reply_reads: self.protocol.max_reply_reads,
                ack_matching: self.protocol.ack_matching,
                poll: PollConfig {
                    max_tries: self.polling.max_tries,
                    interval: self.polling.interval(),
                    on_exhausted: self.polling.on_exhausted,
                },
                handshake: HandshakeConfig {
                    validate_banner: self.handshake.validate_banner,
                },
            },
        }
    }
}

/// Serial transport section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name or alias; the CLI's `--port` wins over this
    pub port: Option<String>,
    /// Baud rate
    pub baud: u32,
    /// "seven" or "eight"
    pub data_bits: DataBits,
    /// "none", "software" or "hardware"
    pub flow_control: FlowControl,
    /// "none", "odd" or "even"
    pub parity: Parity,
    /// "one" or "two"
    pub stop_bits: StopBits,
    /// Per-line read timeout in milliseconds
    pub timeout_ms: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let port = PortConfiguration::default();
        Self {
            port: None,
            baud: port.baud_rate,
            data_bits: port.data_bits,
            flow_control: port.flow_control,
            parity: port.parity,
            stop_bits: port.stop_bits,
            timeout_ms: port.timeout.as_millis() as u64,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the read timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Protocol section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Reply lines read before giving up on `ok`/`error`
    pub max_reply_reads: usize,
    /// "contains" or "strict"
    pub ack_matching: AckMatching,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_reply_reads: DEFAULT_MAX_REPLY_READS,
            ack_matching: AckMatching::default(),
        }
    }
}

/// Polling section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub max_tries: usize,
    pub interval_ms: u64,
    /// "assume_stopped" or "fail"
    pub on_exhausted: ExhaustedPolicy,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_POLL_MAX_TRIES,
            interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            on_exhausted: ExhaustedPolicy::default(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Handshake section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeSection {
    pub validate_banner: bool,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "pretty" or "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line with colors
    #[default]
    Pretty,
    /// Single line per event
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.baud, 115_200);
        assert_eq!(config.serial.timeout_ms, 2000);
        assert_eq!(config.protocol.max_reply_reads, 50);
        assert_eq!(config.polling.max_tries, 50);
        assert_eq!(config.polling.interval_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_alias_resolution() {
        let mut config = SerialConfig::default();
        config
            .port_aliases
            .insert("nomad".to_string(), "COM23".to_string());

        assert_eq!(config.resolve_port("nomad"), "COM23");
        assert_eq!(config.resolve_port("/dev/ttyACM0"), "/dev/ttyACM0");
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [protocol]
            ack_matching = "strict"

            [polling]
            interval_ms = 0
            on_exhausted = "fail"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.protocol.ack_matching, AckMatching::Strict);
        assert_eq!(config.polling.on_exhausted, ExhaustedPolicy::Fail);
        // Untouched keys keep their defaults
        assert_eq!(config.protocol.max_reply_reads, 50);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_line_settings_reach_the_port() {
        let toml_str = r#"
            [serial]
            data_bits = "seven"
            parity = "even"
            stop_bits = "two"
            flow_control = "hardware"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        let port = config.machine_config().port;
        assert_eq!(port.data_bits, DataBits::Seven);
        assert_eq!(port.parity, Parity::Even);
        assert_eq!(port.stop_bits, StopBits::Two);
        assert_eq!(port.flow_control, FlowControl::Hardware);
        assert_eq!(port.baud_rate, 115_200);
    }

    #[test]
    fn test_machine_config_conversion() {
        let mut config = Config::default();
        config.serial.timeout_ms = 500;
        config.polling.max_tries = 7;
        config.handshake.validate_banner = true;

        let machine = config.machine_config();
        assert_eq!(machine.port.timeout, Duration::from_millis(500));
        assert_eq!(machine.driver.poll.max_tries, 7);
        assert!(machine.driver.handshake.validate_banner);
    }

    #[test]
    fn test_validation_rejects_zero_budgets() {
        let mut config = Config::default();
        config.protocol.max_reply_reads = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "protocol.max_reply_reads"
        ));
    }
}
