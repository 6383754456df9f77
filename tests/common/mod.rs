//! Shared test utilities for driver tests.
//!
//! This module provides common test infrastructure including:
//! - Scripted mock channels with the controller's startup greeting
//! - Drivers and machines wired to those mocks
//! - Configurations with polling delays removed

#![allow(dead_code)]

use nomad_driver::machine::{Machine, MachineConfig};
use nomad_driver::port::MockLineChannel;
use nomad_driver::protocol::{Driver, DriverConfig, PollConfig};
use std::time::Duration;

/// The two lines a controller prints after reset.
pub const GREETING: [&str; 2] = ["", "Grbl 1.1f ['$' for help]"];

/// Driver configuration with no sleep between status polls.
pub fn fast_config() -> DriverConfig {
    DriverConfig {
        poll: PollConfig {
            interval: Duration::ZERO,
            ..PollConfig::default()
        },
        ..DriverConfig::default()
    }
}

/// Create a mock channel with pre-programmed command replies.
///
/// Each entry is the batch of lines released after one command write.
///
/// # Example
/// ```ignore
/// let mock = mock_with_replies(vec![vec!["ok"], vec!["[MSG:..]", "ok"]]);
/// ```
pub fn mock_with_replies(replies: Vec<Vec<&str>>) -> MockLineChannel {
    let mut mock = MockLineChannel::new("MOCK0");
    for batch in replies {
        mock.script_reply(&batch);
    }
    mock
}

/// A driver over a clone of `channel`; the caller keeps the original for inspection.
pub fn driver_over(channel: &MockLineChannel, config: DriverConfig) -> Driver<MockLineChannel> {
    Driver::new(channel.clone(), config)
}

/// A connected machine over a clone of `channel`, greeting already consumed.
pub fn machine_over(channel: &MockLineChannel) -> Machine<MockLineChannel> {
    let mut wire = channel.clone();
    wire.enqueue_lines(&GREETING);
    let config = MachineConfig {
        driver: fast_config(),
        ..MachineConfig::default()
    };
    Machine::with_channel(wire, &config).expect("handshake over mock")
}

/// `count` lines of chatter that are neither `ok` nor `error`.
pub fn chatter(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("[MSG:Telemetry line {}]", i))
        .collect()
}
