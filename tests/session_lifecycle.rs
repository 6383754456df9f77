//! Session lifecycle tests: handshake, transport failures, cancellation.

mod common;

use common::{chatter, driver_over, fast_config, machine_over, GREETING};
use nomad_driver::error::DriverError;
use nomad_driver::machine::{Machine, MachineConfig};
use nomad_driver::port::{LineChannel, MockLineChannel, PortError};
use nomad_driver::protocol::{
    CancelToken, Driver, DriverConfig, ExhaustedPolicy, HandshakeConfig, ModeCommand,
    MotionRequest, PollConfig, DEFAULT_MAX_REPLY_READS,
};
use std::io::ErrorKind;
use std::thread;
use std::time::Duration;

fn validating() -> MachineConfig {
    MachineConfig {
        driver: DriverConfig {
            handshake: HandshakeConfig {
                validate_banner: true,
            },
            ..fast_config()
        },
        ..MachineConfig::default()
    }
}

// ============================================================================
// Handshake
// ============================================================================

#[cfg(test)]
mod handshake_tests {
    use super::*;

    #[test]
    fn test_greeting_is_consumed_and_parsed() {
        let channel = MockLineChannel::acknowledging("MOCK0");
        let machine = machine_over(&channel);

        assert_eq!(channel.read_count(), 2);
        assert_eq!(channel.pending_lines(), 0);
        let firmware = machine.firmware().expect("banner should parse");
        assert_eq!(firmware.version, "1.1f");
        assert_eq!(firmware.number, Some(1.1));
    }

    #[test]
    fn test_garbage_banner_ignored_by_default() {
        let mut channel = MockLineChannel::new("MOCK0");
        channel.enqueue_lines(&["\u{fffd}\u{fffd}", "noise"]);

        let machine = Machine::with_channel(channel, &MachineConfig::default()).unwrap();
        assert_eq!(machine.banner(), Some("noise"));
    }

    #[test]
    fn test_missing_banner_ignored_by_default() {
        let channel = MockLineChannel::new("MOCK0");

        let machine = Machine::with_channel(channel, &MachineConfig::default()).unwrap();
        assert_eq!(machine.banner(), Some(""));
        assert!(machine.firmware().is_none());
    }

    #[test]
    fn test_validated_banner_accepted() {
        let mut channel = MockLineChannel::new("MOCK0");
        channel.enqueue_lines(&GREETING);

        assert!(Machine::with_channel(channel, &validating()).is_ok());
    }

    #[test]
    fn test_validated_banner_rejected() {
        let mut channel = MockLineChannel::new("MOCK0");
        channel.enqueue_lines(&["", "Marlin 2.1"]);

        let result = Machine::with_channel(channel, &validating());
        assert!(matches!(result, Err(DriverError::Handshake(ref b)) if b == "Marlin 2.1"));
    }
}

// ============================================================================
// Transport failures
// ============================================================================

#[cfg(test)]
mod transport_tests {
    use super::*;

    #[test]
    fn test_write_failure_ends_session() {
        // Arrange
        let mut channel = MockLineChannel::acknowledging("MOCK0");
        let mut machine = machine_over(&channel);
        channel.fail_next_write(ErrorKind::BrokenPipe);

        // Act
        let first = machine.spindle_speed(1200);
        let second = machine.spindle_speed(1200);

        // Assert
        assert!(matches!(first, Err(DriverError::Transport(PortError::Io(_)))));
        assert!(first.as_ref().unwrap_err().is_fatal());
        assert!(matches!(second, Err(DriverError::Disconnected)));
        assert!(!machine.driver().is_connected());
        assert_eq!(machine.modal().spindle_speed, 0);
    }

    #[test]
    fn test_read_failure_mid_reply_ends_session() {
        let mut channel = MockLineChannel::acknowledging("MOCK0");
        let mut machine = machine_over(&channel);
        channel.fail_next_read(ErrorKind::UnexpectedEof);

        let result = machine.move_by(MotionRequest::new().z(-1.0));

        assert!(matches!(result, Err(DriverError::Transport(_))));
        assert!(matches!(machine.status(), Err(DriverError::Disconnected)));
        assert_eq!(channel.written_lines(), vec!["G91"]);
    }

    #[test]
    fn test_disconnect_releases_channel() {
        let channel = MockLineChannel::acknowledging("MOCK0");
        let machine = machine_over(&channel);

        let released = machine.disconnect().expect("channel returned");
        assert_eq!(released.pending_lines(), 0);
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[cfg(test)]
mod cancellation_tests {
    use super::*;

    #[test]
    fn test_cancelled_before_send_writes_nothing() {
        let channel = MockLineChannel::acknowledging("MOCK0");
        let mut driver = driver_over(&channel, fast_config());
        driver.cancel_token().cancel();

        let result = driver.set_mode(ModeCommand::Home);

        assert!(matches!(result, Err(DriverError::Cancelled)));
        assert!(channel.write_log().is_empty());
        assert!(driver.is_connected());
    }

    #[test]
    fn test_reset_token_allows_resuming() {
        let channel = MockLineChannel::acknowledging("MOCK0");
        let mut driver = driver_over(&channel, fast_config());
        let token = driver.cancel_token();

        token.cancel();
        assert!(driver.set_mode(ModeCommand::Unlock).is_err());

        token.reset();
        assert!(driver.set_mode(ModeCommand::Unlock).is_ok());
    }

    #[test]
    fn test_cancel_interrupts_wait_from_another_thread() {
        // Arrange: the machine never stops and the budget is long
        let mut channel = MockLineChannel::new("MOCK0");
        for _ in 0..1000 {
            channel.script_status("<Run,MPos:0.000,0.000,0.000>");
        }
        let mut driver = driver_over(&channel, fast_config());
        let poll = PollConfig {
            max_tries: 1000,
            interval: Duration::from_millis(5),
            on_exhausted: ExhaustedPolicy::AssumeStopped,
        };
        let token = driver.cancel_token();

        // Act
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            token.cancel();
        });
        let result = driver.wait_until_stopped_with(&poll);
        canceller.join().unwrap();

        // Assert
        assert!(matches!(result, Err(DriverError::Cancelled)));
        assert!(channel.status_queries() < 1000);
    }

    /// Channel that trips a cancel token once it has served `after` reads.
    #[derive(Debug)]
    struct CancelAfterReads {
        inner: MockLineChannel,
        token: CancelToken,
        after: usize,
    }

    impl LineChannel for CancelAfterReads {
        fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
            self.inner.write_all(data)
        }

        fn read_line(&mut self) -> Result<String, PortError> {
            let line = self.inner.read_line()?;
            if self.inner.read_count() >= self.after {
                self.token.cancel();
            }
            Ok(line)
        }

        fn discard_buffers(&mut self) -> Result<(), PortError> {
            self.inner.discard_buffers()
        }

        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    #[test]
    fn test_cancel_stops_reading_a_chatty_reply() {
        // Arrange: the reply never terminates within the read budget
        let mut channel = MockLineChannel::new("MOCK0");
        let noise = chatter(DEFAULT_MAX_REPLY_READS + 10);
        let noise: Vec<&str> = noise.iter().map(String::as_str).collect();
        channel.script_reply(&noise);

        let token = CancelToken::new();
        let wire = CancelAfterReads {
            inner: channel.clone(),
            token: token.clone(),
            after: 5,
        };
        let mut driver = Driver::new(wire, fast_config());
        driver.set_cancel_token(token);

        // Act
        let result = driver.set_mode(ModeCommand::SpindleSpeed(1500));

        // Assert
        assert!(matches!(result, Err(DriverError::Cancelled)));
        assert_eq!(channel.read_count(), 5);
        assert!(channel.read_count() < DEFAULT_MAX_REPLY_READS);
        assert_eq!(driver.modal().spindle_speed, 0);
        assert!(driver.is_connected());
    }

    #[test]
    fn test_external_token_is_shared() {
        let channel = MockLineChannel::acknowledging("MOCK0");
        let mut driver = driver_over(&channel, fast_config());
        let external = CancelToken::new();
        driver.set_cancel_token(external.clone());

        external.cancel();
        assert!(matches!(driver.query_status(), Err(DriverError::Cancelled)));
    }
}
