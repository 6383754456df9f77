//! Command/acknowledge protocol driver.
//!
//! Owns the line channel and the modal state mirror. Exactly one command is
//! in flight at a time: each call writes one line and blocks until it is
//! classified as acknowledged, rejected, or unanswered.

use super::cancel::CancelToken;
use super::command::Command;
use super::modal::{ModalState, ModeCommand};
use super::response::{Ack, AckMatching, FirmwareVersion, ReplyKind, StatusLine};
use crate::error::{DriverError, DriverResult};
use crate::port::{LineChannel, PortError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default number of reply lines read while waiting for `ok`/`error`.
pub const DEFAULT_MAX_REPLY_READS: usize = 50;

/// Default number of status queries made by `wait_until_stopped`.
pub const DEFAULT_POLL_MAX_TRIES: usize = 50;

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// The single byte that asks the controller for a status report.
const STATUS_QUERY: &[u8] = b"?";

/// What `wait_until_stopped` does when the machine never leaves the running state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Log a warning and report [`WaitOutcome::Exhausted`].
    #[default]
    AssumeStopped,
    /// Fail with [`DriverError::StillRunning`].
    Fail,
}

/// Status polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub max_tries: usize,
    pub interval: Duration,
    pub on_exhausted: ExhaustedPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_POLL_MAX_TRIES,
            interval: DEFAULT_POLL_INTERVAL,
            on_exhausted: ExhaustedPolicy::default(),
        }
    }
}

/// Startup banner handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Reject an empty banner or one that does not start with `Grbl`.
    pub validate_banner: bool,
}

/// Runtime tuning for a [`Driver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub max_reply_reads: usize,
    pub ack_matching: AckMatching,
    pub poll: PollConfig,
    pub handshake: HandshakeConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_reply_reads: DEFAULT_MAX_REPLY_READS,
            ack_matching: AckMatching::default(),
            poll: PollConfig::default(),
            handshake: HandshakeConfig::default(),
        }
    }
}

/// How a wait for motion completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A status reply showed the machine was no longer running.
    Stopped { queries: usize },
    /// Every query reported running; treated as stopped by policy.
    Exhausted { queries: usize },
}

impl WaitOutcome {
    pub fn queries(&self) -> usize {
        match self {
            Self::Stopped { queries } | Self::Exhausted { queries } => *queries,
        }
    }
}

/// Protocol driver for a single controller session.
#[derive(Debug)]
pub struct Driver<C: LineChannel> {
    /// `None` once released by `close` or a transport failure.
    channel: Option<C>,
    modal: ModalState,
    config: DriverConfig,
    cancel: CancelToken,
    banner: Option<String>,
}

impl<C: LineChannel> Driver<C> {
    /// Take ownership of an open channel. Modal state starts at firmware defaults.
    pub fn new(channel: C, config: DriverConfig) -> Self {
        Self {
            channel: Some(channel),
            modal: ModalState::default(),
            config,
            cancel: CancelToken::new(),
            banner: None,
        }
    }

    /// Consume the startup greeting: one ignorable line, then the firmware banner.
    pub fn handshake(&mut self) -> DriverResult<Option<FirmwareVersion>> {
        let _ = self.io(|c| c.read_line())?;
        let banner = self.io(|c| c.read_line())?;
        let banner = banner.trim().to_string();
        info!("Controller banner: {:?}", banner);

        if self.config.handshake.validate_banner && !banner.starts_with("Grbl") {
            return Err(DriverError::Handshake(banner));
        }

        let version = FirmwareVersion::parse(&banner);
        self.banner = Some(banner);
        Ok(version)
    }

    /// Send one line and wait for its acknowledgment.
    ///
    /// Unread input is discarded before writing so a stale reply can never be
    /// taken for this command's. Unrelated lines before the terminator are
    /// skipped. Nothing is resent on failure.
    pub fn send_command(&mut self, command: &Command) -> DriverResult<Ack> {
        self.check_cancelled()?;

        let line = command.to_line();
        debug!("Sending {:?}", command.to_string());
        self.io(|c| c.discard_buffers())?;
        self.io(|c| c.write_all(line.as_bytes()))?;

        let matching = self.config.ack_matching;
        for _ in 0..self.config.max_reply_reads {
            self.check_cancelled()?;
            let reply = self.io(|c| c.read_line())?;

            match matching.classify(&reply) {
                ReplyKind::Ok => {
                    debug!("Reply {:?}", reply);
                    return Ok(Ack::Ok);
                }
                ReplyKind::Error => {
                    warn!("Controller rejected {:?}: {}", command.to_string(), reply);
                    return Err(DriverError::ControllerError(reply));
                }
                ReplyKind::Other => {
                    if !reply.is_empty() {
                        debug!("Skipping {:?}", reply);
                    }
                }
            }
        }

        warn!(
            "No reply to {:?} after {} reads",
            command.to_string(),
            self.config.max_reply_reads
        );
        Err(DriverError::NoResponse {
            attempts: self.config.max_reply_reads,
        })
    }

    /// Ask for a status report and return the single reply line.
    ///
    /// Not part of the acknowledgment protocol: no buffer discard, no waiting
    /// for `ok`.
    pub fn query_status(&mut self) -> DriverResult<StatusLine> {
        self.check_cancelled()?;
        self.io(|c| c.write_all(STATUS_QUERY))?;
        let line = self.io(|c| c.read_line())?;
        debug!("Status {:?}", line);
        Ok(StatusLine::new(line))
    }

    /// Send a mode command and record it once acknowledged.
    pub fn set_mode(&mut self, mode: ModeCommand) -> DriverResult<()> {
        self.send_command(&mode.into())?;
        self.modal.apply(mode);
        Ok(())
    }

    /// Poll status with the configured parameters until the machine is not running.
    pub fn wait_until_stopped(&mut self) -> DriverResult<WaitOutcome> {
        let poll = self.config.poll.clone();
        self.wait_until_stopped_with(&poll)
    }

    /// Poll status until the run state is not `Run`, at most `poll.max_tries` times.
    pub fn wait_until_stopped_with(&mut self, poll: &PollConfig) -> DriverResult<WaitOutcome> {
        let mut queries = 0;

        while queries < poll.max_tries {
            let status = self.query_status()?;
            queries += 1;

            if !status.is_running() {
                return Ok(WaitOutcome::Stopped { queries });
            }

            // Back off between queries; the firmware does not like being flooded with '?'.
            if !poll.interval.is_zero() {
                std::thread::sleep(poll.interval);
            }
        }

        match poll.on_exhausted {
            ExhaustedPolicy::AssumeStopped => {
                warn!(
                    "Machine still running after {} status queries, assuming stopped",
                    queries
                );
                Ok(WaitOutcome::Exhausted { queries })
            }
            ExhaustedPolicy::Fail => Err(DriverError::StillRunning { queries }),
        }
    }

    /// Last acknowledged modal state.
    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Raw firmware banner read during the handshake.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Token that aborts the current and all later blocking operations until reset.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Share an externally owned token, e.g. one already wired to a signal handler.
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = token;
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Name of the underlying channel, while connected.
    pub fn channel_name(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.name())
    }

    /// Release the channel. Later operations fail with `Disconnected`.
    pub fn close(&mut self) -> Option<C> {
        let channel = self.channel.take();
        if let Some(ref c) = channel {
            info!("Released channel {}", c.name());
        }
        channel
    }

    fn check_cancelled(&self) -> DriverResult<()> {
        if self.cancel.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        Ok(())
    }

    /// Run one channel operation. A failure ends the session by dropping the channel.
    fn io<T>(&mut self, op: impl FnOnce(&mut C) -> Result<T, PortError>) -> DriverResult<T> {
        let channel = self.channel.as_mut().ok_or(DriverError::Disconnected)?;

        match op(channel) {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Transport failure, closing channel: {}", e);
                self.channel = None;
                Err(DriverError::Transport(e))
            }
        }
    }
}
