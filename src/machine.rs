//! Motion façade over the protocol driver.
//!
//! `Machine` is what a sequencing program talks to: connection lifecycle,
//! spindle and feed settings, and moves that always assert their distance and
//! motion modes before the coordinate line.

use crate::error::{DriverError, DriverResult};
use crate::port::{LineChannel, PortConfiguration, SerialLineChannel};
use crate::protocol::{
    Ack, CancelToken, Command, DistanceMode, Driver, DriverConfig, FirmwareVersion, ModalState,
    ModeCommand, MotionMode, MotionRequest, SpindleState, StatusLine, UnitsMode, WaitOutcome,
};
use tracing::info;

/// Everything needed to open and drive a controller session.
#[derive(Debug, Clone, Default)]
pub struct MachineConfig {
    pub port: PortConfiguration,
    pub driver: DriverConfig,
}

/// A connected machine.
#[derive(Debug)]
pub struct Machine<C: LineChannel = SerialLineChannel> {
    driver: Driver<C>,
    firmware: Option<FirmwareVersion>,
}

impl Machine<SerialLineChannel> {
    /// Open the serial port and read the startup banner.
    pub fn connect(port_name: &str, config: &MachineConfig) -> DriverResult<Self> {
        info!(
            "Connecting to {} at {} baud",
            port_name, config.port.baud_rate
        );
        let channel = SerialLineChannel::open(port_name, config.port.clone())?;
        Self::with_channel(channel, config)
    }
}

impl<C: LineChannel> Machine<C> {
    /// Drive an already-open channel, starting with the banner handshake.
    pub fn with_channel(channel: C, config: &MachineConfig) -> DriverResult<Self> {
        let mut driver = Driver::new(channel, config.driver.clone());
        let firmware = driver.handshake()?;
        Ok(Self { driver, firmware })
    }

    /// Wrap a driver whose channel needs no handshake, e.g. one opened mid-session.
    pub fn from_driver(driver: Driver<C>) -> Self {
        Self {
            driver,
            firmware: None,
        }
    }

    /// Release the channel.
    pub fn disconnect(mut self) -> Option<C> {
        self.driver.close()
    }

    // Single-line commands that expect "ok" or an error back.

    pub fn unlock(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Unlock)
    }

    pub fn home(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Home)
    }

    pub fn spindle_clockwise(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Spindle(SpindleState::Clockwise))
    }

    pub fn spindle_counter_clockwise(&mut self) -> DriverResult<()> {
        self.driver
            .set_mode(ModeCommand::Spindle(SpindleState::CounterClockwise))
    }

    pub fn spindle_stop(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Spindle(SpindleState::Stopped))
    }

    /// Spindle speed in RPM. The reference machine accepts 0 to 10000.
    pub fn spindle_speed(&mut self, rpm: u32) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::SpindleSpeed(rpm))
    }

    /// Feed rate in current units per minute.
    pub fn feed_rate(&mut self, rate: u32) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::FeedRate(rate))
    }

    pub fn in_inches(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Units(UnitsMode::Inches))
    }

    pub fn in_millimeters(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Units(UnitsMode::Millimeters))
    }

    // Lower-level mode setters. Prefer the move_* methods, which set these for you.

    pub fn absolute_mode(&mut self) -> DriverResult<()> {
        self.driver
            .set_mode(ModeCommand::Distance(DistanceMode::Absolute))
    }

    pub fn incremental_mode(&mut self) -> DriverResult<()> {
        self.driver
            .set_mode(ModeCommand::Distance(DistanceMode::Incremental))
    }

    pub fn rapid_motion_mode(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Motion(MotionMode::Rapid))
    }

    pub fn linear_motion_mode(&mut self) -> DriverResult<()> {
        self.driver.set_mode(ModeCommand::Motion(MotionMode::Linear))
    }

    /// Move to absolute coordinates at the feed rate.
    pub fn move_to(&mut self, target: MotionRequest) -> DriverResult<Ack> {
        self.move_with(DistanceMode::Absolute, MotionMode::Linear, target)
    }

    /// Move to absolute coordinates at rapid speed.
    pub fn move_to_fast(&mut self, target: MotionRequest) -> DriverResult<Ack> {
        self.move_with(DistanceMode::Absolute, MotionMode::Rapid, target)
    }

    /// Move by relative offsets at the feed rate.
    pub fn move_by(&mut self, offset: MotionRequest) -> DriverResult<Ack> {
        self.move_with(DistanceMode::Incremental, MotionMode::Linear, offset)
    }

    /// Move by relative offsets at rapid speed.
    pub fn move_by_fast(&mut self, offset: MotionRequest) -> DriverResult<Ack> {
        self.move_with(DistanceMode::Incremental, MotionMode::Rapid, offset)
    }

    /// Both modes are sent every time, even when the mirror already matches:
    /// a stale mirror would turn an absolute move into a relative one.
    fn move_with(
        &mut self,
        distance: DistanceMode,
        motion: MotionMode,
        request: MotionRequest,
    ) -> DriverResult<Ack> {
        if let Some((axis, value)) = request.non_finite_axis() {
            return Err(DriverError::InvalidCoordinate { axis, value });
        }
        self.driver.set_mode(ModeCommand::Distance(distance))?;
        self.driver.set_mode(ModeCommand::Motion(motion))?;
        self.driver.send_command(&Command::coordinates(&request))
    }

    /// Block until a status report shows the machine is not running.
    ///
    /// Moves return as soon as the planner accepts them, so call this before
    /// anything that depends on the tool having arrived.
    pub fn wait_until_stopped(&mut self) -> DriverResult<WaitOutcome> {
        self.driver.wait_until_stopped()
    }

    /// Raw status report.
    pub fn status(&mut self) -> DriverResult<StatusLine> {
        self.driver.query_status()
    }

    pub fn modal(&self) -> &ModalState {
        self.driver.modal()
    }

    /// Raw firmware banner from the handshake.
    pub fn banner(&self) -> Option<&str> {
        self.driver.banner()
    }

    pub fn firmware(&self) -> Option<&FirmwareVersion> {
        self.firmware.as_ref()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.driver.cancel_token()
    }

    pub fn driver(&self) -> &Driver<C> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver<C> {
        &mut self.driver
    }
}
