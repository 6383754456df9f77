//! Client-side mirror of the controller's modal state.
//!
//! The driver updates this only after the controller acknowledges the mode
//! command, so it always describes what the firmware last accepted.

use std::fmt;

/// Motion mode (modal group 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    /// `G0`, maximum traverse speed.
    Rapid,
    /// `G1`, at the commanded feed rate.
    Linear,
}

impl MotionMode {
    pub fn token(self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Linear => "G1",
        }
    }
}

/// Distance mode (modal group 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMode {
    /// `G90`, coordinates are positions.
    Absolute,
    /// `G91`, coordinates are offsets from the current position.
    Incremental,
}

impl DistanceMode {
    pub fn token(self) -> &'static str {
        match self {
            Self::Absolute => "G90",
            Self::Incremental => "G91",
        }
    }
}

/// Units for coordinates and feed rate (modal group 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsMode {
    /// `G21`
    Millimeters,
    /// `G20`
    Inches,
}

impl UnitsMode {
    pub fn token(self) -> &'static str {
        match self {
            Self::Millimeters => "G21",
            Self::Inches => "G20",
        }
    }
}

/// Spindle state (modal group 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleState {
    /// `M5`
    Stopped,
    /// `M3`
    Clockwise,
    /// `M4`
    CounterClockwise,
}

impl SpindleState {
    pub fn token(self) -> &'static str {
        match self {
            Self::Stopped => "M5",
            Self::Clockwise => "M3",
            Self::CounterClockwise => "M4",
        }
    }
}

/// A single mode-setting instruction routed through
/// [`Driver::set_mode`](super::Driver::set_mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    /// `$X`, clear an alarm lock. No modal effect.
    Unlock,
    /// `$H`, run the homing cycle. No modal effect.
    Home,
    Spindle(SpindleState),
    /// `S<n>`
    SpindleSpeed(u32),
    /// `F<n>`
    FeedRate(u32),
    Units(UnitsMode),
    Distance(DistanceMode),
    Motion(MotionMode),
}

impl fmt::Display for ModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlock => f.write_str("$X"),
            Self::Home => f.write_str("$H"),
            Self::Spindle(state) => f.write_str(state.token()),
            Self::SpindleSpeed(speed) => write!(f, "S{}", speed),
            Self::FeedRate(rate) => write!(f, "F{}", rate),
            Self::Units(units) => f.write_str(units.token()),
            Self::Distance(mode) => f.write_str(mode.token()),
            Self::Motion(mode) => f.write_str(mode.token()),
        }
    }
}

/// Last acknowledged controller configuration.
///
/// The opaque fields are never changed by this driver; they hold the
/// firmware's power-on values so callers can see the full modal picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    pub motion_mode: MotionMode,
    pub distance_mode: DistanceMode,
    pub units_mode: UnitsMode,
    pub spindle_state: SpindleState,
    pub spindle_speed: u32,
    pub feed_rate: u32,
    pub coordinate_system: &'static str,
    pub plane_select: &'static str,
    pub arc_distance_mode: &'static str,
    pub cutter_radius_compensation: &'static str,
    pub tool_length_offset: &'static str,
    pub program_mode: &'static str,
    pub coolant_state: &'static str,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            motion_mode: MotionMode::Rapid,
            distance_mode: DistanceMode::Absolute,
            units_mode: UnitsMode::Millimeters,
            spindle_state: SpindleState::Stopped,
            spindle_speed: 0,
            feed_rate: 0,
            coordinate_system: "G54",
            plane_select: "G17",
            arc_distance_mode: "G91.1",
            cutter_radius_compensation: "G40",
            tool_length_offset: "G49",
            program_mode: "M0",
            coolant_state: "M9",
        }
    }
}

impl ModalState {
    /// Record an acknowledged mode command.
    pub(crate) fn apply(&mut self, command: ModeCommand) {
        match command {
            ModeCommand::Unlock | ModeCommand::Home => {}
            ModeCommand::Spindle(state) => self.spindle_state = state,
            ModeCommand::SpindleSpeed(speed) => self.spindle_speed = speed,
            ModeCommand::FeedRate(rate) => self.feed_rate = rate,
            ModeCommand::Units(units) => self.units_mode = units,
            ModeCommand::Distance(mode) => self.distance_mode = mode,
            ModeCommand::Motion(mode) => self.motion_mode = mode,
        }
    }

    /// Active modal words, in the order the firmware's `$G` report lists them.
    pub fn words(&self) -> Vec<String> {
        vec![
            self.motion_mode.token().to_string(),
            self.coordinate_system.to_string(),
            self.plane_select.to_string(),
            self.distance_mode.token().to_string(),
            self.arc_distance_mode.to_string(),
            self.units_mode.token().to_string(),
            self.cutter_radius_compensation.to_string(),
            self.tool_length_offset.to_string(),
            self.program_mode.to_string(),
            self.spindle_state.token().to_string(),
            self.coolant_state.to_string(),
            format!("F{}", self.feed_rate),
            format!("S{}", self.spindle_speed),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_defaults() {
        let state = ModalState::default();
        assert_eq!(
            state.words().join(" "),
            "G0 G54 G17 G90 G91.1 G21 G40 G49 M0 M5 M9 F0 S0"
        );
    }

    #[test]
    fn test_mode_command_tokens() {
        assert_eq!(ModeCommand::Unlock.to_string(), "$X");
        assert_eq!(ModeCommand::Home.to_string(), "$H");
        assert_eq!(ModeCommand::Spindle(SpindleState::CounterClockwise).to_string(), "M4");
        assert_eq!(ModeCommand::SpindleSpeed(2000).to_string(), "S2000");
        assert_eq!(ModeCommand::FeedRate(400).to_string(), "F400");
        assert_eq!(ModeCommand::Units(UnitsMode::Inches).to_string(), "G20");
        assert_eq!(ModeCommand::Distance(DistanceMode::Incremental).to_string(), "G91");
        assert_eq!(ModeCommand::Motion(MotionMode::Linear).to_string(), "G1");
    }

    #[test]
    fn test_apply_updates_only_its_field() {
        let mut state = ModalState::default();
        state.apply(ModeCommand::FeedRate(400));
        state.apply(ModeCommand::Home);

        let expected = ModalState {
            feed_rate: 400,
            ..ModalState::default()
        };
        assert_eq!(state, expected);
    }
}
