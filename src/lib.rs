//! Nomad Driver Library
//!
//! Command/response driver for GRBL-style CNC controllers reached over a
//! serial line: G-code/M-code lines out, `ok`/`error` acknowledgments and
//! status reports back.
//!
//! # Modules
//!
//! - `port`: Line channel abstraction (serial port and scripted mock)
//! - `protocol`: Command encoding, reply classification, modal state, driver
//! - `machine`: Motion façade used by sequencing programs
//! - `config`: Configuration management with TOML support
//! - `error`: Driver error taxonomy
//! - `logging`: Tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use nomad_driver::{Machine, MachineConfig, MotionRequest};
//!
//! let mut machine = Machine::connect("/dev/ttyACM0", &MachineConfig::default())?;
//! machine.unlock()?;
//! machine.in_millimeters()?;
//! machine.feed_rate(400)?;
//! machine.move_by(MotionRequest::new().x(-5.0))?;
//! machine.wait_until_stopped()?;
//! machine.disconnect();
//! # Ok::<(), nomad_driver::DriverError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod machine;
pub mod port;
pub mod protocol;

// Re-export commonly used types for convenience
pub use error::{DriverError, DriverResult};
pub use machine::{Machine, MachineConfig};
pub use port::{LineChannel, MockLineChannel, PortConfiguration, PortError, SerialLineChannel};
pub use protocol::{
    Ack, AckMatching, CancelToken, Command, DistanceMode, Driver, DriverConfig, ExhaustedPolicy,
    FirmwareVersion, ModalState, ModeCommand, MotionMode, MotionRequest, PollConfig, RunState,
    SpindleState, StatusLine, UnitsMode, WaitOutcome,
};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
