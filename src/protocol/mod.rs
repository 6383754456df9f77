//! Controller protocol: command encoding, reply classification, modal state
//! and the send/acknowledge driver.

pub mod cancel;
pub mod command;
pub mod driver;
pub mod modal;
pub mod response;

pub use cancel::CancelToken;
pub use command::{Command, MotionRequest, Word};
pub use driver::{
    Driver, DriverConfig, ExhaustedPolicy, HandshakeConfig, PollConfig, WaitOutcome,
    DEFAULT_MAX_REPLY_READS, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_MAX_TRIES,
};
pub use modal::{DistanceMode, ModalState, ModeCommand, MotionMode, SpindleState, UnitsMode};
pub use response::{Ack, AckMatching, FirmwareVersion, ReplyKind, RunState, StatusLine};
