//! Line channel layer for controller communication.
//!
//! Provides the `LineChannel` trait plus a serial implementation and a
//! scripted mock, so the protocol driver can be tested without hardware.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockLineChannel;
pub use sync_port::SerialLineChannel;
pub use traits::*;
