//! Driver error taxonomy.

use crate::port::PortError;
use thiserror::Error;

/// Convenient Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by the protocol driver and the motion façade.
///
/// None of these are retried by the driver. A blind resend could execute a
/// motion twice, so recovery is left to the caller.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The controller rejected the command. Holds the raw reply line.
    #[error("Controller rejected command: {0}")]
    ControllerError(String),

    /// Neither `ok` nor `error` arrived within the read budget.
    #[error("No response from machine after {attempts} reads")]
    NoResponse { attempts: usize },

    /// The channel itself failed. The session is over after this.
    #[error("Transport failure: {0}")]
    Transport(#[from] PortError),

    /// The channel has been released, by `disconnect` or an earlier transport failure.
    #[error("Driver is not connected")]
    Disconnected,

    /// The operation was aborted through its cancel token.
    #[error("Operation cancelled")]
    Cancelled,

    /// The machine still reported running after every allowed status query.
    #[error("Machine still running after {queries} status queries")]
    StillRunning { queries: usize },

    /// The startup banner did not look like a controller banner.
    #[error("Unexpected startup banner: {0:?}")]
    Handshake(String),

    /// A move asked for a NaN or infinite coordinate. Nothing was sent.
    #[error("Axis {axis} has no finite value: {value}")]
    InvalidCoordinate { axis: char, value: f64 },
}

impl DriverError {
    /// Whether the session can continue after this error.
    ///
    /// Transport failures and a released channel end the session; everything
    /// else leaves the channel usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Disconnected)
    }

    /// Whether the controller may be out of step with the driver.
    ///
    /// After these, issue a status query before resuming.
    pub fn needs_resync(&self) -> bool {
        matches!(self, Self::NoResponse { .. } | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DriverError::ControllerError("error:20".to_string());
        assert_eq!(err.to_string(), "Controller rejected command: error:20");

        let err = DriverError::NoResponse { attempts: 50 };
        assert_eq!(err.to_string(), "No response from machine after 50 reads");
    }

    #[test]
    fn test_transport_conversion_is_fatal() {
        let err: DriverError = PortError::NotFound("COM23".to_string()).into();
        assert!(err.is_fatal());
        assert!(!DriverError::ControllerError(String::new()).is_fatal());
        assert!(DriverError::NoResponse { attempts: 1 }.needs_resync());
    }
}
