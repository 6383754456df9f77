//! Line channel error types.
//!
//! Kept apart from [`DriverError`](crate::error::DriverError): the driver only
//! sees a failed channel, never why the operating system refused it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    /// No device answers to this name.
    #[error("no serial device at {0}")]
    NotFound(String),

    /// The device exists but another process holds it or access is denied.
    #[error("serial device {0} is busy or not accessible")]
    Busy(String),

    /// The driver refused the line settings, e.g. an unsupported baud rate.
    #[error("{port} rejected its line settings: {reason}")]
    Settings { port: String, reason: String },

    #[error("I/O error on the channel: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Map a failed `serialport` open onto the variants above.
    pub fn from_open(port: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::NotFound(port.to_string()),
            serialport::ErrorKind::InvalidInput => Self::Settings {
                port: port.to_string(),
                reason: err.description,
            },
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                Self::Busy(port.to_string())
            }
            _ => Self::Serial(err),
        }
    }
}
