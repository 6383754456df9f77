//! Core traits for the controller line channel.
//!
//! Defines the `LineChannel` trait that lets the protocol driver run against
//! a real serial port or a scripted mock interchangeably.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default baud rate of the controller's USB serial link.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default per-line read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration parameters for a serial line channel.
#[derive(Debug, Clone)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits.
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Read timeout for a single line.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Duplex, line-oriented channel to the controller.
///
/// Writes are raw bytes (the status query is a single byte with no
/// terminator), reads are whole lines.
pub trait LineChannel: Send + std::fmt::Debug {
    /// Write all of `data` to the channel.
    fn write_all(&mut self, data: &[u8]) -> Result<(), PortError>;

    /// Read one line, without its terminator.
    ///
    /// A read that times out before a newline arrives returns whatever was
    /// received so far, which may be the empty string. Callers count that as
    /// one read attempt.
    fn read_line(&mut self) -> Result<String, PortError>;

    /// Discard unread input and unsent output.
    fn discard_buffers(&mut self) -> Result<(), PortError>;

    /// Get the name/path of this channel.
    fn name(&self) -> &str;
}

impl<C: LineChannel + ?Sized> LineChannel for Box<C> {
    fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
        (**self).write_all(data)
    }

    fn read_line(&mut self) -> Result<String, PortError> {
        (**self).read_line()
    }

    fn discard_buffers(&mut self) -> Result<(), PortError> {
        (**self).discard_buffers()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
