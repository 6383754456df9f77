//! Serial line channel.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `LineChannel` trait, assembling incoming bytes into lines.

use super::error::PortError;
use super::traits::{LineChannel, PortConfiguration};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

const READ_CHUNK: usize = 64;

/// Longest line handed back whole; GRBL's own replies stay well under this.
/// Anything longer without a newline is line noise and is returned in pieces.
const MAX_LINE_BYTES: usize = 256;

/// Line channel over a real serial port.
pub struct SerialLineChannel {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
    /// Bytes received after the last returned line.
    pending: Vec<u8>,
    /// Upper bound on one `read_line` call while bytes keep arriving.
    timeout: Duration,
}

impl SerialLineChannel {
    /// Open a serial port with the given configuration.
    ///
    /// # Arguments
    /// * `port_name` - The system path to the serial port (e.g., "/dev/ttyACM0" or "COM23")
    /// * `config` - Configuration parameters for the port
    ///
    /// # Example
    /// ```no_run
    /// use nomad_driver::port::{PortConfiguration, SerialLineChannel};
    ///
    /// let channel = SerialLineChannel::open("/dev/ttyACM0", PortConfiguration::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.timeout)
            .open()
            .map_err(|e| PortError::from_open(port_name, e))?;

        Ok(Self {
            port,
            name: port_name.to_string(),
            pending: Vec::new(),
            timeout: config.timeout,
        })
    }
}

/// Split the first complete line off `pending`, or its first
/// `MAX_LINE_BYTES` when that many arrived without a newline.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = match memchr::memchr(b'\n', pending) {
        Some(newline) if newline < MAX_LINE_BYTES => newline + 1,
        _ if pending.len() >= MAX_LINE_BYTES => MAX_LINE_BYTES,
        _ => return None,
    };
    let rest = pending.split_off(end);
    let line = std::mem::replace(pending, rest);
    Some(decode_line(&line))
}

/// Lossy UTF-8 decode with the line terminator stripped.
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

impl LineChannel for SerialLineChannel {
    fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, PortError> {
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(line);
            }

            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    // A steady trickle never trips the port's own timeout.
                    let overdue = Instant::now() >= deadline;
                    if overdue && memchr::memchr(b'\n', &self.pending).is_none() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PortError::Io(e)),
            }
        }

        // Timed out mid-line: hand back the partial data like a plain readline would.
        let partial = std::mem::take(&mut self.pending);
        Ok(decode_line(&partial))
    }

    fn discard_buffers(&mut self) -> Result<(), PortError> {
        self.pending.clear();
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::Serial)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialLineChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLineChannel")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .field("pending", &self.pending.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}
