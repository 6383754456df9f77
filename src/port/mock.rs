//! Scripted line channel for testing.
//!
//! `MockLineChannel` plays the controller's side of the conversation without
//! hardware. Replies are scripted per write so that the driver's
//! discard-before-send step behaves the way it does on a real port: anything
//! queued before the write is stale and gets thrown away, anything scripted
//! for the write arrives after it.

use super::error::PortError;
use super::traits::LineChannel;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Reply used for `?` when no status line has been scripted.
pub const IDLE_STATUS: &str = "<Idle|MPos:0.000,0.000,0.000|FS:0,0>";

#[derive(Debug, Default)]
struct MockState {
    /// Lines currently readable.
    input: VecDeque<String>,
    /// Reply batches released one per command write.
    replies: VecDeque<Vec<String>>,
    /// Lines released one per status query.
    status_replies: VecDeque<String>,
    /// Answer unscripted command writes with `ok`.
    auto_ack: bool,
    /// Every write, in order.
    write_log: Vec<Vec<u8>>,
    /// Number of `read_line` calls.
    reads: usize,
    /// Number of `discard_buffers` calls.
    discards: usize,
    fail_next_write: Option<std::io::ErrorKind>,
    fail_next_read: Option<std::io::ErrorKind>,
}

/// Mock controller channel.
///
/// Clones share state, so a test can keep a handle for inspection after
/// moving the channel into a driver.
///
/// # Example
/// ```
/// use nomad_driver::port::{LineChannel, MockLineChannel};
///
/// let mut channel = MockLineChannel::new("MOCK0");
/// channel.script_reply(&["ok"]);
///
/// channel.write_all(b"G90\n").unwrap();
/// assert_eq!(channel.read_line().unwrap(), "ok");
/// assert_eq!(channel.written_lines(), vec!["G90"]);
/// ```
#[derive(Clone)]
pub struct MockLineChannel {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockLineChannel {
    /// Create a mock with nothing scripted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock that acknowledges every unscripted command with `ok`.
    pub fn acknowledging(name: impl Into<String>) -> Self {
        let mock = Self::new(name);
        mock.state.lock().auto_ack = true;
        mock
    }

    /// Make lines readable immediately, e.g. the startup banner.
    pub fn enqueue_lines(&mut self, lines: &[&str]) {
        let mut state = self.state.lock();
        state.input.extend(lines.iter().map(|l| l.to_string()));
    }

    /// Script the lines the controller sends after the next unanswered command write.
    pub fn script_reply(&mut self, lines: &[&str]) {
        let mut state = self.state.lock();
        state
            .replies
            .push_back(lines.iter().map(|l| l.to_string()).collect());
    }

    /// Script the answer to the next unanswered status query.
    pub fn script_status(&mut self, line: &str) {
        self.state.lock().status_replies.push_back(line.to_string());
    }

    /// Make the next write fail with the given I/O error kind.
    pub fn fail_next_write(&mut self, kind: std::io::ErrorKind) {
        self.state.lock().fail_next_write = Some(kind);
    }

    /// Make the next read fail with the given I/O error kind.
    pub fn fail_next_read(&mut self, kind: std::io::ErrorKind) {
        self.state.lock().fail_next_read = Some(kind);
    }

    /// Raw copy of every write.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Newline-terminated writes as text, terminator stripped.
    ///
    /// Status queries are left out so the result reads as a G-code transcript.
    pub fn written_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .write_log
            .iter()
            .filter(|w| w.ends_with(b"\n"))
            .map(|w| String::from_utf8_lossy(&w[..w.len() - 1]).into_owned())
            .collect()
    }

    /// Number of status query bytes written.
    pub fn status_queries(&self) -> usize {
        self.state
            .lock()
            .write_log
            .iter()
            .filter(|w| w.as_slice() == b"?")
            .count()
    }

    /// Number of `read_line` calls so far.
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    /// Number of `discard_buffers` calls so far.
    pub fn discard_count(&self) -> usize {
        self.state.lock().discards
    }

    /// Lines still waiting to be read.
    pub fn pending_lines(&self) -> usize {
        self.state.lock().input.len()
    }

    /// Forget the write log and counters, keep the script.
    pub fn clear_log(&mut self) {
        let mut state = self.state.lock();
        state.write_log.clear();
        state.reads = 0;
        state.discards = 0;
    }
}

impl LineChannel for MockLineChannel {
    fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
        let mut state = self.state.lock();

        if let Some(kind) = state.fail_next_write.take() {
            return Err(PortError::Io(std::io::Error::new(kind, "scripted write failure")));
        }

        state.write_log.push(data.to_vec());

        if data == b"?" {
            let line = state
                .status_replies
                .pop_front()
                .unwrap_or_else(|| IDLE_STATUS.to_string());
            state.input.push_back(line);
        } else if let Some(batch) = state.replies.pop_front() {
            state.input.extend(batch);
        } else if state.auto_ack {
            state.input.push_back("ok".to_string());
        }

        Ok(())
    }

    fn read_line(&mut self) -> Result<String, PortError> {
        let mut state = self.state.lock();
        state.reads += 1;

        if let Some(kind) = state.fail_next_read.take() {
            return Err(PortError::Io(std::io::Error::new(kind, "scripted read failure")));
        }

        // An empty queue behaves like a read timeout with nothing received.
        Ok(state.input.pop_front().unwrap_or_default())
    }

    fn discard_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.input.clear();
        state.discards += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockLineChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLineChannel")
            .field("name", &self.name)
            .field("pending_lines", &self.pending_lines())
            .finish()
    }
}
