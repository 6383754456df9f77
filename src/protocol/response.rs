//! Inbound line classification.
//!
//! Command replies and status replies are different sub-protocols: a reply
//! line is searched for `ok`/`error`, a status line is only ever read once
//! and inspected for its leading run-state token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive acknowledgment of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ok,
}

/// How reply lines are recognized as acknowledgments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckMatching {
    /// Substring match anywhere in the line. Tolerates chatty firmware that
    /// decorates its replies, at the cost of also matching telemetry that
    /// happens to contain the words.
    #[default]
    Contains,
    /// The trimmed line is exactly `ok`, or starts with `error`.
    Strict,
}

/// What a single reply line means for the command in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyKind {
    Ok,
    Error,
    /// Unrelated output, skipped.
    Other,
}

impl AckMatching {
    /// Classify one reply line. `error` wins over `ok` when both appear.
    pub fn classify(self, line: &str) -> ReplyKind {
        let (is_error, is_ok) = match self {
            Self::Contains => (line.contains("error"), line.contains("ok")),
            Self::Strict => {
                let line = line.trim();
                (line.starts_with("error"), line == "ok")
            }
        };

        if is_error {
            ReplyKind::Error
        } else if is_ok {
            ReplyKind::Ok
        } else {
            ReplyKind::Other
        }
    }
}

/// Leading state token of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Run,
    Hold,
    Jog,
    Alarm,
    Door,
    Check,
    Home,
    Sleep,
    Unknown(String),
}

impl RunState {
    fn from_token(token: &str) -> Self {
        // Grbl 1.1 separates fields with '|', 0.9 with ','; sub-states follow a ':'.
        let name = token
            .trim()
            .trim_start_matches('<')
            .split(['|', ':', '>'])
            .next()
            .unwrap_or_default();

        match name {
            "Idle" => Self::Idle,
            "Run" => Self::Run,
            "Hold" => Self::Hold,
            "Jog" => Self::Jog,
            "Alarm" => Self::Alarm,
            "Door" => Self::Door,
            "Check" => Self::Check,
            "Home" => Self::Home,
            "Sleep" => Self::Sleep,
            _ => Self::Unknown(token.trim().to_string()),
        }
    }
}

/// One raw status reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine(String);

impl StatusLine {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The full line as received.
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Text before the first comma.
    pub fn leading_token(&self) -> &str {
        self.0.split(',').next().unwrap_or_default()
    }

    /// Whether the machine reports it is still executing motion.
    ///
    /// Holds for both `<Run,...` and `<Run|...` reports.
    pub fn is_running(&self) -> bool {
        matches!(self.run_state(), RunState::Run)
    }

    pub fn run_state(&self) -> RunState {
        RunState::from_token(self.leading_token())
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort reading of a `Grbl 1.1f ['$' for help]` banner.
#[derive(Debug, Clone, PartialEq)]
pub struct FirmwareVersion {
    /// Full version word, e.g. `1.1f`.
    pub version: String,
    /// Leading numeric part, e.g. `1.1`.
    pub number: Option<f32>,
    /// Trailing build letter, e.g. `f`.
    pub letter: Option<char>,
}

impl FirmwareVersion {
    pub fn parse(banner: &str) -> Option<Self> {
        let version = banner.split_whitespace().nth(1)?.to_string();
        let digits_end = version
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(version.len());
        let number = version[..digits_end].parse().ok();
        let letter = version[digits_end..].chars().next();

        Some(Self {
            version,
            number,
            letter,
        })
    }
}
