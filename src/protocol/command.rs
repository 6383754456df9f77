//! Outbound protocol lines.

use super::modal::ModeCommand;
use std::fmt;

/// One word of a command line: a bare token (`$X`, `G90`) or an axis value.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    Token(String),
    Axis(char, f64),
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.write_str(token),
            // f64's Display is the shortest form that round-trips: 10 -> "10", -5.5 -> "-5.5".
            Self::Axis(letter, value) => write!(f, "{}{}", letter, value),
        }
    }
}

/// Requested axis targets or offsets. Omitted axes are left out of the line,
/// which the firmware reads as "unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl MotionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// Whether no axis was supplied.
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// First supplied axis whose value is NaN or infinite.
    ///
    /// Such a value would print as `XNaN` or `Xinf`, which the firmware cannot parse.
    pub fn non_finite_axis(&self) -> Option<(char, f64)> {
        [('X', self.x), ('Y', self.y), ('Z', self.z)]
            .into_iter()
            .find_map(|(letter, value)| value.filter(|v| !v.is_finite()).map(|v| (letter, v)))
    }
}

/// A single immutable protocol line.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    words: Vec<Word>,
}

impl Command {
    /// Build a command from its words.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Coordinate line carrying only the supplied axes, in X, Y, Z order.
    pub fn coordinates(request: &MotionRequest) -> Self {
        let words = [('X', request.x), ('Y', request.y), ('Z', request.z)]
            .into_iter()
            .filter_map(|(letter, value)| value.map(|v| Word::Axis(letter, v)))
            .collect();
        Self { words }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Wire form, newline-terminated.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in &self.words {
            write!(f, "{}", word)?;
        }
        Ok(())
    }
}

impl From<ModeCommand> for Command {
    fn from(mode: ModeCommand) -> Self {
        Self::new(vec![Word::Token(mode.to_string())])
    }
}
