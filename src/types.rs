//! Core value types shared across the simulator: head movements, the
//! simulation verdict, the error taxonomy and a handful of defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The blank symbol used when a machine does not declare one explicitly.
pub const DEFAULT_BLANK_SYMBOL: char = '.';
/// The default step budget for a simulation. A budget of 0 means unbounded.
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// Cells shown on each side of the head in trace renderings.
pub const TRACE_WINDOW: i64 = 10;
/// Cells shown on each side of the head when printing final tapes.
pub const FINAL_TAPE_WINDOW: i64 = 20;

/// A head displacement: one cell to the left, one to the right, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Left,
    Right,
    Stay,
}

impl Movement {
    /// Parses a movement letter. Accepts `L`, `R` and `S`, case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'L' => Some(Movement::Left),
            'R' => Some(Movement::Right),
            'S' => Some(Movement::Stay),
            _ => None,
        }
    }

    /// The letter used in the machine definition file format.
    pub fn as_char(self) -> char {
        match self {
            Movement::Left => 'L',
            Movement::Right => 'R',
            Movement::Stay => 'S',
        }
    }

    /// The signed displacement applied to a head position.
    pub fn offset(self) -> i64 {
        match self {
            Movement::Left => -1,
            Movement::Right => 1,
            Movement::Stay => 0,
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The verdict of simulating one input word.
///
/// `Infinite` covers both budget exhaustion and a detected configuration
/// repeat; the engine's `loop_detected` flag tells the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationResult {
    Accepted,
    Rejected,
    Infinite,
    Error,
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            SimulationResult::Accepted => "ACCEPT",
            SimulationResult::Rejected => "REJECT",
            SimulationResult::Infinite => "INFINITE",
            SimulationResult::Error => "ERROR",
        };
        write!(f, "{token}")
    }
}

/// Errors produced while loading, validating or running a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TmError {
    /// Malformed definition file. Carries the offending 1-based line number.
    #[error("Línea {line}: {message}")]
    Parse { line: usize, message: String },
    /// A structural invariant of the machine does not hold.
    #[error("Máquina inválida: {0}")]
    Validation(String),
    /// The input word contains a symbol outside the input alphabet.
    #[error("Palabra inválida: {0}")]
    Input(String),
    /// Unexpected fault while applying a step.
    #[error("Error de ejecución: {0}")]
    Runtime(String),
    /// Filesystem problem while reading or writing a definition.
    #[error("{0}")]
    File(String),
}

impl TmError {
    /// Shorthand for a line-numbered parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        TmError::Parse {
            line,
            message: message.into(),
        }
    }
}
