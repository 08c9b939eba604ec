//! One edge of the transition function: read symbols, write symbols and
//! head movements for every tape, plus the state change. A single record
//! covers both single and multi-tape machines; single-tape edges simply
//! carry vectors of length one.

use crate::types::{Movement, TmError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable transition record.
///
/// Well-formedness requires the read, write and movement vectors to share
/// the same non-zero length; the constructor rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from_state: String,
    pub read: Vec<char>,
    pub to_state: String,
    pub write: Vec<char>,
    pub moves: Vec<Movement>,
}

impl Transition {
    /// Builds a transition, rejecting mismatched or empty vectors.
    pub fn new(
        from_state: impl Into<String>,
        read: Vec<char>,
        to_state: impl Into<String>,
        write: Vec<char>,
        moves: Vec<Movement>,
    ) -> Result<Self, TmError> {
        if read.is_empty() || read.len() != write.len() || read.len() != moves.len() {
            return Err(TmError::Validation(
                "los vectores de lectura, escritura y movimiento deben tener la misma longitud no nula"
                    .to_string(),
            ));
        }

        Ok(Self {
            from_state: from_state.into(),
            read,
            to_state: to_state.into(),
            write,
            moves,
        })
    }

    /// Builds a single-tape transition.
    pub fn mono(
        from_state: impl Into<String>,
        read: char,
        to_state: impl Into<String>,
        write: char,
        movement: Movement,
    ) -> Self {
        Self {
            from_state: from_state.into(),
            read: vec![read],
            to_state: to_state.into(),
            write: vec![write],
            moves: vec![movement],
        }
    }

    /// Number of tapes this transition operates on.
    pub fn arity(&self) -> usize {
        self.read.len()
    }

    /// Whether this transition fires from `state` when the heads read
    /// exactly `symbols`.
    pub fn is_applicable(&self, state: &str, symbols: &[char]) -> bool {
        self.from_state == state && self.read == symbols
    }

    /// Expands a single-tape transition to `tapes` tapes, acting on
    /// `target` and reading/writing the blank with no movement everywhere
    /// else. A construction convenience for embedding single-tape machines
    /// into wider ones.
    pub fn lift(&self, tapes: usize, target: usize, blank: char) -> Result<Self, TmError> {
        if self.arity() != 1 {
            return Err(TmError::Validation(
                "sólo se puede elevar una transición de una cinta".to_string(),
            ));
        }
        if target >= tapes {
            return Err(TmError::Validation(format!(
                "índice de cinta destino fuera de rango: {target} (cintas: {tapes})"
            )));
        }

        let mut read = vec![blank; tapes];
        let mut write = vec![blank; tapes];
        let mut moves = vec![Movement::Stay; tapes];

        read[target] = self.read[0];
        write[target] = self.write[0];
        moves[target] = self.moves[0];

        Transition::new(self.from_state.clone(), read, self.to_state.clone(), write, moves)
    }
}

impl fmt::Display for Transition {
    /// Renders the transition in the definition file layout:
    /// `from reads to writes moves` with comma-joined tuples.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join_chars = |symbols: &[char]| {
            symbols
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        let moves = self
            .moves
            .iter()
            .map(|m| m.as_char().to_string())
            .collect::<Vec<_>>()
            .join(",");

        write!(
            f,
            "{} {} {} {} {}",
            self.from_state,
            join_chars(&self.read),
            self.to_state,
            join_chars(&self.write),
            moves
        )
    }
}
