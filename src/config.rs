//! An instantaneous description of a running machine: the current state,
//! the tapes and the step counter, plus the canonical fingerprint used for
//! loop detection.

use crate::tape::Tape;
use crate::types::Movement;
use std::fmt::Write as _;

/// One configuration of the simulation.
///
/// Cloning a configuration deep-copies its tapes, so snapshots stored in a
/// trace are independent of later steps.
#[derive(Debug, Clone)]
pub struct Configuration {
    state: String,
    tapes: Vec<Tape>,
    steps: usize,
}

impl Configuration {
    /// Creates a configuration with `tapes` blank tapes and the head of
    /// each at position 0.
    pub fn new(state: &str, tapes: usize, blank: char) -> Self {
        Self {
            state: state.to_string(),
            tapes: (0..tapes).map(|_| Tape::new(blank)).collect(),
            steps: 0,
        }
    }

    /// Resets to `state`, placing `word` on the first tape and blanking the
    /// rest. The step counter goes back to zero.
    pub fn reset(&mut self, state: &str, word: &str) {
        self.state = state.to_string();
        self.steps = 0;
        for (i, tape) in self.tapes.iter_mut().enumerate() {
            tape.reset(if i == 0 { word } else { "" });
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn set_state(&mut self, state: &str) {
        self.state = state.to_string();
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn increment_steps(&mut self) {
        self.steps += 1;
    }

    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    pub fn tape(&self, index: usize) -> &Tape {
        &self.tapes[index]
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    /// The symbols currently under every head.
    pub fn read_symbols(&self) -> Vec<char> {
        self.tapes.iter().map(Tape::read).collect()
    }

    /// Writes `symbol` under the head of tape `index` and then applies the
    /// movement. The write lands on the cell the head was on before moving.
    pub fn write_and_move(&mut self, index: usize, symbol: char, movement: Movement) {
        let tape = &mut self.tapes[index];
        tape.write(symbol);
        tape.apply(movement);
    }

    /// The canonical fingerprint: state, absolute head positions and the
    /// minimal tape contents, in the form `state|h1,…,hk|c1|…|ck`. Two
    /// configurations behave identically under the transition function
    /// exactly when their fingerprints coincide, which is what loop
    /// detection relies on. The step counter is not part of the
    /// fingerprint.
    pub fn compact(&self) -> String {
        let heads = self
            .tapes
            .iter()
            .map(|t| t.head_position().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let contents = self
            .tapes
            .iter()
            .map(Tape::content)
            .collect::<Vec<_>>()
            .join("|");

        format!("{}|{}|{}", self.state, heads, contents)
    }

    /// A trace entry for this configuration: step number, state, head
    /// positions and read symbols, followed by a window of each tape.
    pub fn describe(&self, window: i64) -> String {
        let mut out = String::new();

        if let [tape] = self.tapes.as_slice() {
            let _ = write!(
                out,
                "Paso {}: Estado: {}, Posición cabezal: {}, Símbolo actual: '{}'\n  Cinta: {}",
                self.steps,
                self.state,
                tape.head_position(),
                tape.read(),
                tape.render(window)
            );
        } else {
            let symbols = self
                .tapes
                .iter()
                .map(|t| format!("'{}'", t.read()))
                .collect::<Vec<_>>()
                .join(", ");
            let heads = self
                .tapes
                .iter()
                .map(|t| t.head_position().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(
                out,
                "Paso {}: Estado: {}, Símbolos actuales: [{}], Posiciones: [{}]",
                self.steps, self.state, symbols, heads
            );
            for (i, tape) in self.tapes.iter().enumerate() {
                let _ = write!(out, "\n  Cinta {}: {}", i + 1, tape.render(window));
            }
        }

        out
    }
}

/// Observational equality: same state, same head positions, same minimal
/// contents. Step counters are ignored.
impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.compact() == other.compact()
    }
}

impl Eq for Configuration {}
