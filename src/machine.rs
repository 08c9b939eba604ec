//! The validated machine definition: state set, alphabets, initial and
//! accepting states, blank symbol, tape count and the indexed transition
//! function. Built incrementally by the parser (or by hand), read-only
//! once simulation starts.

use crate::transition::Transition;
use crate::types::TmError;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

/// Whether the machine was defined in the single-tape or the `MULTICINTA`
/// form. A multi-tape machine may still have one tape; the tag only drives
/// parsing and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineKind {
    Mono,
    Multi,
}

/// A deterministic Turing machine over `tapes` tapes.
///
/// The transition function is a partial map keyed by the pair
/// (state, read tuple); determinism holds by construction because inserting
/// a second edge under an existing key is rejected.
#[derive(Debug, Clone)]
pub struct Machine {
    kind: MachineKind,
    states: HashSet<String>,
    input_alphabet: HashSet<char>,
    tape_alphabet: HashSet<char>,
    initial_state: String,
    accept_states: HashSet<String>,
    blank: char,
    tapes: usize,
    transitions: HashMap<(String, Vec<char>), Transition>,
}

impl Machine {
    /// Creates an empty single-tape machine.
    pub fn mono(blank: char) -> Self {
        Self::empty(MachineKind::Mono, 1, blank)
    }

    /// Creates an empty multi-tape machine with `tapes` tapes.
    pub fn multi(tapes: usize, blank: char) -> Result<Self, TmError> {
        if tapes == 0 {
            return Err(TmError::Validation(
                "el número de cintas debe ser mayor que 0".to_string(),
            ));
        }
        Ok(Self::empty(MachineKind::Multi, tapes, blank))
    }

    fn empty(kind: MachineKind, tapes: usize, blank: char) -> Self {
        let mut tape_alphabet = HashSet::new();
        // The blank is a tape symbol from the start.
        tape_alphabet.insert(blank);

        Self {
            kind,
            states: HashSet::new(),
            input_alphabet: HashSet::new(),
            tape_alphabet,
            initial_state: String::new(),
            accept_states: HashSet::new(),
            blank,
            tapes,
            transitions: HashMap::new(),
        }
    }

    pub fn kind(&self) -> MachineKind {
        self.kind
    }

    pub fn tapes(&self) -> usize {
        self.tapes
    }

    pub fn blank_symbol(&self) -> char {
        self.blank
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn states(&self) -> &HashSet<String> {
        &self.states
    }

    pub fn input_alphabet(&self) -> &HashSet<char> {
        &self.input_alphabet
    }

    pub fn tape_alphabet(&self) -> &HashSet<char> {
        &self.tape_alphabet
    }

    pub fn accept_states(&self) -> &HashSet<String> {
        &self.accept_states
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Adds a state. State names must be non-empty.
    pub fn add_state(&mut self, state: &str) -> Result<(), TmError> {
        if state.is_empty() {
            return Err(TmError::Validation(
                "el nombre del estado no puede estar vacío".to_string(),
            ));
        }
        self.states.insert(state.to_string());
        Ok(())
    }

    /// Adds a symbol to the input alphabet. The blank is never an input
    /// symbol; input symbols are tape symbols as well.
    pub fn add_input_symbol(&mut self, symbol: char) -> Result<(), TmError> {
        if symbol == self.blank {
            return Err(TmError::Validation(
                "el símbolo blanco no puede estar en el alfabeto de entrada".to_string(),
            ));
        }
        self.input_alphabet.insert(symbol);
        self.tape_alphabet.insert(symbol);
        Ok(())
    }

    /// Adds a symbol to the tape alphabet.
    pub fn add_tape_symbol(&mut self, symbol: char) {
        self.tape_alphabet.insert(symbol);
    }

    /// Sets the initial state, inserting it into the state set.
    pub fn set_initial_state(&mut self, state: &str) -> Result<(), TmError> {
        self.add_state(state)?;
        self.initial_state = state.to_string();
        Ok(())
    }

    /// Adds an accepting state, inserting it into the state set.
    pub fn add_accept_state(&mut self, state: &str) -> Result<(), TmError> {
        self.add_state(state)?;
        self.accept_states.insert(state.to_string());
        Ok(())
    }

    /// Changes the blank symbol. Redefinition is rejected once transitions
    /// exist, so recorded edges cannot be reinterpreted under a new blank.
    pub fn set_blank_symbol(&mut self, symbol: char) -> Result<(), TmError> {
        if !self.transitions.is_empty() {
            return Err(TmError::Validation(
                "no se puede redefinir el símbolo blanco después de añadir transiciones"
                    .to_string(),
            ));
        }
        if self.input_alphabet.contains(&symbol) {
            return Err(TmError::Validation(
                "el símbolo blanco no puede estar en el alfabeto de entrada".to_string(),
            ));
        }
        self.blank = symbol;
        self.tape_alphabet.insert(symbol);
        Ok(())
    }

    /// Records one transition. The endpoint states and the read/write
    /// symbols are inserted into the state set and tape alphabet; a second
    /// edge with the same (state, read tuple) key is rejected.
    pub fn add_transition(&mut self, transition: Transition) -> Result<(), TmError> {
        if transition.arity() != self.tapes {
            return Err(TmError::Validation(format!(
                "la transición opera sobre {} cintas y la máquina tiene {}",
                transition.arity(),
                self.tapes
            )));
        }

        self.add_state(&transition.from_state)?;
        self.add_state(&transition.to_state)?;
        for i in 0..transition.arity() {
            self.tape_alphabet.insert(transition.read[i]);
            self.tape_alphabet.insert(transition.write[i]);
        }

        let key = (transition.from_state.clone(), transition.read.clone());
        if self.transitions.contains_key(&key) {
            return Err(TmError::Validation(format!(
                "ya existe una transición para el estado '{}' y símbolos {}",
                transition.from_state,
                render_symbols(&transition.read)
            )));
        }

        self.transitions.insert(key, transition);
        Ok(())
    }

    /// Looks up the unique transition for `state` reading `symbols`.
    /// Returns `None` when no edge is defined or the tuple length does not
    /// match the tape count.
    pub fn transition(&self, state: &str, symbols: &[char]) -> Option<&Transition> {
        if symbols.len() != self.tapes {
            return None;
        }
        self.transitions.get(&(state.to_string(), symbols.to_vec()))
    }

    /// All transitions in a deterministic order (by source state, then by
    /// read tuple). Used for serialization and summaries.
    pub fn all_transitions(&self) -> Vec<&Transition> {
        let mut transitions: Vec<&Transition> = self.transitions.values().collect();
        transitions.sort_by(|a, b| {
            (&a.from_state, &a.read).cmp(&(&b.from_state, &b.read))
        });
        transitions
    }

    pub fn is_accept_state(&self, state: &str) -> bool {
        self.accept_states.contains(state)
    }

    pub fn is_input_symbol(&self, symbol: char) -> bool {
        self.input_alphabet.contains(&symbol)
    }

    pub fn is_tape_symbol(&self, symbol: char) -> bool {
        self.tape_alphabet.contains(&symbol)
    }

    /// Whether every character of `word` belongs to the input alphabet.
    pub fn is_valid_input_word(&self, word: &str) -> bool {
        word.chars().all(|c| self.is_input_symbol(c))
    }

    /// Whether the machine satisfies its structural invariants.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Checks the structural invariants, reporting the first violation:
    /// the state set is non-empty and contains the initial and accepting
    /// states; the blank is a tape symbol but not an input symbol; the
    /// input alphabet is contained in the tape alphabet; and every
    /// transition has the machine's arity and uses declared states and
    /// tape symbols.
    pub fn validate(&self) -> Result<(), TmError> {
        if self.states.is_empty() {
            return Err(TmError::Validation("no hay estados definidos".to_string()));
        }

        if self.initial_state.is_empty() {
            return Err(TmError::Validation(
                "el estado inicial no está definido".to_string(),
            ));
        }
        if !self.states.contains(&self.initial_state) {
            return Err(TmError::Validation(format!(
                "el estado inicial '{}' no pertenece al conjunto de estados",
                self.initial_state
            )));
        }

        for state in &self.accept_states {
            if !self.states.contains(state) {
                return Err(TmError::Validation(format!(
                    "el estado de aceptación '{state}' no pertenece al conjunto de estados"
                )));
            }
        }

        if !self.tape_alphabet.contains(&self.blank) {
            return Err(TmError::Validation(
                "el símbolo blanco no está en el alfabeto de cinta".to_string(),
            ));
        }

        for &symbol in &self.input_alphabet {
            if symbol == self.blank {
                return Err(TmError::Validation(
                    "el símbolo blanco no puede estar en el alfabeto de entrada".to_string(),
                ));
            }
            if !self.tape_alphabet.contains(&symbol) {
                return Err(TmError::Validation(format!(
                    "el símbolo de entrada '{symbol}' no está en el alfabeto de cinta"
                )));
            }
        }

        for transition in self.transitions.values() {
            if transition.arity() != self.tapes {
                return Err(TmError::Validation(format!(
                    "la transición '{transition}' no opera sobre {} cintas",
                    self.tapes
                )));
            }
            if !self.states.contains(&transition.from_state)
                || !self.states.contains(&transition.to_state)
            {
                return Err(TmError::Validation(format!(
                    "la transición '{transition}' usa estados no declarados"
                )));
            }
            for i in 0..transition.arity() {
                if !self.tape_alphabet.contains(&transition.read[i])
                    || !self.tape_alphabet.contains(&transition.write[i])
                {
                    return Err(TmError::Validation(format!(
                        "la transición '{transition}' usa símbolos fuera del alfabeto de cinta"
                    )));
                }
            }
        }

        Ok(())
    }

    /// A human readable summary of the machine, with every set rendered in
    /// sorted order so the output is deterministic.
    pub fn info(&self) -> String {
        let mut out = String::new();

        match self.kind {
            MachineKind::Mono => {
                out.push_str("=== Información de la Máquina de Turing ===\n");
            }
            MachineKind::Multi => {
                out.push_str("=== Información de la Máquina de Turing Multicinta ===\n");
                let _ = writeln!(out, "Número de cintas: {}", self.tapes);
            }
        }

        let _ = writeln!(
            out,
            "Estados ({}): {{{}}}",
            self.states.len(),
            sorted_states(&self.states)
        );
        let _ = writeln!(out, "Estado inicial: {}", self.initial_state);
        let _ = writeln!(
            out,
            "Estados de aceptación ({}): {{{}}}",
            self.accept_states.len(),
            sorted_states(&self.accept_states)
        );
        let _ = writeln!(
            out,
            "Alfabeto de entrada ({}): {{{}}}",
            self.input_alphabet.len(),
            sorted_symbols(&self.input_alphabet)
        );
        let _ = writeln!(
            out,
            "Alfabeto de cinta ({}): {{{}}}",
            self.tape_alphabet.len(),
            sorted_symbols(&self.tape_alphabet)
        );
        let _ = writeln!(out, "Símbolo blanco: '{}'", self.blank);
        let _ = writeln!(out, "Número de transiciones: {}", self.transitions.len());
        let _ = write!(
            out,
            "Máquina válida: {}",
            if self.is_valid() { "Sí" } else { "No" }
        );

        out
    }
}

fn sorted_states(states: &HashSet<String>) -> String {
    let mut names: Vec<&str> = states.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}

fn sorted_symbols(symbols: &HashSet<char>) -> String {
    let mut symbols: Vec<char> = symbols.iter().copied().collect();
    symbols.sort_unstable();
    symbols
        .into_iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_symbols(symbols: &[char]) -> String {
    let rendered = symbols
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rendered}]")
}
