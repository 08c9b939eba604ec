//! Core of a batch simulator for deterministic Turing machines.
//!
//! A machine definition (single-tape, or multi-tape via the `MULTICINTA`
//! marker) is parsed into a validated [`Machine`]; an [`Engine`] then runs
//! input words over sparse bi-infinite tapes, classifying each one as
//! accepted, rejected, provably looping or out of budget.

pub mod config;
pub mod engine;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod transition;
pub mod types;

/// Re-exports the `Rule` enum generated by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the instantaneous-description type.
pub use config::Configuration;
/// Re-exports the simulation engine and its lifecycle phases.
pub use engine::{Engine, EnginePhase};
/// Re-exports the file loading helpers.
pub use loader::Loader;
/// Re-exports the machine definition and its kind tag.
pub use machine::{Machine, MachineKind};
/// Re-exports the parsing entry points.
pub use parser::{parse, parse_mono, parse_multi, save};
/// Re-exports the embedded machine registry.
pub use programs::{ProgramInfo, Programs};
/// Re-exports the sparse tape.
pub use tape::Tape;
/// Re-exports the transition record.
pub use transition::Transition;
/// Re-exports the shared value types and defaults.
pub use types::{
    Movement, SimulationResult, TmError, DEFAULT_BLANK_SYMBOL, DEFAULT_MAX_STEPS,
    FINAL_TAPE_WINDOW, TRACE_WINDOW,
};
