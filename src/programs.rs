//! A registry of sample machines embedded in the crate. The definitions
//! live under `machines/` and are parsed on first use; they double as
//! executable documentation of the file format.

use crate::machine::{Machine, MachineKind};
use crate::parser;
use crate::types::TmError;
use std::sync::RwLock;

/// Embedded definition texts, keyed by name.
const MACHINE_TEXTS: [(&str, &str); 6] = [
    ("impar-ceros", include_str!("../machines/impar-ceros.tm")),
    ("anbn", include_str!("../machines/anbn.tm")),
    ("acepta-todo", include_str!("../machines/acepta-todo.tm")),
    ("suma-unaria", include_str!("../machines/suma-unaria.tm")),
    ("anbn-2c", include_str!("../machines/anbn-2c.tm")),
    ("bucle", include_str!("../machines/bucle.tm")),
];

lazy_static::lazy_static! {
    static ref MACHINES: RwLock<Vec<(String, Machine)>> = RwLock::new(Vec::new());
}

/// Summary of one embedded machine.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub name: String,
    pub kind: MachineKind,
    pub tapes: usize,
    pub states: usize,
    pub transitions: usize,
}

/// Access to the embedded machine registry.
pub struct Programs;

impl Programs {
    /// Parses the embedded definitions into the registry. Safe to call
    /// more than once.
    pub fn load() -> Result<(), TmError> {
        let mut machines = Vec::new();
        for (name, text) in MACHINE_TEXTS {
            let machine = parser::parse(text).map_err(|e| {
                TmError::File(format!("la máquina embebida '{name}' no es válida: {e}"))
            })?;
            machines.push((name.to_string(), machine));
        }

        let mut guard = MACHINES
            .write()
            .map_err(|_| TmError::File("no se pudo bloquear el registro".to_string()))?;
        *guard = machines;
        Ok(())
    }

    fn ensure_loaded() -> Result<(), TmError> {
        let empty = MACHINES
            .read()
            .map(|machines| machines.is_empty())
            .unwrap_or(true);
        if empty {
            Self::load()?;
        }
        Ok(())
    }

    /// Number of embedded machines.
    pub fn count() -> usize {
        let _ = Self::ensure_loaded();
        MACHINES.read().map(|machines| machines.len()).unwrap_or(0)
    }

    /// All registry names, in definition order.
    pub fn names() -> Vec<String> {
        let _ = Self::ensure_loaded();
        MACHINES
            .read()
            .map(|machines| machines.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Fetches a machine by name.
    pub fn machine(name: &str) -> Result<Machine, TmError> {
        Self::ensure_loaded()?;
        MACHINES
            .read()
            .map_err(|_| TmError::File("no se pudo bloquear el registro".to_string()))?
            .iter()
            .find(|(machine_name, _)| machine_name == name)
            .map(|(_, machine)| machine.clone())
            .ok_or_else(|| TmError::File(format!("no existe la máquina embebida '{name}'")))
    }

    /// Fetches a machine by position.
    pub fn machine_at(index: usize) -> Result<Machine, TmError> {
        Self::ensure_loaded()?;
        MACHINES
            .read()
            .map_err(|_| TmError::File("no se pudo bloquear el registro".to_string()))?
            .get(index)
            .map(|(_, machine)| machine.clone())
            .ok_or_else(|| {
                TmError::File(format!("índice de máquina fuera de rango: {index}"))
            })
    }

    /// The raw definition text for a name, when present.
    pub fn source(name: &str) -> Option<&'static str> {
        MACHINE_TEXTS
            .iter()
            .find(|(machine_name, _)| *machine_name == name)
            .map(|(_, text)| *text)
    }

    /// Summary of the machine at `index`.
    pub fn info(index: usize) -> Result<ProgramInfo, TmError> {
        Self::ensure_loaded()?;
        let guard = MACHINES
            .read()
            .map_err(|_| TmError::File("no se pudo bloquear el registro".to_string()))?;
        let (name, machine) = guard
            .get(index)
            .ok_or_else(|| TmError::File(format!("índice de máquina fuera de rango: {index}")))?;

        Ok(ProgramInfo {
            name: name.clone(),
            kind: machine.kind(),
            tapes: machine.tapes(),
            states: machine.states().len(),
            transitions: machine.transition_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::types::SimulationResult;

    fn run(machine: &Machine, word: &str) -> SimulationResult {
        Engine::new(machine).simulate(word, false, 1000)
    }

    #[test]
    fn test_all_embedded_machines_load_and_validate() {
        Programs::load().unwrap();
        assert_eq!(Programs::count(), 6);

        for index in 0..Programs::count() {
            let machine = Programs::machine_at(index).unwrap();
            assert!(machine.is_valid(), "máquina {index} inválida");
        }
    }

    #[test]
    fn test_names_follow_definition_order() {
        let names = Programs::names();
        assert_eq!(
            names,
            vec![
                "impar-ceros",
                "anbn",
                "acepta-todo",
                "suma-unaria",
                "anbn-2c",
                "bucle"
            ]
        );
    }

    #[test]
    fn test_machine_by_name() {
        let machine = Programs::machine("suma-unaria").unwrap();
        assert_eq!(machine.kind(), MachineKind::Multi);
        assert_eq!(machine.tapes(), 2);

        assert!(Programs::machine("inexistente").is_err());
    }

    #[test]
    fn test_source_exposes_the_raw_text() {
        let text = Programs::source("bucle").unwrap();
        assert!(text.contains("q0 a q1 a R"));
        assert!(Programs::source("inexistente").is_none());
    }

    #[test]
    fn test_odd_zeros_machine() {
        let machine = Programs::machine("impar-ceros").unwrap();
        assert_eq!(run(&machine, "0"), SimulationResult::Accepted);
        assert_eq!(run(&machine, "00"), SimulationResult::Rejected);
        assert_eq!(run(&machine, "000"), SimulationResult::Accepted);
        assert_eq!(run(&machine, ""), SimulationResult::Rejected);
        assert_eq!(run(&machine, "10101"), SimulationResult::Rejected);
    }

    #[test]
    fn test_anbn_machine() {
        let machine = Programs::machine("anbn").unwrap();
        assert_eq!(run(&machine, "ab"), SimulationResult::Accepted);
        assert_eq!(run(&machine, "aaabbb"), SimulationResult::Accepted);
        assert_eq!(run(&machine, "aab"), SimulationResult::Rejected);
        assert_eq!(run(&machine, ""), SimulationResult::Rejected);
        assert_eq!(run(&machine, "ba"), SimulationResult::Rejected);
    }

    #[test]
    fn test_accept_all_machine() {
        let machine = Programs::machine("acepta-todo").unwrap();
        assert_eq!(run(&machine, ""), SimulationResult::Accepted);
        assert_eq!(run(&machine, "abc"), SimulationResult::Accepted);
    }

    #[test]
    fn test_unary_sum_machine() {
        let machine = Programs::machine("suma-unaria").unwrap();
        let mut engine = Engine::new(&machine);
        assert_eq!(
            engine.simulate("1110111", false, 1000),
            SimulationResult::Accepted
        );
        assert_eq!(engine.current_configuration().tape(1).content(), "111111");
    }

    #[test]
    fn test_two_tape_anbn_machine() {
        let machine = Programs::machine("anbn-2c").unwrap();
        assert_eq!(run(&machine, "aabb"), SimulationResult::Accepted);
        assert_eq!(run(&machine, "aab"), SimulationResult::Rejected);
    }

    #[test]
    fn test_looper_machine_is_caught_by_fingerprints() {
        let machine = Programs::machine("bucle").unwrap();
        let mut engine = Engine::new(&machine);

        let result = engine.simulate("aaa", false, 50);
        assert_eq!(result, SimulationResult::Infinite);
        // The repeated configuration is the reason, not the budget.
        assert!(engine.loop_detected());
        assert!(engine.step_count() < 50);
    }

    #[test]
    fn test_info_summarizes_a_machine() {
        let info = Programs::info(0).unwrap();
        assert_eq!(info.name, "impar-ceros");
        assert_eq!(info.kind, MachineKind::Mono);
        assert_eq!(info.tapes, 1);
        assert_eq!(info.states, 3);
        assert_eq!(info.transitions, 5);

        assert!(Programs::info(99).is_err());
    }
}
