//! The simulation engine. Drives a configuration through the transition
//! function until one of four terminal conditions holds: the machine
//! accepts, halts without an applicable transition, provably loops, or
//! exhausts its step budget.

use crate::config::Configuration;
use crate::machine::Machine;
use crate::types::{SimulationResult, TmError, DEFAULT_MAX_STEPS};
use std::collections::HashSet;

/// Where the engine is in its lifecycle. Terminal phases persist until the
/// next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Ready,
    Running,
    Terminated,
}

/// A single-threaded simulator for one machine.
///
/// The machine is shared and read-only; the configuration, trace buffer and
/// visited set belong exclusively to this engine and are rebuilt for every
/// word.
pub struct Engine<'m> {
    machine: &'m Machine,
    config: Configuration,
    trace: Vec<Configuration>,
    trace_enabled: bool,
    visited: HashSet<String>,
    max_steps: usize,
    last_error: Option<String>,
    loop_detected: bool,
    phase: EnginePhase,
}

impl<'m> Engine<'m> {
    pub fn new(machine: &'m Machine) -> Self {
        Self {
            config: Configuration::new(
                machine.initial_state(),
                machine.tapes(),
                machine.blank_symbol(),
            ),
            machine,
            trace: Vec::new(),
            trace_enabled: false,
            visited: HashSet::new(),
            max_steps: DEFAULT_MAX_STEPS,
            last_error: None,
            loop_detected: false,
            phase: EnginePhase::Ready,
        }
    }

    /// Runs the machine on `input_word` until a terminal condition holds.
    ///
    /// The loop checks, in this order: the step budget (`max_steps`, 0
    /// meaning unbounded), acceptance, the existence of an applicable
    /// transition, and, after applying the step, whether the new
    /// configuration was already visited. The ordering is observable: a
    /// run that reaches the budget exactly when it would accept reports
    /// `Infinite`, and an accepting state with outgoing transitions still
    /// terminates the run.
    ///
    /// Structural problems (invalid machine, word outside the input
    /// alphabet) yield `Error` with `last_error` set, before any step is
    /// executed.
    pub fn simulate(
        &mut self,
        input_word: &str,
        enable_trace: bool,
        max_steps: usize,
    ) -> SimulationResult {
        self.trace_enabled = enable_trace;
        self.max_steps = max_steps;

        if let Err(error) = self.machine.validate() {
            self.last_error = Some(error.to_string());
            self.phase = EnginePhase::Terminated;
            return SimulationResult::Error;
        }

        if let Some(bad) = input_word
            .chars()
            .find(|&c| !self.machine.is_input_symbol(c))
        {
            self.last_error = Some(
                TmError::Input(format!(
                    "el símbolo '{bad}' no pertenece al alfabeto de entrada"
                ))
                .to_string(),
            );
            self.phase = EnginePhase::Terminated;
            return SimulationResult::Error;
        }

        self.reset(input_word);
        self.phase = EnginePhase::Running;
        self.snapshot();
        self.visited.insert(self.config.compact());

        let result = loop {
            if self.max_steps > 0 && self.config.steps() >= self.max_steps {
                break SimulationResult::Infinite;
            }

            if self.machine.is_accept_state(self.config.state()) {
                break SimulationResult::Accepted;
            }

            if !self.has_applicable_transition() {
                break SimulationResult::Rejected;
            }

            if let Err(error) = self.step() {
                self.last_error = Some(error.to_string());
                break SimulationResult::Error;
            }

            // The initial configuration was recorded before the loop, so a
            // repeat here is a true revisit.
            if !self.visited.insert(self.config.compact()) {
                self.loop_detected = true;
                break SimulationResult::Infinite;
            }
            self.snapshot();
        };

        self.phase = EnginePhase::Terminated;
        result
    }

    /// Applies one step: writes and moves on every tape (per tape, the
    /// write lands before the head moves), switches state and bumps the
    /// step counter. Fails when no transition applies.
    pub fn step(&mut self) -> Result<(), TmError> {
        let machine = self.machine;
        let symbols = self.config.read_symbols();

        let Some(transition) = machine.transition(self.config.state(), &symbols) else {
            return Err(TmError::Runtime(format!(
                "no hay transición aplicable desde el estado '{}'",
                self.config.state()
            )));
        };

        for i in 0..transition.arity() {
            self.config
                .write_and_move(i, transition.write[i], transition.moves[i]);
        }
        self.config.set_state(&transition.to_state);
        self.config.increment_steps();

        Ok(())
    }

    /// Whether some transition fires from the current configuration.
    pub fn has_applicable_transition(&self) -> bool {
        self.machine
            .transition(self.config.state(), &self.config.read_symbols())
            .is_some()
    }

    /// Discards the previous run and sets up `input_word` on the tapes.
    pub fn reset(&mut self, input_word: &str) {
        self.config.reset(self.machine.initial_state(), input_word);
        self.trace.clear();
        self.visited.clear();
        self.last_error = None;
        self.loop_detected = false;
        self.phase = EnginePhase::Ready;
    }

    pub fn current_configuration(&self) -> &Configuration {
        &self.config
    }

    /// The step-ordered trace, starting with the initial configuration.
    /// Empty unless the last run enabled tracing.
    pub fn trace(&self) -> &[Configuration] {
        &self.trace
    }

    pub fn step_count(&self) -> usize {
        self.config.steps()
    }

    /// Whether the last `Infinite` verdict came from a repeated
    /// configuration rather than from the step budget.
    pub fn loop_detected(&self) -> bool {
        self.loop_detected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn set_trace_enabled(&mut self, enable: bool) {
        self.trace_enabled = enable;
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    fn snapshot(&mut self) {
        if self.trace_enabled {
            self.trace.push(self.config.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;
    use crate::transition::Transition;
    use crate::types::Movement;

    /// Accepts words over {0, 1} holding an odd number of zeros.
    fn odd_zeros() -> Machine {
        let mut machine = Machine::mono('.');
        for state in ["q0", "q1", "qf"] {
            machine.add_state(state).unwrap();
        }
        machine.add_input_symbol('0').unwrap();
        machine.add_input_symbol('1').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("qf").unwrap();

        let edges = [
            ("q0", '0', "q1", '0', Movement::Right),
            ("q0", '1', "q0", '1', Movement::Right),
            ("q1", '0', "q0", '0', Movement::Right),
            ("q1", '1', "q1", '1', Movement::Right),
            ("q1", '.', "qf", '.', Movement::Stay),
        ];
        for (from, read, to, write, movement) in edges {
            machine
                .add_transition(Transition::mono(from, read, to, write, movement))
                .unwrap();
        }
        machine
    }

    /// Re-enters its initial configuration after two steps.
    fn two_step_looper() -> Machine {
        let mut machine = Machine::mono('.');
        machine.add_state("q0").unwrap();
        machine.add_state("q1").unwrap();
        machine.add_state("qf").unwrap();
        machine.add_input_symbol('a').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("qf").unwrap();
        machine
            .add_transition(Transition::mono("q0", 'a', "q1", 'a', Movement::Right))
            .unwrap();
        machine
            .add_transition(Transition::mono("q1", 'a', "q0", 'a', Movement::Left))
            .unwrap();
        machine
    }

    /// Marches right over blanks forever without ever repeating a
    /// configuration.
    fn right_marcher() -> Machine {
        let mut machine = Machine::mono('.');
        machine.add_state("q0").unwrap();
        machine.add_state("qf").unwrap();
        machine.add_input_symbol('a').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("qf").unwrap();
        machine
            .add_transition(Transition::mono("q0", '.', "q0", '.', Movement::Right))
            .unwrap();
        machine
    }

    #[test]
    fn test_odd_zeros_scenarios() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        assert_eq!(
            engine.simulate("0", false, 1000),
            SimulationResult::Accepted
        );
        assert_eq!(
            engine.simulate("00", false, 1000),
            SimulationResult::Rejected
        );
        assert_eq!(
            engine.simulate("000", false, 1000),
            SimulationResult::Accepted
        );
        assert_eq!(engine.simulate("", false, 1000), SimulationResult::Rejected);
        assert_eq!(
            engine.simulate("10101", false, 1000),
            SimulationResult::Rejected
        );
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        let first = engine.simulate("10101", false, 1000);
        let first_fingerprint = engine.current_configuration().compact();
        let first_steps = engine.step_count();

        let second = engine.simulate("10101", false, 1000);
        assert_eq!(first, second);
        assert_eq!(first_fingerprint, engine.current_configuration().compact());
        assert_eq!(first_steps, engine.step_count());
    }

    #[test]
    fn test_word_outside_alphabet_is_an_error_before_any_step() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        assert_eq!(engine.simulate("0x1", false, 1000), SimulationResult::Error);
        assert!(engine
            .last_error()
            .unwrap()
            .contains("no pertenece al alfabeto de entrada"));
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_invalid_machine_is_an_error() {
        let machine = Machine::mono('.');
        let mut engine = Engine::new(&machine);

        assert_eq!(engine.simulate("", false, 1000), SimulationResult::Error);
        assert!(engine.last_error().is_some());
    }

    #[test]
    fn test_loop_detection_beats_the_budget() {
        let machine = two_step_looper();
        let mut engine = Engine::new(&machine);

        let result = engine.simulate("aaa", false, 50);
        assert_eq!(result, SimulationResult::Infinite);
        assert!(engine.loop_detected());
        // The repeat shows up after two steps, long before the budget.
        assert_eq!(engine.step_count(), 2);
    }

    #[test]
    fn test_loop_detection_works_unbounded() {
        let machine = two_step_looper();
        let mut engine = Engine::new(&machine);

        let result = engine.simulate("aaa", false, 0);
        assert_eq!(result, SimulationResult::Infinite);
        assert!(engine.loop_detected());
    }

    #[test]
    fn test_budget_exhaustion_is_not_a_detected_loop() {
        let machine = right_marcher();
        let mut engine = Engine::new(&machine);

        let result = engine.simulate("", false, 10);
        assert_eq!(result, SimulationResult::Infinite);
        assert!(!engine.loop_detected());
        assert_eq!(engine.step_count(), 10);
    }

    #[test]
    fn test_budget_is_checked_before_accept() {
        // "0" is accepted after 2 steps, so a budget of exactly 2 reports
        // Infinite while any larger budget accepts.
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        assert_eq!(engine.simulate("0", false, 2), SimulationResult::Infinite);
        assert!(!engine.loop_detected());
        assert_eq!(engine.simulate("0", false, 3), SimulationResult::Accepted);
    }

    #[test]
    fn test_budget_monotonicity() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        assert_eq!(engine.simulate("0", false, 3), SimulationResult::Accepted);
        let steps = engine.step_count();
        for budget in [steps + 1, steps + 10, 0] {
            assert_eq!(
                engine.simulate("0", false, budget),
                SimulationResult::Accepted
            );
            assert_eq!(engine.step_count(), steps);
        }
    }

    #[test]
    fn test_accept_state_without_outgoing_transitions_accepts() {
        // qf has no outgoing transitions; acceptance must win over the
        // halt-reject check.
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);
        assert_eq!(engine.simulate("0", false, 0), SimulationResult::Accepted);
    }

    #[test]
    fn test_initial_accept_state_accepts_the_empty_word() {
        let mut machine = Machine::mono('.');
        machine.add_state("q0").unwrap();
        machine.add_input_symbol('a').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("q0").unwrap();

        let mut engine = Engine::new(&machine);
        assert_eq!(engine.simulate("", false, 1000), SimulationResult::Accepted);
        assert_eq!(engine.simulate("a", false, 1000), SimulationResult::Accepted);
        assert_eq!(engine.step_count(), 0);
    }

    #[test]
    fn test_trace_starts_with_the_initial_configuration() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        engine.simulate("0", true, 1000);
        let trace = engine.trace();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0].state(), "q0");
        assert_eq!(trace[0].steps(), 0);
        assert_eq!(trace[0].compact(), "q0|0|0");
        assert_eq!(trace.last().unwrap().state(), "qf");
    }

    #[test]
    fn test_trace_snapshots_are_independent() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);

        engine.simulate("00", true, 1000);
        let contents: Vec<String> = engine
            .trace()
            .iter()
            .map(|c| c.tape(0).content())
            .collect();
        // Every snapshot still shows the word even though the live
        // configuration kept moving.
        assert!(contents.iter().all(|c| c == "00"));
    }

    #[test]
    fn test_trace_is_empty_when_disabled() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);
        engine.simulate("0", false, 1000);
        assert!(engine.trace().is_empty());
    }

    #[test]
    fn test_phase_transitions() {
        let machine = odd_zeros();
        let mut engine = Engine::new(&machine);
        assert_eq!(engine.phase(), EnginePhase::Ready);

        engine.simulate("0", false, 1000);
        assert_eq!(engine.phase(), EnginePhase::Terminated);

        engine.reset("");
        assert_eq!(engine.phase(), EnginePhase::Ready);
    }

    #[test]
    fn test_multi_tape_unary_sum() {
        // Copies the ones on both sides of the separator onto the second
        // tape, accepting at the first blank.
        let mut machine = Machine::multi(2, '.').unwrap();
        machine.add_state("q0").unwrap();
        machine.add_state("qf").unwrap();
        machine.add_input_symbol('1').unwrap();
        machine.add_input_symbol('0').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("qf").unwrap();

        let edges = [
            ("q0", vec!['1', '.'], "q0", vec!['1', '1'], vec![Movement::Right, Movement::Right]),
            ("q0", vec!['0', '.'], "q0", vec!['0', '.'], vec![Movement::Right, Movement::Stay]),
            ("q0", vec!['.', '.'], "qf", vec!['.', '.'], vec![Movement::Stay, Movement::Stay]),
        ];
        for (from, read, to, write, moves) in edges {
            machine
                .add_transition(Transition::new(from, read, to, write, moves).unwrap())
                .unwrap();
        }

        let mut engine = Engine::new(&machine);
        let result = engine.simulate("1110111", false, 1000);
        assert_eq!(result, SimulationResult::Accepted);
        assert_eq!(engine.current_configuration().tape(1).content(), "111111");
    }
}
