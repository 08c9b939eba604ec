//! Parser for machine definition files, built on a `pest` grammar.
//!
//! The grammar (`grammar.pest`) only tokenizes: it turns the file into a
//! sequence of non-comment lines, each a list of whitespace-separated
//! tokens. The meaning of every line is positional and resolved here:
//! states, input alphabet, tape alphabet, initial state, blank symbol,
//! accepting states, then one transition per line. Files starting with a
//! `MULTICINTA <k>` marker declare a k-tape machine whose transition lines
//! carry comma-joined tuples.
//!
//! Every diagnostic names the offending 1-based line of the source file.

use crate::machine::{Machine, MachineKind};
use crate::transition::Transition;
use crate::types::{Movement, TmError};
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;
use std::collections::HashSet;

/// Marker token opening a multi-tape definition file.
pub const MULTI_TAPE_MARKER: &str = "MULTICINTA";

/// Pest parser for the line/token grammar in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// One non-comment line of the definition file.
struct RawLine<'a> {
    number: usize,
    tokens: Vec<&'a str>,
}

/// Parses a definition, detecting the machine kind from the first
/// non-comment line: files opening with `MULTICINTA` are multi-tape,
/// anything else is single-tape.
pub fn parse(input: &str) -> Result<Machine, TmError> {
    let lines = scan_lines(input)?;
    match lines.first() {
        Some(first) if first.tokens[0] == MULTI_TAPE_MARKER => build_multi(&lines),
        Some(_) => build_mono(&lines),
        None => Err(TmError::Validation(
            "no se pudo determinar el tipo de máquina: el fichero no tiene contenido".to_string(),
        )),
    }
}

/// Parses a single-tape definition.
pub fn parse_mono(input: &str) -> Result<Machine, TmError> {
    build_mono(&scan_lines(input)?)
}

/// Parses a multi-tape definition. The `MULTICINTA` marker is mandatory.
pub fn parse_multi(input: &str) -> Result<Machine, TmError> {
    build_multi(&scan_lines(input)?)
}

/// Serializes a single-tape machine back to the definition file format,
/// with sorted sections so the output is deterministic. Multi-tape
/// machines are not supported.
pub fn save(machine: &Machine) -> Result<String, TmError> {
    if machine.kind() != MachineKind::Mono {
        return Err(TmError::Validation(
            "sólo se pueden guardar máquinas de una cinta".to_string(),
        ));
    }
    if machine.accept_states().is_empty() {
        // The format is positional, so an empty accepting-states line
        // cannot be told apart from a missing section.
        return Err(TmError::Validation(
            "no se puede guardar una máquina sin estados de aceptación".to_string(),
        ));
    }

    let states = {
        let mut names: Vec<&str> = machine.states().iter().map(String::as_str).collect();
        names.sort_unstable();
        names.join(" ")
    };
    let accept_states = {
        let mut names: Vec<&str> = machine.accept_states().iter().map(String::as_str).collect();
        names.sort_unstable();
        names.join(" ")
    };
    let alphabet = |symbols: &HashSet<char>| {
        let mut symbols: Vec<char> = symbols.iter().copied().collect();
        symbols.sort_unstable();
        symbols
            .into_iter()
            .map(symbol_token)
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = String::new();
    out.push_str("# Definición de Máquina de Turing\n");
    out.push_str("# Estados\n");
    out.push_str(&states);
    out.push_str("\n# Alfabeto de entrada\n");
    out.push_str(&alphabet(machine.input_alphabet()));
    out.push_str("\n# Alfabeto de cinta\n");
    out.push_str(&alphabet(machine.tape_alphabet()));
    out.push_str("\n# Estado inicial\n");
    out.push_str(machine.initial_state());
    out.push_str("\n# Símbolo blanco\n");
    out.push_str(&symbol_token(machine.blank_symbol()));
    out.push_str("\n# Estados de aceptación\n");
    out.push_str(&accept_states);
    out.push_str("\n# Transiciones\n");
    for transition in machine.all_transitions() {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            transition.from_state,
            symbol_token(transition.read[0]),
            transition.to_state,
            symbol_token(transition.write[0]),
            transition.moves[0].as_char()
        ));
    }

    Ok(out)
}

/// Runs the grammar and collects the non-comment lines with their 1-based
/// line numbers.
fn scan_lines(input: &str) -> Result<Vec<RawLine<'_>>, TmError> {
    let mut parsed =
        DefinitionParser::parse(Rule::file, input).map_err(|error| from_pest_error(&error))?;
    let file = match parsed.next() {
        Some(file) => file,
        None => return Ok(Vec::new()),
    };

    let mut lines = Vec::new();
    for pair in file.into_inner() {
        if pair.as_rule() != Rule::line {
            continue;
        }
        let number = pair.as_span().start_pos().line_col().0;
        let tokens: Vec<&str> = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::token)
            .map(|p| p.as_str())
            .collect();
        if !tokens.is_empty() {
            lines.push(RawLine { number, tokens });
        }
    }

    Ok(lines)
}

fn from_pest_error(error: &pest::error::Error<Rule>) -> TmError {
    let line = match error.line_col {
        pest::error::LineColLocation::Pos((line, _)) => line,
        pest::error::LineColLocation::Span((line, _), _) => line,
    };
    TmError::parse(line, error.variant.message().to_string())
}

/// Declared sections, shared by both builders so closure checks read the
/// same for single and multi-tape files.
struct Declarations {
    states: HashSet<String>,
    tape_alphabet: HashSet<char>,
}

impl Declarations {
    fn require_state(&self, state: &str, role: &str, line: usize) -> Result<(), TmError> {
        if self.states.contains(state) {
            return Ok(());
        }
        Err(TmError::Validation(format!(
            "{role} '{state}' no está declarado (línea {line})"
        )))
    }

    fn require_tape_symbol(&self, symbol: char, line: usize) -> Result<(), TmError> {
        if self.tape_alphabet.contains(&symbol) {
            return Ok(());
        }
        Err(TmError::Validation(format!(
            "el símbolo '{symbol}' no está en el alfabeto de cinta (línea {line})"
        )))
    }
}

/// Reads the six header sections shared by both machine shapes and applies
/// them to `machine`, returning the declared sets for the transition pass.
fn apply_header(machine: &mut Machine, sections: &[&RawLine]) -> Result<Declarations, TmError> {
    let [states_line, input_line, tape_line, initial_line, blank_line, accept_line] =
        sections else {
        return Err(TmError::Validation(
            "archivo incompleto: faltan secciones obligatorias".to_string(),
        ));
    };

    // States.
    let mut states = HashSet::new();
    for token in &states_line.tokens {
        machine
            .add_state(token)
            .map_err(|e| at_line(states_line.number, e))?;
        states.insert(token.to_string());
    }

    // The blank is needed before the alphabets to diagnose collisions, so
    // it is decoded out of order.
    if blank_line.tokens.len() != 1 {
        return Err(TmError::parse(
            blank_line.number,
            "debe haber exactamente un símbolo blanco",
        ));
    }
    let blank = symbol_from_token(blank_line.tokens[0], blank_line.number)?;

    // Input alphabet.
    let mut input_alphabet = HashSet::new();
    for token in &input_line.tokens {
        let symbol = symbol_from_token(token, input_line.number)?;
        if symbol == blank {
            return Err(TmError::Validation(format!(
                "el símbolo blanco no puede estar en el alfabeto de entrada (línea {})",
                input_line.number
            )));
        }
        machine
            .add_input_symbol(symbol)
            .map_err(|e| at_line(input_line.number, e))?;
        input_alphabet.insert(symbol);
    }

    // Tape alphabet, which must cover the input alphabet and the blank.
    let mut tape_alphabet = HashSet::new();
    for token in &tape_line.tokens {
        let symbol = symbol_from_token(token, tape_line.number)?;
        machine.add_tape_symbol(symbol);
        tape_alphabet.insert(symbol);
    }
    for &symbol in &input_alphabet {
        if !tape_alphabet.contains(&symbol) {
            return Err(TmError::Validation(format!(
                "el alfabeto de cinta no contiene el símbolo de entrada '{symbol}' (línea {})",
                tape_line.number
            )));
        }
    }
    if !tape_alphabet.contains(&blank) {
        return Err(TmError::Validation(format!(
            "el símbolo blanco '{blank}' no está en el alfabeto de cinta (línea {})",
            blank_line.number
        )));
    }

    // Initial state: exactly one token, and it must be declared.
    if initial_line.tokens.len() != 1 {
        return Err(TmError::parse(
            initial_line.number,
            "debe haber exactamente un estado inicial",
        ));
    }
    let initial = initial_line.tokens[0];
    let declared = Declarations {
        states,
        tape_alphabet,
    };
    declared.require_state(initial, "el estado inicial", initial_line.number)?;
    machine
        .set_initial_state(initial)
        .map_err(|e| at_line(initial_line.number, e))?;

    // Accepting states, each declared.
    for token in &accept_line.tokens {
        declared.require_state(token, "el estado de aceptación", accept_line.number)?;
        machine
            .add_accept_state(token)
            .map_err(|e| at_line(accept_line.number, e))?;
    }

    Ok(declared)
}

fn build_mono(lines: &[RawLine]) -> Result<Machine, TmError> {
    if lines.len() < 6 {
        return Err(TmError::Validation(
            "archivo incompleto: faltan secciones obligatorias".to_string(),
        ));
    }

    let blank = blank_of(&lines[4])?;
    let mut machine = Machine::mono(blank);
    let sections: Vec<&RawLine> = lines[..6].iter().collect();
    let declared = apply_header(&mut machine, &sections)?;

    for line in &lines[6..] {
        let transition = mono_transition(line, &declared)?;
        add_checked(&mut machine, transition, line.number)?;
    }

    machine.validate()?;
    Ok(machine)
}

fn build_multi(lines: &[RawLine]) -> Result<Machine, TmError> {
    let header = lines.first().ok_or_else(|| {
        TmError::Validation(
            "no se pudo determinar el tipo de máquina: el fichero no tiene contenido".to_string(),
        )
    })?;
    if header.tokens[0] != MULTI_TAPE_MARKER {
        return Err(TmError::parse(
            header.number,
            format!("se esperaba el marcador {MULTI_TAPE_MARKER} al inicio del archivo"),
        ));
    }
    if header.tokens.len() != 2 {
        return Err(TmError::parse(
            header.number,
            format!("formato incorrecto, se esperaba: {MULTI_TAPE_MARKER} <num_cintas>"),
        ));
    }
    let tapes: usize = header.tokens[1].parse().unwrap_or(0);
    if tapes == 0 {
        return Err(TmError::parse(
            header.number,
            "el número de cintas debe ser un entero mayor que 0",
        ));
    }

    if lines.len() < 7 {
        return Err(TmError::Validation(
            "archivo incompleto: faltan secciones obligatorias".to_string(),
        ));
    }

    let blank = blank_of(&lines[5])?;
    let mut machine = Machine::multi(tapes, blank)?;
    let sections: Vec<&RawLine> = lines[1..7].iter().collect();
    let declared = apply_header(&mut machine, &sections)?;

    for line in &lines[7..] {
        let transition = multi_transition(line, tapes, &declared)?;
        add_checked(&mut machine, transition, line.number)?;
    }

    machine.validate()?;
    Ok(machine)
}

/// Pre-reads the blank symbol so the machine can be constructed with it
/// before the header sections are applied in order.
fn blank_of(line: &RawLine) -> Result<char, TmError> {
    if line.tokens.len() != 1 {
        return Err(TmError::parse(
            line.number,
            "debe haber exactamente un símbolo blanco",
        ));
    }
    symbol_from_token(line.tokens[0], line.number)
}

/// Parses `from read to write move`.
fn mono_transition(line: &RawLine, declared: &Declarations) -> Result<Transition, TmError> {
    let [from, read, to, write, movement] = line.tokens.as_slice() else {
        return Err(TmError::parse(
            line.number,
            "la transición debe tener 5 elementos: \
             estado_origen símbolo_leído estado_destino símbolo_escrito movimiento",
        ));
    };

    declared.require_state(from, "el estado origen", line.number)?;
    declared.require_state(to, "el estado destino", line.number)?;

    let read = symbol_from_token(read, line.number)?;
    let write = symbol_from_token(write, line.number)?;
    declared.require_tape_symbol(read, line.number)?;
    declared.require_tape_symbol(write, line.number)?;

    Ok(Transition::mono(
        *from,
        read,
        *to,
        write,
        movement_from_token(movement, line.number)?,
    ))
}

/// Parses `from r1,…,rk to w1,…,wk m1,…,mk`.
fn multi_transition(
    line: &RawLine,
    tapes: usize,
    declared: &Declarations,
) -> Result<Transition, TmError> {
    let [from, reads, to, writes, movements] = line.tokens.as_slice() else {
        return Err(TmError::parse(
            line.number,
            "la transición multicinta debe tener 5 elementos: \
             estado_origen símbolos_leídos estado_destino símbolos_escritos movimientos",
        ));
    };

    declared.require_state(from, "el estado origen", line.number)?;
    declared.require_state(to, "el estado destino", line.number)?;

    let read = symbol_tuple(reads, tapes, "símbolos leídos", line.number)?;
    let write = symbol_tuple(writes, tapes, "símbolos escritos", line.number)?;
    for &symbol in read.iter().chain(&write) {
        declared.require_tape_symbol(symbol, line.number)?;
    }

    let movement_tokens: Vec<&str> = movements.split(',').collect();
    if movement_tokens.len() != tapes {
        return Err(TmError::parse(
            line.number,
            format!(
                "el número de movimientos ({}) no coincide con el número de cintas ({tapes})",
                movement_tokens.len()
            ),
        ));
    }
    let moves = movement_tokens
        .iter()
        .map(|token| movement_from_token(token, line.number))
        .collect::<Result<Vec<_>, _>>()?;

    Transition::new(*from, read, *to, write, moves)
}

/// Rejects a duplicate (state, read tuple) key with a line-numbered
/// diagnostic, then records the transition.
fn add_checked(machine: &mut Machine, transition: Transition, line: usize) -> Result<(), TmError> {
    if machine
        .transition(&transition.from_state, &transition.read)
        .is_some()
    {
        return Err(TmError::parse(
            line,
            format!(
                "ya existe una transición para el estado '{}' y símbolos leídos '{}'",
                transition.from_state,
                transition
                    .read
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        ));
    }
    machine
        .add_transition(transition)
        .map_err(|e| at_line(line, e))
}

/// Splits a comma-joined symbol tuple and checks its length against the
/// tape count.
fn symbol_tuple(
    token: &str,
    tapes: usize,
    role: &str,
    line: usize,
) -> Result<Vec<char>, TmError> {
    let parts: Vec<&str> = token.split(',').collect();
    if parts.len() != tapes {
        return Err(TmError::parse(
            line,
            format!(
                "el número de {role} ({}) no coincide con el número de cintas ({tapes})",
                parts.len()
            ),
        ));
    }
    parts
        .iter()
        .map(|part| symbol_from_token(part, line))
        .collect()
}

/// Decodes a symbol token: a single character, or the aliases `espacio`
/// and `space` for a blank space.
fn symbol_from_token(token: &str, line: usize) -> Result<char, TmError> {
    if token == "espacio" || token == "space" {
        return Ok(' ');
    }

    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        (None, _) => Err(TmError::parse(line, "símbolo vacío")),
        _ => Err(TmError::parse(
            line,
            format!("símbolo inválido '{token}' (debe ser un solo carácter)"),
        )),
    }
}

fn movement_from_token(token: &str, line: usize) -> Result<Movement, TmError> {
    let symbol = symbol_from_token(token, line)?;
    Movement::from_char(symbol).ok_or_else(|| {
        TmError::parse(
            line,
            format!("movimiento inválido '{symbol}' (debe ser L, R o S)"),
        )
    })
}

/// Renders a symbol as a file token, mapping the space back to its alias.
fn symbol_token(symbol: char) -> String {
    if symbol == ' ' {
        "espacio".to_string()
    } else {
        symbol.to_string()
    }
}

/// Replaces the location of a builder error with the definition line that
/// triggered it.
fn at_line(line: usize, error: TmError) -> TmError {
    match error {
        TmError::Validation(message) => TmError::parse(line, message),
        other => other,
    }
}
