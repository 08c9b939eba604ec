use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::exit;

use cinta::{
    Configuration, Engine, Loader, Machine, MachineKind, SimulationResult, DEFAULT_MAX_STEPS,
    FINAL_TAPE_WINDOW, TRACE_WINDOW,
};

#[derive(Parser)]
#[clap(
    author,
    version,
    about = "Simulador por lotes de Máquinas de Turing deterministas",
    arg_required_else_help = true
)]
struct Cli {
    /// Fichero de definición de la máquina (monocinta o MULTICINTA)
    machine: PathBuf,

    /// Muestra la traza paso a paso después de cada resultado
    #[clap(long)]
    trace: bool,

    /// Lee las palabras de un fichero (una por línea) en vez de stdin
    #[clap(long, value_name = "FICHERO")]
    words: Option<PathBuf>,

    /// Diagnostica palabras con símbolos fuera del alfabeto de entrada
    #[clap(long)]
    strict: bool,

    /// Límite de pasos de la simulación (0 = sin límite)
    #[clap(long, value_name = "N", default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Muestra información de la máquina y termina
    #[clap(long)]
    info: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // An explicit --help or --version exits with 0; every other
            // argument problem is a usage error.
            let code = match error.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = error.print();
            exit(code);
        }
    };

    let machine = match Loader::load_machine(&cli.machine) {
        Ok(machine) => machine,
        Err(error) => {
            eprintln!("[Error carga] {error}");
            exit(2);
        }
    };

    if cli.info {
        println!("{}", machine.info());
        return;
    }

    let reader: Box<dyn BufRead> = match &cli.words {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(_) => {
                eprintln!(
                    "[Error] No se puede abrir el fichero de palabras: {}",
                    path.display()
                );
                exit(3);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut engine = Engine::new(&machine);

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                eprintln!("[Error] Fallo leyendo las palabras: {error}");
                break;
            }
        };

        // Whitespace around and inside the line is not part of the word;
        // an empty line is the empty word.
        let word = strip_whitespace(&line);

        if let Some(bad) = symbol_outside_alphabet(&word, &machine) {
            if cli.strict {
                eprintln!("[Error palabra] símbolo fuera del alfabeto: '{bad}' en \"{word}\"");
            }
            println!("{}", SimulationResult::Rejected);
            continue;
        }

        let result = engine.simulate(&word, cli.trace, cli.max_steps);
        println!("{result}");
        print_final_tapes(&machine, engine.current_configuration());

        if cli.trace {
            print_trace(&word, engine.trace());
        }

        match result {
            SimulationResult::Infinite => {
                if engine.loop_detected() {
                    println!(
                        "[Info] Simulación detenida: bucle infinito detectado (configuración repetida)"
                    );
                } else {
                    println!(
                        "[Info] Simulación detenida: límite de pasos alcanzado ({})",
                        cli.max_steps
                    );
                }
            }
            SimulationResult::Error => {
                eprintln!(
                    "[Error simulación] {}",
                    engine.last_error().unwrap_or("error desconocido")
                );
            }
            _ => {}
        }
    }
}

/// Removes every whitespace character from an input line.
fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The first character of `word` outside the machine's input alphabet.
fn symbol_outside_alphabet(word: &str, machine: &Machine) -> Option<char> {
    word.chars().find(|&c| !machine.is_input_symbol(c))
}

fn print_final_tapes(machine: &Machine, config: &Configuration) {
    match machine.kind() {
        MachineKind::Mono => {
            println!("Cinta final: {}", config.tape(0).render(FINAL_TAPE_WINDOW));
        }
        MachineKind::Multi => {
            println!("Cintas finales:");
            for (i, tape) in config.tapes().iter().enumerate() {
                println!("  Cinta {}: {}", i + 1, tape.render(FINAL_TAPE_WINDOW));
            }
        }
    }
}

fn print_trace(word: &str, trace: &[Configuration]) {
    println!();
    println!("=== Traza de ejecución para \"{word}\" ===");
    for config in trace {
        println!("{}", config.describe(TRACE_WINDOW));
    }
    println!("=== Fin de traza ===");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinta::{Movement, Transition};

    fn sample_machine() -> Machine {
        let mut machine = Machine::mono('.');
        machine.add_state("q0").unwrap();
        machine.add_input_symbol('a').unwrap();
        machine.add_input_symbol('b').unwrap();
        machine.set_initial_state("q0").unwrap();
        machine.add_accept_state("q0").unwrap();
        machine
            .add_transition(Transition::mono("q0", 'a', "q0", 'a', Movement::Right))
            .unwrap();
        machine
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("  ab a \t"), "aba");
        assert_eq!(strip_whitespace(""), "");
        assert_eq!(strip_whitespace("   "), "");
    }

    #[test]
    fn test_symbol_outside_alphabet() {
        let machine = sample_machine();
        assert_eq!(symbol_outside_alphabet("abab", &machine), None);
        assert_eq!(symbol_outside_alphabet("", &machine), None);
        assert_eq!(symbol_outside_alphabet("abx", &machine), Some('x'));
    }
}
