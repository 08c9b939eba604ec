//! Loading and saving machine definitions on the filesystem. Parsing
//! itself lives in `parser`; this module only adds the file plumbing and a
//! directory scan for `.tm` files.

use crate::machine::Machine;
use crate::parser;
use crate::types::TmError;
use std::fs;
use std::path::{Path, PathBuf};

/// Utility for loading machine definitions from files and directories.
pub struct Loader;

impl Loader {
    /// Loads a machine from `path`, detecting the single or multi-tape
    /// form from the file content.
    pub fn load_machine(path: &Path) -> Result<Machine, TmError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TmError::File(format!(
                "No se puede abrir el archivo: {} ({e})",
                path.display()
            ))
        })?;

        parser::parse(&content)
    }

    /// Parses a machine from in-memory text. Useful for definitions that
    /// do not live in files.
    pub fn load_machine_from_str(content: &str) -> Result<Machine, TmError> {
        parser::parse(content)
    }

    /// Loads every `.tm` file in `directory`. Subdirectories and files
    /// with other extensions are skipped; each entry of the result is the
    /// outcome for one file.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), TmError>> {
        if !directory.exists() {
            return vec![Err(TmError::File(format!(
                "El directorio {} no existe",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TmError::File(format!(
                    "No se puede leer el directorio {} ({e})",
                    directory.display()
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TmError::File(format!(
                            "No se puede leer la entrada del directorio ({e})"
                        ))))
                    }
                };

                let path = entry.path();
                if path.is_dir() || path.extension().map_or(true, |ext| ext != "tm") {
                    return None;
                }

                match Self::load_machine(&path) {
                    Ok(machine) => Some(Ok((path, machine))),
                    Err(e) => Some(Err(TmError::File(format!(
                        "No se puede cargar la máquina de {}: {e}",
                        path.display()
                    )))),
                }
            })
            .collect()
    }

    /// Serializes a single-tape machine back to the definition format and
    /// writes it to `path`.
    pub fn save_machine(path: &Path, machine: &Machine) -> Result<(), TmError> {
        let content = parser::save(machine)?;
        fs::write(path, content).map_err(|e| {
            TmError::File(format!(
                "No se puede crear el archivo: {} ({e})",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "\
q0 qf
a
a .
q0
.
qf
q0 a qf a R
";

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("valida.tm");
        File::create(&path)
            .unwrap()
            .write_all(VALID.as_bytes())
            .unwrap();

        let machine = Loader::load_machine(&path).unwrap();
        assert_eq!(machine.initial_state(), "q0");
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = Loader::load_machine(&dir.path().join("no-existe.tm"));
        assert!(matches!(result, Err(TmError::File(_))));
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rota.tm");
        File::create(&path)
            .unwrap()
            .write_all(b"esto no es una maquina")
            .unwrap();

        assert!(Loader::load_machine(&path).is_err());
    }

    #[test]
    fn test_directory_scan_filters_tm_files() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("valida.tm"))
            .unwrap()
            .write_all(VALID.as_bytes())
            .unwrap();
        File::create(dir.path().join("rota.tm"))
            .unwrap()
            .write_all(b"contenido invalido")
            .unwrap();
        File::create(dir.path().join("ignorada.txt"))
            .unwrap()
            .write_all(b"no es un fichero .tm")
            .unwrap();

        let results = Loader::load_machines(dir.path());
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_directory_scan_on_missing_directory() {
        let dir = tempdir().unwrap();
        let results = Loader::load_machines(&dir.path().join("no-existe"));
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let machine = Loader::load_machine_from_str(VALID).unwrap();

        let path = dir.path().join("guardada.tm");
        Loader::save_machine(&path, &machine).unwrap();

        let reloaded = Loader::load_machine(&path).unwrap();
        assert_eq!(reloaded.states(), machine.states());
        assert_eq!(reloaded.transition_count(), machine.transition_count());
    }
}
