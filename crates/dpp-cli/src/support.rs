use dpp_classify::{ClassificationTable, ClassificationWarning, RawDefinition, read_table_from_path};
use dpp_model::Passport;
use dpp_schema::{SchemaRegistry, register_default_mappers};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn read_json_or_exit(path: &str) -> Value {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with(format!("failed to read {path}: {e}")));
    serde_json::from_str(&text).unwrap_or_else(|e| exit_with(format!("failed to parse {path}: {e}")))
}

pub fn read_passport_or_exit(path: &str) -> Passport {
    let passport: Passport = serde_json::from_value(read_json_or_exit(path))
        .unwrap_or_else(|e| exit_with(format!("{path} is not a canonical passport: {e}")));
    passport
        .validate()
        .unwrap_or_else(|e| exit_with(format!("{path}: {e}")));
    passport
}

/// Raw definitions read from a JSONL file.
pub struct DefinitionInput {
    pub definitions: Vec<RawDefinition>,
    /// Zero-based file line of each entry in `definitions`.
    lines: Vec<usize>,
    /// Lines that could not be read as a definition.
    pub warnings: Vec<ClassificationWarning>,
}

impl DefinitionInput {
    /// Merge classifier warnings with the unreadable lines. Every index is
    /// restated as a file line so the two sets share one numbering.
    pub fn merge_warnings(&self, run: Vec<ClassificationWarning>) -> Vec<ClassificationWarning> {
        let mut warnings: Vec<ClassificationWarning> = run
            .into_iter()
            .map(|mut warning| {
                warning.index = self.lines.get(warning.index).copied().unwrap_or(warning.index);
                warning
            })
            .chain(self.warnings.iter().cloned())
            .collect();
        warnings.sort_by_key(|warning| warning.index);
        warnings
    }
}

/// One JSON object per line. Blank lines are skipped; a line that is not a
/// readable definition becomes a warning and the rest of the file is kept.
pub fn read_definitions_or_exit(path: &str) -> DefinitionInput {
    let file = fs::File::open(path).unwrap_or_else(|e| exit_with(format!("failed to open {path}: {e}")));
    let mut input = DefinitionInput {
        definitions: Vec::new(),
        lines: Vec::new(),
        warnings: Vec::new(),
    };
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.unwrap_or_else(|e| exit_with(format!("{path}:{}: {e}", idx + 1)));
        if line.trim().is_empty() {
            continue;
        }
        match read_definition_line(&line) {
            Ok(definition) => {
                input.definitions.push(definition);
                input.lines.push(idx);
            }
            Err((id, reason)) => {
                tracing::warn!(path, line = idx + 1, %reason, "skipping unreadable definition");
                input.warnings.push(ClassificationWarning {
                    index: idx,
                    id,
                    reason: format!("line {}: {reason}", idx + 1),
                });
            }
        }
    }
    input
}

/// On failure, returns whatever id the line carries alongside the reason.
fn read_definition_line(line: &str) -> Result<RawDefinition, (Option<String>, String)> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| (None, format!("invalid JSON: {e}")))?;
    RawDefinition::from_json(&value).map_err(|reason| {
        let id = match value.get("id") {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        (id, reason)
    })
}

/// Load a classification table. A missing file is an empty table only when
/// `missing_ok` is set.
pub fn load_table_or_exit(path: &Path, missing_ok: bool) -> ClassificationTable {
    if missing_ok && !path.exists() {
        return ClassificationTable::new();
    }
    read_table_from_path(path)
        .unwrap_or_else(|e| exit_with(format!("failed to load {}: {e}", path.display())))
}

pub fn registry_or_exit(table: ClassificationTable, config_dir: Option<&str>) -> SchemaRegistry {
    let mut registry = SchemaRegistry::with_table(table);
    let config_dir = config_dir.map(PathBuf::from);
    register_default_mappers(&mut registry, config_dir.as_deref())
        .unwrap_or_else(|e| exit_with(format!("failed to register mappers: {e}")));
    registry
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization")
    );
}
