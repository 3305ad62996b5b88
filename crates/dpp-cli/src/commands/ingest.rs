use crate::support::{exit_with, load_table_or_exit, print_json, read_json_or_exit, registry_or_exit};
use dpp_classify::ClassificationTable;
use std::path::Path;

pub fn run(schema: String, input: String, table: Option<String>, config_dir: Option<String>) {
    let table = match &table {
        Some(path) => load_table_or_exit(Path::new(path), false),
        None => ClassificationTable::new(),
    };
    let registry = registry_or_exit(table, config_dir.as_deref());
    let raw = read_json_or_exit(&input);
    let passport = registry
        .map_from(&schema, &raw)
        .unwrap_or_else(|e| exit_with(e));
    print_json(&passport);
}
