use crate::support::{exit_with, print_json, read_passport_or_exit, registry_or_exit};
use dpp_classify::ClassificationTable;
use dpp_schema::has_errors;

pub fn run(schema: String, passport: String, config_dir: Option<String>, check: bool) {
    let registry = registry_or_exit(ClassificationTable::new(), config_dir.as_deref());
    let model = read_passport_or_exit(&passport);
    let document = registry
        .map_to(&schema, &model)
        .unwrap_or_else(|e| exit_with(e));

    if check {
        let findings = registry
            .validate(&schema, &document)
            .unwrap_or_else(|e| exit_with(e));
        for finding in &findings {
            eprintln!("{finding}");
        }
        if has_errors(&findings) {
            exit_with(format!(
                "{} document failed validation",
                registry.canonical_name(&schema).unwrap_or(&schema)
            ));
        }
    }
    print_json(&document);
}
