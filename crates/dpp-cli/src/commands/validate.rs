use crate::support::{exit_with, print_json, read_json_or_exit, registry_or_exit};
use dpp_classify::ClassificationTable;
use dpp_schema::has_errors;
use serde_json::json;

pub fn run(schema: String, input: String, json_output: bool) {
    let registry = registry_or_exit(ClassificationTable::new(), None);
    let document = read_json_or_exit(&input);
    let findings = registry
        .validate(&schema, &document)
        .unwrap_or_else(|e| exit_with(e));
    let failed = has_errors(&findings);
    let result = if failed { "rejected" } else { "accepted" };

    if json_output {
        print_json(&json!({
            "schema": registry.canonical_name(&schema).unwrap_or(&schema),
            "result": result,
            "findings": findings,
        }));
    } else {
        println!("dpp validate\n  Findings: {}", findings.len());
        for finding in &findings {
            println!("  - {finding}");
        }
    }
    if failed {
        std::process::exit(1);
    }
}
