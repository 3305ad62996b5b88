use crate::support::{
    exit_with, load_table_or_exit, print_json, read_definitions_or_exit, registry_or_exit,
};
use dpp_classify::{
    ClassificationTable, Classifier, ConfidenceSource, HeuristicsConfig, write_table_to_path,
};
use serde_json::json;
use std::path::PathBuf;

pub struct Args {
    pub source: String,
    pub input: String,
    pub out: String,
    pub heuristics: Option<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    // Store rows under the registered schema name so mappers find them.
    let source = registry_or_exit(ClassificationTable::new(), None)
        .canonical_name(&args.source)
        .map(str::to_string)
        .unwrap_or_else(|_| args.source.clone());

    let classifier = match &args.heuristics {
        Some(path) => {
            let config = HeuristicsConfig::load(path).unwrap_or_else(|e| exit_with(e));
            Classifier::from_config(&config)
        }
        None => Classifier::default(),
    };

    let input = read_definitions_or_exit(&args.input);
    let run = classifier.classify(&source, &input.definitions);
    let warnings = input.merge_warnings(run.warnings);

    let out = PathBuf::from(&args.out);
    let mut table = load_table_or_exit(&out, true);
    let low_confidence = run.table.low_confidence(&source).count();
    let manual = run
        .table
        .records()
        .filter(|record| record.confidence_source == ConfidenceSource::Manual)
        .count();
    let classified = run.table.len();
    table.replace_source(&source, run.table);
    write_table_to_path(&out, &table)
        .unwrap_or_else(|e| exit_with(format!("failed to write {}: {e}", out.display())));
    tracing::info!(
        source = %source,
        path = %out.display(),
        records = table.len(),
        "classification table updated"
    );

    if args.json {
        let digest = table
            .digest()
            .unwrap_or_else(|e| exit_with(format!("failed to hash table: {e}")));
        print_json(&json!({
            "action": "classify",
            "source": source,
            "tablePath": out.display().to_string(),
            "classified": classified,
            "lowConfidence": low_confidence,
            "manual": manual,
            "tableRecords": table.len(),
            "tableDigest": digest.0,
            "warnings": warnings,
        }));
    } else {
        println!(
            "dpp classify\n  Source: {source}\n  Classified: {classified} ({low_confidence} low confidence, {manual} manual)\n  Skipped: {}\n  Path: {}",
            warnings.len(),
            out.display()
        );
        for warning in &warnings {
            println!(
                "  - skipped #{} {}: {}",
                warning.index,
                warning.id.as_deref().unwrap_or("<no id>"),
                warning.reason
            );
        }
    }
}
