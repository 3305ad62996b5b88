//! Integration tests: classify, persist, reload.

use dpp_classify::{
    Classifier, ConfidenceSource, HeuristicsConfig, RawDefinition, read_table_from_path,
    write_table_to_path,
};
use dpp_model::PartCategory;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard(PathBuf);

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "dpp-classify-{prefix}-{}-{unique}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("temp dir should be created");
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn eclass_definitions() -> Vec<RawDefinition> {
    let mut item = RawDefinition::new(
        "0173-1#01-ITM001#001",
        "Resistance thermometer Pt100",
        "temperature sensor with platinum measuring resistor",
    );
    item.case_of = vec!["0173-1#01-AGZ376#002".to_string()];
    vec![
        RawDefinition::new(
            "0173-1#01-AGZ376#002",
            "Temperature Sensor",
            "measures ambient temperature",
        ),
        RawDefinition::new(
            "0173-1#01-AAB123#003",
            "Miniature circuit breaker",
            "protection device against overcurrent",
        ),
        RawDefinition::new("0173-1#01-AAC777#001", "Hex bolt", "fastener with hexagon head"),
        RawDefinition::new("0173-1#01-AAX000#001", "Miscellaneous", "not otherwise specified"),
        item,
    ]
}

#[test]
fn temperature_sensor_scenario() {
    let run = Classifier::default().classify(
        "ECLASS",
        &[RawDefinition::new(
            "X1",
            "Temperature Sensor",
            "measures ambient temperature",
        )],
    );
    let record = run.table.get("ECLASS", "X1").expect("X1 classified");
    assert_eq!(record.category, PartCategory::Sensor);
    assert_eq!(record.confidence_source, ConfidenceSource::Heuristic);
    assert!(record.evidence.contains("temperature"));
    assert!(record.evidence.contains("sensor"));
}

#[test]
fn persisted_table_is_byte_identical_across_runs() {
    let dir = TempDirGuard::new("idempotent");
    let first = dir.path().join("first.jsonl");
    let second = dir.path().join("second.jsonl");
    let classifier = Classifier::default();

    write_table_to_path(&first, &classifier.classify("ECLASS", &eclass_definitions()).table)
        .expect("first write");
    let mut shuffled = eclass_definitions();
    shuffled.rotate_left(2);
    write_table_to_path(&second, &classifier.classify("ECLASS", &shuffled).table)
        .expect("second write");

    let a = std::fs::read(&first).expect("first table");
    let b = std::fs::read(&second).expect("second table");
    assert_eq!(a, b);
    assert_eq!(
        String::from_utf8(a).expect("utf8").lines().count(),
        eclass_definitions().len()
    );
}

#[test]
fn reloaded_table_answers_mapper_queries() {
    let dir = TempDirGuard::new("reload");
    let path = dir.path().join("nested/table.jsonl");
    let run = Classifier::default().classify("ECLASS", &eclass_definitions());
    write_table_to_path(&path, &run.table).expect("write");

    let table = read_table_from_path(&path).expect("read");
    assert_eq!(table, run.table);
    assert_eq!(
        table.class_ids_for("ECLASS", PartCategory::Protection),
        vec!["0173-1#01-AAB123#003"]
    );
    assert_eq!(
        table.case_items("ECLASS", "0173-1#01-AGZ376#002"),
        vec!["0173-1#01-ITM001#001"]
    );
    let review: Vec<&str> = table
        .low_confidence("ECLASS")
        .map(|r| r.definition_id.as_str())
        .collect();
    assert_eq!(review, vec!["0173-1#01-AAX000#001"]);
}

#[test]
fn heuristics_file_drives_the_classifier() {
    let dir = TempDirGuard::new("heuristics");
    let path = dir.path().join("heuristics.toml");
    std::fs::write(
        &path,
        r#"
fallback_category = "Consumable"

[keywords]
Structural = ["miscellaneous"]

[[manual]]
source_schema = "ECLASS"
definition_id = "0173-1#01-AAC777#001"
category = "Structural"
"#,
    )
    .expect("write heuristics");

    let config = HeuristicsConfig::load(&path).expect("config loads");
    let run = Classifier::from_config(&config).classify("ECLASS", &eclass_definitions());
    let bolt = run.table.get("ECLASS", "0173-1#01-AAC777#001").expect("bolt");
    assert_eq!(bolt.category, PartCategory::Structural);
    assert_eq!(bolt.confidence_source, ConfidenceSource::Manual);
    let misc = run.table.get("ECLASS", "0173-1#01-AAX000#001").expect("misc");
    assert_eq!(misc.category, PartCategory::Structural);
    assert_eq!(misc.confidence_source, ConfidenceSource::Heuristic);
}
