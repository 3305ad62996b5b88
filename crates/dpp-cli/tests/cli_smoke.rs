use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "dpp-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_dpp<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_dpp");
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("dpp command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_definitions(path: &Path) {
    let lines = [
        r#"{"id":"X1","name":"Temperature Sensor","documentationText":"measures ambient temperature"}"#,
        r#"{"id":"X2","name":"Hex bolt","definition":"fastener with hexagon head"}"#,
        r#"{"name":"Orphan","documentationText":"no identifier"}"#,
    ];
    fs::write(path, format!("{}\n", lines.join("\n"))).expect("definitions should be written");
}

#[test]
fn schemas_json_lists_builtin_mappers_in_registration_order() {
    let output = run_dpp(["schemas", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let names: Vec<&str> = payload
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|info| info["name"].as_str())
        .collect();
    assert_eq!(names, vec!["ECLASS", "ISA-95"]);
    assert_eq!(payload[1]["version"], "V0600");
}

#[test]
fn classify_writes_table_and_reports_skips() {
    let tmp = TempDirGuard::new("classify");
    let defs = tmp.path().join("defs.jsonl");
    let table = tmp.path().join("table.jsonl");
    write_definitions(&defs);

    let output = run_dpp([
        OsStr::new("classify"),
        OsStr::new("--source"),
        OsStr::new("eclass"),
        OsStr::new("--input"),
        defs.as_os_str(),
        OsStr::new("--out"),
        table.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["source"], "ECLASS");
    assert_eq!(payload["classified"], 2);
    assert_eq!(payload["warnings"].as_array().map(Vec::len), Some(1));

    let rows: Vec<Value> = fs::read_to_string(&table)
        .expect("table written")
        .lines()
        .map(|line| serde_json::from_str(line).expect("row is json"))
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["definitionId"], "X1");
    assert_eq!(rows[0]["category"], "Sensor");

    // Re-running over unchanged input leaves the file byte-identical.
    let before = fs::read(&table).expect("table");
    assert_success(&run_dpp([
        OsStr::new("classify"),
        OsStr::new("--source"),
        OsStr::new("ECLASS"),
        OsStr::new("--input"),
        defs.as_os_str(),
        OsStr::new("--out"),
        table.as_os_str(),
    ]));
    assert_eq!(fs::read(&table).expect("table"), before);
}

#[test]
fn classify_skips_unreadable_lines_and_keeps_the_rest() {
    let tmp = TempDirGuard::new("classify-lenient");
    let defs = tmp.path().join("defs.jsonl");
    let table = tmp.path().join("table.jsonl");
    let lines = [
        r#"{"id":"X1","name":"Temperature Sensor","documentationText":"measures ambient temperature"}"#,
        r#"{"id":"X2","name":null}"#,
        r#"{"id":17,"name":"Hex bolt","definition":"fastener with hexagon head"}"#,
        r#"{"id":"X4","name":["Fuse"]}"#,
        "",
        r#"{"id":"X5","name":"#,
    ];
    fs::write(&defs, format!("{}\n", lines.join("\n"))).expect("definitions should be written");

    let output = run_dpp([
        OsStr::new("classify"),
        OsStr::new("--source"),
        OsStr::new("ECLASS"),
        OsStr::new("--input"),
        defs.as_os_str(),
        OsStr::new("--out"),
        table.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["classified"], 2);

    let warnings: Vec<(u64, Option<&str>)> = payload["warnings"]
        .as_array()
        .expect("warnings array")
        .iter()
        .map(|w| (w["index"].as_u64().expect("index"), w["id"].as_str()))
        .collect();
    assert_eq!(
        warnings,
        vec![(1, Some("X2")), (3, Some("X4")), (5, None)]
    );
    let last_reason = payload["warnings"][2]["reason"].as_str().expect("reason");
    assert!(last_reason.starts_with("line 6: invalid JSON"), "{last_reason}");

    let ids: Vec<String> = fs::read_to_string(&table)
        .expect("table written")
        .lines()
        .map(|line| {
            let row: Value = serde_json::from_str(line).expect("row is json");
            row["definitionId"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(ids, vec!["17", "X1"]);
}

#[test]
fn sample_exports_through_both_schemas() {
    for (schema, marker) in [("ECLASS", "components"), ("isa95", "Equipment")] {
        let output = run_dpp(["sample", "--schema", schema]);
        assert_success(&output);
        let doc = parse_json_stdout(&output);
        assert!(doc.get("@context").is_some(), "{schema}");
        assert!(
            doc.to_string().contains(marker),
            "{schema} document should mention {marker}"
        );
    }
}

#[test]
fn export_check_then_ingest_round_trips_identity() {
    let tmp = TempDirGuard::new("export");
    let passport_path = tmp.path().join("passport.json");
    let sample = run_dpp(["sample"]);
    assert_success(&sample);
    fs::write(&passport_path, &sample.stdout).expect("passport written");

    let export = run_dpp([
        OsStr::new("export"),
        OsStr::new("--schema"),
        OsStr::new("ISA-95"),
        OsStr::new("--passport"),
        passport_path.as_os_str(),
        OsStr::new("--check"),
    ]);
    assert_success(&export);
    let doc_path = tmp.path().join("isa95.json");
    fs::write(&doc_path, &export.stdout).expect("document written");

    let ingest = run_dpp([
        OsStr::new("ingest"),
        OsStr::new("--schema"),
        OsStr::new("ISA-95"),
        OsStr::new("--input"),
        doc_path.as_os_str(),
    ]);
    assert_success(&ingest);
    let passport = parse_json_stdout(&ingest);
    assert_eq!(passport["identity"]["global_ids"]["gtin"], "0987654321");
    assert_eq!(
        passport["structure"]["parts"].as_array().map(Vec::len),
        Some(3)
    );
}

#[test]
fn unknown_schema_fails() {
    let output = run_dpp(["sample", "--schema", "NO_SUCH_SCHEMA"]);
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown schema"), "stderr: {stderr}");
}

#[test]
fn validate_rejects_bad_equipment_level() {
    let tmp = TempDirGuard::new("validate");
    let doc = tmp.path().join("doc.json");
    fs::write(
        &doc,
        r#"{"schema":"ISA-95","Equipment":{"ID":"E1","EquipmentLevel":"Galaxy"}}"#,
    )
    .expect("doc written");
    let output = run_dpp([
        OsStr::new("validate"),
        OsStr::new("--schema"),
        OsStr::new("ISA-95"),
        OsStr::new("--input"),
        doc.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_failure(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    assert_eq!(payload["findings"][0]["code"], "invalid-enum");
}
