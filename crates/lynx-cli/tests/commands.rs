//! End-to-end tests of the command functions behind `lynx run` and `lynx validate`.

use std::fs;
use std::path::Path;

use lynx_cli::commands::{run_pipeline, validate_csv};
use lynx_cli::types::ValidateRequest;
use lynx_model::{PIPELINE_ERROR_KEY, PipelineStatus};

const SCHEMA: &str = r#"
[[Process]]
name = "id"
type = "string"
required = true
constraints = { unique = true }

[[Process]]
name = "duration"
type = "number"
required = true
constraints = { min = 0, max = 1440 }
"#;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn request(dir: &Path, csv: &str) -> ValidateRequest {
    ValidateRequest {
        schema: dir.join("schema.toml"),
        metatype: "Process".to_string(),
        csv: dir.join(csv),
        delimiter: b',',
        batch_size: 100,
        strict: false,
    }
}

#[test]
fn valid_csv_has_no_findings() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.toml", SCHEMA);
    write(dir.path(), "ok.csv", "id,duration\nP1,30\nP2,45.5\n");

    let outcome = validate_csv(&request(dir.path(), "ok.csv")).unwrap();
    assert_eq!(outcome.rows, 2);
    assert_eq!(outcome.batches, 1);
    assert!(outcome.errors.is_empty());
}

#[test]
fn findings_from_every_batch_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.toml", SCHEMA);
    write(
        dir.path(),
        "bad.csv",
        "id,duration,operator\nP1,2000,ann\nP2,3000,bob\nP3,-1,ann\n",
    );
    let mut request = request(dir.path(), "bad.csv");
    request.batch_size = 1;
    request.strict = true;

    let outcome = validate_csv(&request).unwrap();
    assert_eq!(outcome.batches, 3);
    insta::assert_json_snapshot!(outcome.errors, @r#"
    {
      "constraint": [
        "Values in field 'duration' are above maximum: 1440",
        "Values in field 'duration' are below minimum: 0"
      ],
      "unexpected": [
        "Column 'operator' is not declared for metatype 'Process'"
      ]
    }
    "#);
}

#[test]
fn unknown_metatype_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.toml", SCHEMA);
    write(dir.path(), "ok.csv", "id,duration\nP1,30\n");
    let mut request = request(dir.path(), "ok.csv");
    request.metatype = "Equipment".to_string();

    let err = validate_csv(&request).unwrap_err();
    assert!(err.to_string().contains("Equipment"));
}

#[test]
fn missing_csv_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.toml", SCHEMA);
    let err = validate_csv(&request(dir.path(), "absent.csv")).unwrap_err();
    assert!(format!("{err:#}").contains("input file not found"));
}

#[test]
fn dry_run_reports_completed_state() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.toml", SCHEMA);
    write(
        dir.path(),
        "process.csv",
        "process_id,duration\nP1,30\nP2,60\nP3,90\n",
    );
    write(
        dir.path(),
        "pipeline.toml",
        r#"
name = "processes"

[source]
kind = "csv"
path = "process.csv"
batch_size = 2

[mapping]
column_mappings = { process_id = "id" }

[validation]
schema = "schema.toml"
metatype = "Process"
"#,
    );

    let outcome = run_pipeline(&dir.path().join("pipeline.toml"), true).unwrap();
    assert!(outcome.succeeded());
    assert_eq!(outcome.name, "processes");
    assert_eq!(outcome.state.records_processed, 3);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["records_processed"], 3);
    assert_eq!(json["dry_run"], true);
}

#[test]
fn failed_run_is_an_outcome_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pipeline.toml",
        "[source]\nkind = \"csv\"\npath = \"missing.csv\"\n",
    );

    let outcome = run_pipeline(&dir.path().join("pipeline.toml"), true).unwrap();
    assert!(!outcome.succeeded());
    assert_eq!(outcome.state.status, PipelineStatus::Failed);
    assert!(outcome.state.errors[PIPELINE_ERROR_KEY].contains("missing.csv"));
}

#[test]
fn bad_pipeline_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pipeline.toml", "[source]\nkind = \"csv\"\n");
    let err = run_pipeline(&dir.path().join("pipeline.toml"), true).unwrap_err();
    assert!(err.to_string().contains("load pipeline"));
}
