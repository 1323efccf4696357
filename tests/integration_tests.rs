use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn surveyflow() -> Command {
    let mut cmd = Command::cargo_bin("surveyflow").expect("binary exists");
    cmd.arg("--no-color");
    cmd
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

// ---------------------------------------------------------------------------
// CLI smoke tests
// ---------------------------------------------------------------------------

#[test]
fn test_help_output() {
    surveyflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("survey"));
}

#[test]
fn test_missing_survey_file_fails() {
    surveyflow()
        .args(["validate", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_unsupported_extension_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("survey.yaml");
    std::fs::write(&path, "questions: []").unwrap();
    surveyflow()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn test_validate_clean_survey_markdown() {
    surveyflow()
        .args(["validate", &fixture("clean_survey.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Survey Validation"))
        .stdout(predicate::str::contains("**Status**: Publishable"))
        .stdout(predicate::str::contains("_No issues found_"));
}

#[test]
fn test_validate_clean_survey_strict_passes() {
    surveyflow()
        .args(["validate", "--strict", &fixture("clean_survey.json")])
        .assert()
        .success();
}

#[test]
fn test_validate_toml_survey() {
    surveyflow()
        .args(["-f", "json", "validate", &fixture("clean_survey.toml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"canPublish\": true"));
}

#[test]
fn test_validate_broken_survey_json() {
    let output = surveyflow()
        .args(["-f", "json", "validate", &fixture("broken_survey.json")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["canPublish"], false);

    let codes: Vec<&str> = value["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["code"].as_str().unwrap())
        .collect();
    assert_eq!(
        codes,
        vec![
            "BACKWARDS_JUMP",
            "MISSING_TARGET",
            "BAND_GAP",
            "BAND_OVERLAP",
            "UNUSED_CATEGORY",
            "MISSING_OPTION_SCORES",
        ]
    );
    assert_eq!(value["summary"]["errorCount"], 3);
    assert_eq!(value["summary"]["flow"]["loopCount"], 1);
}

#[test]
fn test_validate_broken_survey_strict_fails() {
    surveyflow()
        .args(["-f", "text", "validate", "--strict", &fixture("broken_survey.json")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Survey validation: FAIL"))
        .stderr(predicate::str::contains("3 blocking error(s)"));
}

#[test]
fn test_config_escalates_loops() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("surveyflow.toml");
    std::fs::write(&config, "[cycles]\nloops_as_errors = true\n").unwrap();

    let output = surveyflow()
        .arg("-c")
        .arg(&config)
        .args(["-f", "json", "validate", &fixture("broken_survey.json")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["issues"][0]["code"], "BACKWARDS_JUMP");
    assert_eq!(value["issues"][0]["severity"], "error");
    assert_eq!(value["summary"]["errorCount"], 4);
}

#[test]
fn test_missing_config_file_fails() {
    surveyflow()
        .args(["-c", "nope.toml", "validate", &fixture("clean_survey.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

// ---------------------------------------------------------------------------
// trace
// ---------------------------------------------------------------------------

#[test]
fn test_trace_json() {
    let output = surveyflow()
        .args([
            "-f",
            "json",
            "trace",
            &fixture("clean_survey.json"),
            "--answers",
            &fixture("answers.json"),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let categories = value["categories"].as_array().unwrap();
    assert_eq!(categories[0]["categoryId"], "eng");
    assert_eq!(categories[0]["normalizedScore"], 100);
    assert_eq!(categories[1]["categoryId"], "sat");
    assert_eq!(categories[1]["normalizedScore"], 75);
    assert_eq!(categories[1]["band"]["id"], "high");
    assert_eq!(value["overall"]["rule"], "category-only");
    assert!(value["overall"]["score"].is_null());
    assert_eq!(value["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn test_trace_rollup_override() {
    surveyflow()
        .args([
            "-f",
            "json",
            "trace",
            &fixture("clean_survey.json"),
            "--answers",
            &fixture("answers.json"),
            "--rollup",
            "mean-of-categories",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rule\": \"mean-of-categories\""))
        .stdout(predicate::str::contains("\"score\": 88"));
}

#[test]
fn test_trace_markdown() {
    surveyflow()
        .args([
            "trace",
            &fixture("clean_survey.json"),
            "--answers",
            &fixture("answers.json"),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Score Trace"))
        .stdout(predicate::str::contains("## Categories"));
}

// ---------------------------------------------------------------------------
// graph and classify
// ---------------------------------------------------------------------------

#[test]
fn test_graph_json() {
    surveyflow()
        .args(["-f", "json", "graph", &fixture("clean_survey.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entryNode\": \"q1\""))
        .stdout(predicate::str::contains("\"type\": \"skip\""));
}

#[test]
fn test_classify_misconfigured() {
    surveyflow()
        .args(["-f", "json", "classify", &fixture("analytics_misconfigured.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"misconfigured-scoring\""))
        .stdout(predicate::str::contains("\"showScoring\": false"));
}
