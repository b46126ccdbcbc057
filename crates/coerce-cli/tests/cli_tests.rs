//! Integration tests for the `coerce` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to drive the actual binary:
//! stdin/stdout piping, file I/O, line mode, failure reporting and logging.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the timestamps.jsonl fixture.
fn timestamps_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/timestamps.jsonl")
}

/// Helper: a `coerce` command with the given arguments.
fn coerce_cmd(args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("coerce").unwrap();
    cmd.args(args);
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Single documents
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn date_from_stdin() {
    coerce_cmd(&["--type", "date"])
        .write_stdin(r#""2023/01/15""#)
        .assert()
        .success()
        .stdout("\"2023-01-15\"\n");
}

#[test]
fn time_without_zone_defaults_to_utc() {
    coerce_cmd(&["--type", "time_tz"])
        .write_stdin(r#""14:30:00""#)
        .assert()
        .success()
        .stdout("\"14:30:00+00:00\"\n");
}

#[test]
fn integral_number_to_integer() {
    coerce_cmd(&["-t", "integer"])
        .write_stdin("3.0")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn object_to_string_is_json_text() {
    let output = coerce_cmd(&["--type", "string"])
        .write_stdin(r#"{"b":[1,2],"a":null}"#)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let text: String = serde_json::from_str(stdout.trim()).expect("output must be a JSON string");
    assert_eq!(text, r#"{"a":null,"b":[1,2]}"#);
}

#[test]
fn null_is_always_accepted() {
    coerce_cmd(&["--type", "timestamp_ntz"])
        .write_stdin("null")
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn large_numbers_keep_precision() {
    coerce_cmd(&["--type", "number"])
        .write_stdin("12345678901234567890.000001")
        .assert()
        .success()
        .stdout("12345678901234567890.000001\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn not_coercible_exits_with_failure() {
    coerce_cmd(&["--type", "integer"])
        .write_stdin("3.5")
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("document 1: number value is not coercible to integer"));
}

#[test]
fn null_on_failure_writes_null() {
    coerce_cmd(&["--type", "integer", "--null-on-failure"])
        .write_stdin("3.5")
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn huge_exponent_is_not_an_integer() {
    coerce_cmd(&["--type", "integer", "--null-on-failure", "--lines"])
        .write_stdin("1e20000000\n1e-20000000\n2.5e1\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout("null\nnull\n25\n");
}

#[test]
fn invalid_json_fails() {
    coerce_cmd(&["--type", "string"])
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON document 1"));
}

#[test]
fn unknown_type_name_is_rejected() {
    coerce_cmd(&["--type", "datetime"])
        .write_stdin("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid type expression"));
}

#[test]
fn missing_type_is_rejected() {
    coerce_cmd(&[])
        .write_stdin("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--type"));
}

#[test]
fn missing_input_file_fails() {
    coerce_cmd(&["--type", "date", "-i", "/nonexistent/input.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Line mode and file I/O
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn lines_mode_coerces_each_line() {
    let args = ["--type", "timestamp_tz", "--lines", "--null-on-failure", "-i", timestamps_path()];
    coerce_cmd(&args)
        .assert()
        .success()
        .stdout(concat!(
            "\"2023-01-15T14:30:00+00:00\"\n",
            "\"2023-03-12T03:30:00-04:00\"\n",
            "\"2023-01-15T09:00:00+00:00\"\n",
            "null\n",
        ));
}

#[test]
fn lines_mode_reports_failures_by_line_number() {
    coerce_cmd(&["--type", "timestamp_tz", "--lines", "-i", timestamps_path()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("2023-01-15T09:00:00+00:00"))
        .stdout(predicate::str::contains("null").not())
        .stderr(predicate::str::contains("document 5:"))
        .stderr(predicate::str::contains("1 document(s) could not be coerced"));
}

#[test]
fn output_file_is_written() {
    let output_path = std::env::temp_dir().join("coerce-test-output.jsonl");
    let _ = std::fs::remove_file(&output_path);

    coerce_cmd(&[
        "--type",
        "timestamp_ntz",
        "--lines",
        "--null-on-failure",
        "-i",
        timestamps_path(),
        "-o",
        output_path.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stdout("");

    let content = std::fs::read_to_string(&output_path).expect("output file must exist");
    assert!(content.ends_with("null\n"), "every document ends with a newline");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4, "one line per non-blank input line");
    assert_eq!(lines[0], "\"2023-01-15T14:30:00\"");
    assert_eq!(lines[1], "\"2023-03-12T03:30:00\"");

    let _ = std::fs::remove_file(&output_path);
}

// ─────────────────────────────────────────────────────────────────────────────
// Unions and logging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn legacy_union_is_narrowed_with_flag() {
    coerce_cmd(&["--type", "legacy_union<integer,string>", "--legacy-unions"])
        .write_stdin("42")
        .assert()
        .success()
        .stdout("\"42\"\n");
}

#[test]
fn legacy_union_passes_through_without_flag() {
    coerce_cmd(&["--type", "legacy_union<integer,string>"])
        .write_stdin("42")
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn trace_logging_explains_rejections() {
    coerce_cmd(&["--type", "date", "--null-on-failure", "--log-level", "trace"])
        .write_stdin(r#""not-a-date""#)
        .assert()
        .success()
        .stdout("null\n")
        .stderr(predicate::str::contains("value not coercible"));
}

#[test]
fn help_flag_shows_usage() {
    coerce_cmd(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--type"))
        .stdout(predicate::str::contains("--legacy-unions"));
}
