//! CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_kegel-cli"))
        .args(args)
        .env("KEGEL_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn parse_json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).expect("Failed to parse JSON output")
}

fn sign_up(data_dir: &Path, email: &str) -> serde_json::Value {
    parse_json(&run_cli_success(
        data_dir,
        &[
            "auth", "sign-up", "--email", email, "--password", "secret1", "--confirm", "secret1",
        ],
    ))
}

#[test]
fn test_exercise_list_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let list = parse_json(&run_cli_success(dir.path(), &["exercise", "list"]));
    assert_eq!(list.as_array().map(Vec::len), Some(5));

    let advanced = parse_json(&run_cli_success(
        dir.path(),
        &["exercise", "list", "--level", "advanced"],
    ));
    assert_eq!(advanced.as_array().map(Vec::len), Some(2));

    let (_, _, code) = run_cli(dir.path(), &["exercise", "list", "--level", "expert"]);
    assert_ne!(code, 0);

    let one = parse_json(&run_cli_success(dir.path(), &["exercise", "show", "1"]));
    assert_eq!(one["name"], "Basic Contraction");

    let (_, stderr, code) = run_cli(dir.path(), &["exercise", "show", "42"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown exercise"));
}

#[test]
fn test_auth_flow() {
    let dir = tempfile::tempdir().unwrap();
    let whoami = run_cli_success(dir.path(), &["auth", "whoami"]);
    assert!(whoami.to_lowercase().contains("not signed in"));

    let user = sign_up(dir.path(), "Ana@Example.com");
    assert_eq!(user["email"], "ana@example.com");

    let me = parse_json(&run_cli_success(dir.path(), &["auth", "whoami"]));
    assert_eq!(me["id"], user["id"]);

    run_cli_success(dir.path(), &["auth", "sign-out"]);
    let (_, _, code) = run_cli(
        dir.path(),
        &["auth", "sign-in", "--email", "ana@example.com", "--password", "wrong1"],
    );
    assert_ne!(code, 0);
    run_cli_success(
        dir.path(),
        &["auth", "sign-in", "--email", "ana@example.com", "--password", "secret1"],
    );
}

#[test]
fn test_sign_up_validation() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &["auth", "sign-up", "--email", "a@b.c", "--password", "abc", "--confirm", "abc"],
    );
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(
        dir.path(),
        &["auth", "sign-up", "--email", "a@b.c", "--password", "secret1", "--confirm", "secret2"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_run_records_session_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    sign_up(dir.path(), "runner@example.com");

    let out = run_cli_success(
        dir.path(),
        &["exercise", "run", "--contract", "1", "--relax", "1", "--reps", "2", "--period-ms", "5"],
    );
    let events: Vec<serde_json::Value> = out.lines().map(parse_json).collect();
    assert_eq!(events.first().map(|e| e["type"].clone()), Some("exercise_started".into()));
    assert_eq!(events.last().map(|e| e["type"].clone()), Some("exercise_completed".into()));
    let switches = events.iter().filter(|e| e["type"] == "phase_switched").count();
    assert_eq!(switches, 3);

    let progress = parse_json(&run_cli_success(dir.path(), &["progress", "show"]));
    assert_eq!(progress["totalSessions"], 1);
    assert_eq!(progress["level"], "beginner");

    run_cli_success(dir.path(), &["config", "set", "progress.weekly_goal", "7"]);
    let progress = parse_json(&run_cli_success(dir.path(), &["progress", "show"]));
    assert_eq!(progress["weeklyGoal"], 7);
    assert_eq!(progress["totalSessions"], 1);

    let history = parse_json(&run_cli_success(dir.path(), &["progress", "history"]));
    assert_eq!(history["totalSessions"], 1);
    assert_eq!(history["sessions"][0]["repetitions"], 2);
}

#[test]
fn test_run_rejects_invalid_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["exercise", "run", "--reps", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "exercise.repetitions"]).trim(),
        "10"
    );
    run_cli_success(dir.path(), &["config", "set", "exercise.repetitions", "3"]);
    assert_eq!(
        run_cli_success(dir.path(), &["config", "get", "exercise.repetitions"]).trim(),
        "3"
    );

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "exercise.nope"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "exercise.repetitions", "0"]);
    assert_ne!(code, 0);

    run_cli_success(dir.path(), &["config", "reset"]);
    let all = parse_json(&run_cli_success(dir.path(), &["config", "list"]));
    assert_eq!(all["exercise"]["repetitions"], 10);
}
