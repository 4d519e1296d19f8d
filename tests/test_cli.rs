mod common;

use common::{fixture_path, run_binary};

#[test]
fn validate_valid_config() {
    let config = fixture_path("valid.yaml");
    let output = run_binary(&["validate", config.to_str().unwrap()], None);
    assert!(
        output.status.success(),
        "validate should succeed for valid config: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check-in 20s, primary alert 45s"), "{stdout}");
    // EMERGENCY outranks SECONDARY for the second tier.
    assert!(
        stdout.contains("primary Sam, secondary Emergency Services"),
        "{stdout}"
    );
}

#[test]
fn validate_rejects_zero_duration() {
    let config = fixture_path("zero_duration.yaml");
    let output = run_binary(&["validate", config.to_str().unwrap()], None);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("check_in_duration_seconds"), "{stderr}");
}

#[test]
fn validate_requires_primary_contact() {
    let config = fixture_path("no_primary.yaml");
    let output = run_binary(&["validate", config.to_str().unwrap()], None);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_requires_base_url_for_http() {
    let config = fixture_path("http_without_url.yaml");
    let output = run_binary(&["validate", config.to_str().unwrap()], None);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base_url"), "{stderr}");
}

#[test]
fn validate_missing_file() {
    let output = run_binary(
        &["validate", "/tmp/nonexistent_silentsignals_test_file.yaml"],
        None,
    );
    assert!(!output.status.success());
}

#[test]
fn version_json_format() {
    let output = run_binary(&["version", "--format", "json"], None);
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("output should be valid JSON");
    assert_eq!(parsed["name"], "silentsignals");
    assert_eq!(parsed["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn completions_mention_subcommands() {
    let output = run_binary(&["completions", "bash"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("silentsignals"));
    assert!(stdout.contains("validate"));
}

#[test]
fn run_reports_danger_and_exits_on_quit() {
    let output = run_binary(
        &["--quiet", "run", "--gateway", "mock"],
        Some("sos\nstatus\nlog\nquit\n"),
    );
    assert!(
        output.status.success(),
        "run should exit cleanly: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ALERT_SECONDARY]"), "{stdout}");
    assert!(
        stdout.contains("User requested immediate help. Alerting Emergency Services."),
        "{stdout}"
    );
}

#[test]
fn run_exits_at_end_of_input() {
    let output = run_binary(&["--quiet", "run"], Some("status\n"));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[IDLE]"));
}

#[test]
fn run_flags_unknown_commands() {
    let output = run_binary(&["--quiet", "run"], Some("launch\nquit\n"));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command 'launch'"));
}

#[test]
fn run_rejects_zero_countdown_override() {
    let output = run_binary(&["--quiet", "run", "--check-in", "0"], Some("quit\n"));
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn run_http_without_base_url_is_a_gateway_error() {
    let output = run_binary(&["--quiet", "run", "--gateway", "http"], Some("quit\n"));
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn run_writes_event_stream() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");
    let config = fixture_path("valid.yaml");
    let output = run_binary(
        &[
            "--quiet",
            "run",
            "--config",
            config.to_str().unwrap(),
            "--events-file",
            events.to_str().unwrap(),
        ],
        Some("check-in\nsafe\nquit\n"),
    );
    assert!(output.status.success());

    let kinds: Vec<String> = std::fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["type"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(kinds.first().map(String::as_str), Some("EngineStarted"));
    assert!(kinds.contains(&"SessionStarted".to_owned()));
    assert_eq!(
        kinds.iter().filter(|k| k.as_str() == "PhaseEntered").count(),
        2
    );
    assert_eq!(kinds.last().map(String::as_str), Some("EngineStopped"));
}
