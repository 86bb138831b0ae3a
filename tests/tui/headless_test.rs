//! Integration tests for headless mode.

use super::common::{run_headless, CONNECT};
use pretty_assertions::assert_eq;

#[test]
fn test_headless_basic_execution() {
    let (code, stdout, _) = run_headless(&["--events", "key:esc"]);

    assert_eq!(code, 0, "Expected exit code 0");
    assert!(stdout.contains("Chat with Database"));
    assert!(stdout.contains("Events: 1 executed"));
}

#[test]
fn test_headless_initial_screen() {
    let (code, stdout, _) = run_headless(&[
        "--events",
        "assert:contains:Hello! I'm SQL assistant,assert:contains:[ Connect ],assert:state:connected=false",
    ]);

    assert_eq!(code, 0, "stdout:\n{stdout}");
    assert!(stdout.contains("Assertions: 3 passed, 0 failed"));
}

#[test]
fn test_headless_type_event_json() {
    let (code, stdout, _) = run_headless(&["--events", "type:hello world", "--output", "json"]);

    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["state"]["input_text"], "hello world");
    assert_eq!(parsed["state"]["focus"], "input");
}

#[test]
fn test_headless_assertion_fail() {
    let (code, stdout, _) = run_headless(&[
        "--events",
        "type:hello,assert:contains:goodbye",
        "--output",
        "json",
    ]);

    assert_eq!(code, 1, "Should exit with code 1 on assertion failure");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["assertions"]["passed"], 0);
    assert_eq!(parsed["assertions"]["failed"], 1);
}

#[test]
fn test_submit_before_connecting() {
    let (code, stdout, _) = run_headless(&[
        "--events",
        "type:How many albums?,key:enter,assert:contains:Database not connected,assert:state:message_count=2",
    ]);

    assert_eq!(code, 0, "stdout:\n{stdout}");
}

#[test]
fn test_connect_and_ask() {
    let events = format!(
        "{CONNECT},assert:state:connected=true,assert:contains:demo (mock)\n\
         type:How many rows are in the Album table?\n\
         key:enter\n\
         assert:contains:The answer is 3.\n\
         assert:state:message_count=3"
    );
    let (code, stdout, _) = run_headless(&["-d", "demo", "--events", &events]);
    assert_eq!(code, 0, "stdout:\n{stdout}");
    assert!(stdout.contains("Assertions: 4 passed, 0 failed"));
}

#[test]
fn test_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("ask.txt");
    std::fs::write(
        &script,
        format!(
            "# connect to the demo database\n{CONNECT}\n\
             type:Show me the Artist rows, please\n\
             key:enter\n\
             assert:contains:AC/DC\n"
        ),
    )
    .unwrap();

    let (code, stdout, _) = run_headless(&["--script", script.to_str().unwrap()]);
    assert_eq!(code, 0, "stdout:\n{stdout}");
}

#[test]
fn test_headless_custom_size_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("screen.txt");

    let (code, stdout, _) = run_headless(&[
        "--events",
        "key:esc",
        "--size",
        "60x20",
        "--output-file",
        out.to_str().unwrap(),
    ]);

    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.lines().all(|l| l.chars().count() <= 60));
}

#[test]
fn test_headless_requires_events() {
    let (code, _, stderr) = run_headless(&[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("--headless requires --events or --script"));
}
