//! Common test utilities for TUI tests.

use std::process::Command;

/// Runs dbchat in headless mode against the demo database and mock model.
///
/// Returns the exit code, stdout and stderr.
pub fn run_headless(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dbchat"))
        .args(["--headless", "--mock-db", "--llm", "mock"])
        .args(args)
        .env_remove("GEMINI_API_KEY")
        .output()
        .expect("Failed to execute dbchat");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}

/// Events that select the Connect button in the sidebar and press it.
pub const CONNECT: &str = "key:tab,key:up,key:enter,key:tab";
