//! Output formatting for headless mode: plain text or JSON.

use super::{HeadlessResult, HeadlessState};
use ratatui::buffer::Buffer;
use serde::Serialize;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The final screen followed by a summary line.
    #[default]
    Text,
    /// Screen, state and assertion results as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown output format '{other}'. Valid: text, json")),
        }
    }
}

/// Renders a buffer as text: one line per row, trailing blanks trimmed.
pub fn render_buffer(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut lines: Vec<String> = (0..area.height)
        .map(|y| {
            let line: String = (0..area.width)
                .filter_map(|x| buffer.cell((area.x + x, area.y + y)))
                .map(|cell| cell.symbol())
                .collect();
            line.trim_end().to_string()
        })
        .collect();

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    format!("{}\n", lines.join("\n"))
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    screen: &'a str,
    screen_lines: Vec<&'a str>,
    events_executed: usize,
    duration_ms: u128,
    assertions: AssertionSummary<'a>,
    state: &'a HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary<'a> {
    passed: usize,
    failed: usize,
    failures: &'a [String],
}

/// Formats a headless result.
pub fn format_result(result: &HeadlessResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text(result),
        OutputFormat::Json => format_json(result),
    }
}

fn format_text(result: &HeadlessResult) -> String {
    let mut out = format!(
        "{}\nEvents: {} executed in {}ms",
        result.screen,
        result.events_executed,
        result.duration.as_millis()
    );

    let passed = result.assertions_passed;
    let failed = result.failures.len();
    if passed + failed > 0 {
        out.push_str(&format!(" | Assertions: {passed} passed, {failed} failed"));
    }
    out.push('\n');

    for failure in &result.failures {
        out.push_str(&format!("FAILED: {failure}\n"));
    }
    out
}

fn format_json(result: &HeadlessResult) -> String {
    let output = JsonOutput {
        screen: &result.screen,
        screen_lines: result.screen.lines().collect(),
        events_executed: result.events_executed,
        duration_ms: result.duration.as_millis(),
        assertions: AssertionSummary {
            passed: result.assertions_passed,
            failed: result.failures.len(),
            failures: &result.failures,
        },
        state: &result.state,
    };

    serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn result() -> HeadlessResult {
        HeadlessResult {
            screen: "Chat with Database\nAI".to_string(),
            events_executed: 3,
            duration: Duration::from_millis(150),
            assertions_passed: 2,
            failures: vec!["assert:contains:albums".to_string()],
            state: HeadlessState {
                focus: "input".to_string(),
                input_text: "hello".to_string(),
                message_count: 1,
                connected: false,
                running: true,
                notice: String::new(),
            },
        }
    }

    #[test]
    fn test_text_output() {
        let text = format_result(&result(), OutputFormat::Text);

        assert!(text.starts_with("Chat with Database\nAI\n"));
        assert!(text.contains("Events: 3 executed"));
        assert!(text.contains("Assertions: 2 passed, 1 failed"));
        assert!(text.contains("FAILED: assert:contains:albums"));
    }

    #[test]
    fn test_json_output() {
        let json = format_result(&result(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["events_executed"], 3);
        assert_eq!(parsed["screen_lines"][1], "AI");
        assert_eq!(parsed["state"]["connected"], false);
        assert_eq!(parsed["assertions"]["failed"], 1);
    }

    #[test]
    fn test_render_buffer_trims() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 4));
        buf.set_string(0, 0, "hi", ratatui::style::Style::default());
        assert_eq!(render_buffer(&buf), "hi\n");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("frames".parse::<OutputFormat>().is_err());
    }
}
