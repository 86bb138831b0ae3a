//! Headless mode for scripted runs and UI tests.
//!
//! Drives the same `App` and `Orchestrator` as the interactive TUI, but
//! renders into a `TestBackend` and reads events from a script.

mod events;
mod output;

pub use events::{state_field, Assertion, Event, EventParser};
pub use output::{format_result, render_buffer, OutputFormat};

use crate::app::Orchestrator;
use crate::cli::Cli;
use crate::config::ConnectionConfig;
use crate::error::{DbChatError, Result};
use crate::tui::app::App;
use crate::tui::{dispatch, ui};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    pub output_format: OutputFormat,
    /// Stop at the first failed assertion.
    pub fail_fast: bool,
    /// Where to write the output; stdout when unset.
    pub output_file: Option<PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
            output_format: OutputFormat::Text,
            fail_fast: false,
            output_file: None,
        }
    }
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(DbChatError::config)?;
        let output_format = cli.output.parse().map_err(DbChatError::config)?;

        Ok(Self {
            width,
            height,
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Snapshot of application state for output.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessState {
    pub focus: String,
    pub input_text: String,
    pub message_count: usize,
    pub connected: bool,
    pub running: bool,
    pub notice: String,
}

impl HeadlessState {
    fn from_app(app: &App) -> Self {
        Self {
            focus: app.focus.as_str().to_string(),
            input_text: app.input.text.clone(),
            message_count: app.session.messages().len(),
            connected: app.is_connected(),
            running: app.running,
            notice: app
                .notice
                .as_ref()
                .map(|n| n.message.clone())
                .unwrap_or_default(),
        }
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    pub events_executed: usize,
    pub duration: Duration,
    pub assertions_passed: usize,
    /// The failed assertions, as written in the script.
    pub failures: Vec<String>,
    pub state: HeadlessState,
}

/// Runs the UI against a test backend.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    orchestrator: Orchestrator,
    events: Vec<Event>,
}

impl HeadlessRunner {
    pub fn new(
        config: HeadlessConfig,
        connection: &ConnectionConfig,
        orchestrator: Orchestrator,
    ) -> Result<Self> {
        let backend = TestBackend::new(config.width, config.height);
        let terminal = Terminal::new(backend)
            .map_err(|e| DbChatError::internal(format!("Failed to create test terminal: {e}")))?;

        Ok(Self {
            config,
            terminal,
            app: App::new(connection),
            orchestrator,
            events: Vec::new(),
        })
    }

    /// Loads events from a comma- or newline-separated string.
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file, or stdin for `-`.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            std::io::read_to_string(std::io::stdin())
                .map_err(|e| DbChatError::internal(format!("Failed to read stdin: {e}")))?
        } else {
            std::fs::read_to_string(path).map_err(|e| {
                DbChatError::config(format!("Failed to read script file {path}: {e}"))
            })?
        };
        self.load_events(&content)
    }

    /// Runs every loaded event and returns the result.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        let start = Instant::now();
        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;
        let mut assertions_passed = 0;
        let mut failures = Vec::new();

        self.draw()?;

        for event in events {
            events_executed += 1;

            match &event {
                Event::Key(key) => self.press(*key).await?,
                Event::Type(text) => {
                    for c in text.chars() {
                        self.press(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                            .await?;
                    }
                }
                Event::Wait(duration) => tokio::time::sleep(*duration).await,
                Event::Resize(w, h) => {
                    self.terminal
                        .resize(Rect::new(0, 0, *w, *h))
                        .map_err(|e| DbChatError::internal(format!("Resize failed: {e}")))?;
                }
                Event::Assert(assertion) => {
                    let screen = render_buffer(self.terminal.backend().buffer());
                    if assertion.check(&screen, &self.app) {
                        assertions_passed += 1;
                    } else {
                        warn!("Assertion failed: {}", event);
                        failures.push(event.to_string());
                        if self.config.fail_fast {
                            break;
                        }
                    }
                }
            }

            self.app.clear_expired_notice();
            self.draw()?;

            if !self.app.running {
                break;
            }
        }

        self.orchestrator.shutdown(&mut self.app.session).await;
        info!(
            "Headless run: {} events, {} failed assertions",
            events_executed,
            failures.len()
        );

        Ok(HeadlessResult {
            screen: render_buffer(self.terminal.backend().buffer()),
            events_executed,
            duration: start.elapsed(),
            assertions_passed,
            failures,
            state: HeadlessState::from_app(&self.app),
        })
    }

    async fn press(&mut self, key: KeyEvent) -> Result<()> {
        let action = self.app.handle_key(key);
        // Intermediate busy frames are not observable here.
        dispatch(&mut self.app, &self.orchestrator, action, |_| Ok(())).await
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        let frame = self
            .terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| DbChatError::internal(format!("Failed to render: {e}")))?;
        let screen = frame.area;
        self.app.set_viewport(screen);
        Ok(())
    }
}

/// Runs headless mode from CLI arguments and returns the exit code.
pub async fn run_headless(
    cli: &Cli,
    connection: &ConnectionConfig,
    orchestrator: Orchestrator,
) -> Result<i32> {
    cli.validate_headless().map_err(DbChatError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), connection, orchestrator)?;

    if let Some(ref events) = cli.events {
        runner.load_events(events)?;
    } else if let Some(ref script) = cli.script {
        runner.load_script(script)?;
    }

    let result = runner.run().await?;
    let output = format_result(&result, config.output_format);

    match config.output_file {
        Some(ref path) => std::fs::write(path, &output).map_err(|e| {
            DbChatError::internal(format!("Failed to write {}: {e}", path.display()))
        })?,
        None => print!("{output}"),
    }

    Ok(if result.failures.is_empty() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseBackend;
    use crate::llm::MockLlmClient;
    use pretty_assertions::assert_eq;

    fn runner(script: &str) -> HeadlessRunner {
        let connection = ConnectionConfig {
            backend: DatabaseBackend::Mock,
            database: "demo".to_string(),
            ..ConnectionConfig::default()
        };
        let orchestrator = Orchestrator::new(Box::new(MockLlmClient::new()));
        let mut runner =
            HeadlessRunner::new(HeadlessConfig::default(), &connection, orchestrator).unwrap();
        runner.load_events(script).unwrap();
        runner
    }

    #[tokio::test]
    async fn test_initial_screen() {
        let result = runner("assert:contains:Chat with Database")
            .run()
            .await
            .unwrap();

        assert_eq!(result.assertions_passed, 1);
        assert!(result.failures.is_empty());
        assert_eq!(result.state.message_count, 1);
        assert!(!result.state.connected);
    }

    #[tokio::test]
    async fn test_submit_without_connection() {
        let result = runner("type:How many albums?\nkey:enter")
            .run()
            .await
            .unwrap();

        assert_eq!(result.state.message_count, 2);
        assert_eq!(
            result.state.notice,
            "Database not connected. Please connect to the database first."
        );
    }

    #[tokio::test]
    async fn test_connect_then_ask() {
        let script = "\
key:tab
key:up
key:enter
assert:state:connected=true
assert:contains:Connected to the database!
key:tab
type:How many Artist rows are there?
key:enter
assert:state:message_count=3
assert:contains:The answer is 3.";
        let result = runner(script).run().await.unwrap();

        assert_eq!(result.failures, Vec::<String>::new());
        assert_eq!(result.assertions_passed, 4);
    }

    #[tokio::test]
    async fn test_fail_fast_stops() {
        let mut r = runner("assert:contains:nowhere,assert:contains:Chat");
        r.config.fail_fast = true;
        let result = r.run().await.unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.events_executed, 1);
    }

    #[tokio::test]
    async fn test_quit_stops_events() {
        let result = runner("key:ctrl+q,type:ignored").run().await.unwrap();
        assert!(!result.state.running);
        assert_eq!(result.events_executed, 1);
    }
}
