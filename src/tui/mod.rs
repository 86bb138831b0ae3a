//! Terminal User Interface for db-chat.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod headless;
pub mod text;
mod ui;
pub mod widgets;

pub use app::{Action, App};
pub use events::{Event, EventHandler};

use crate::app::{Orchestrator, TurnOutcome};
use crate::config::ConnectionConfig;
use crate::error::{DbChatError, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::info;

/// Carries out a key action against the orchestrator.
///
/// `redraw` runs once the busy state is set, before the request is awaited.
/// For a chat turn the question is already in the log at that point.
pub async fn dispatch<F>(
    app: &mut App,
    orchestrator: &Orchestrator,
    action: Action,
    mut redraw: F,
) -> Result<()>
where
    F: FnMut(&App) -> Result<()>,
{
    match action {
        Action::None | Action::Quit => {}
        Action::Connect(config) => {
            app.begin_connect();
            redraw(app)?;
            let outcome = orchestrator.connect(&mut app.session, &config).await;
            app.finish_connect(&outcome);
        }
        Action::Submit(text) => {
            if !orchestrator.accept_input(&mut app.session, &text) {
                app.finish_turn(&TurnOutcome::Ignored);
                return Ok(());
            }
            app.begin_turn();
            redraw(app)?;
            let outcome = orchestrator.respond(&mut app.session, &text).await;
            app.finish_turn(&outcome);
        }
    }
    Ok(())
}

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| DbChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| {
            DbChatError::internal(format!("Failed to enter alternate screen: {e}"))
        })?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| DbChatError::internal(format!("Failed to create terminal: {e}")))
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| DbChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).map_err(|e| {
            DbChatError::internal(format!("Failed to leave alternate screen: {e}"))
        })?;

        self.terminal
            .show_cursor()
            .map_err(|e| DbChatError::internal(format!("Failed to show cursor: {e}")))
    }

    /// Draws one frame and returns the screen area it covered.
    fn draw(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &App) -> Result<Rect> {
        terminal
            .draw(|frame| ui::render(frame, app))
            .map(|frame| frame.area)
            .map_err(|e| DbChatError::internal(format!("Failed to draw: {e}")))
    }

    /// Runs the event loop until the user quits, then closes the connection.
    pub async fn run(&mut self, app: &mut App, orchestrator: &Orchestrator) -> Result<()> {
        // Restore the terminal before printing a panic message.
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let result = self.event_loop(app, orchestrator).await;

        orchestrator.shutdown(&mut app.session).await;
        let _ = panic::take_hook();

        result
    }

    async fn event_loop(&mut self, app: &mut App, orchestrator: &Orchestrator) -> Result<()> {
        loop {
            app.clear_expired_notice();
            let screen = Self::draw(&mut self.terminal, app)?;
            app.set_viewport(screen);

            if !app.running {
                return Ok(());
            }

            let Event::Key(key) = self.event_handler.next()? else {
                continue;
            };

            let action = app.handle_key(key);
            let terminal = &mut self.terminal;
            dispatch(app, orchestrator, action, |app| {
                Self::draw(terminal, app).map(|_| ())
            })
            .await?;
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive TUI with the form prefilled from `connection`.
pub async fn run_tui(connection: &ConnectionConfig, orchestrator: Orchestrator) -> Result<()> {
    info!("Starting TUI");
    let mut app = App::new(connection);
    let mut tui = Tui::new()?;
    tui.run(&mut app, &orchestrator).await
}
