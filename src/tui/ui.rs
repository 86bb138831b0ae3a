//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{chat, header, input, sidebar, toast};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Screen regions, top to bottom then left to right.
struct Areas {
    header: Rect,
    chat: Rect,
    sidebar: Rect,
    notice: Rect,
    input: Rect,
}

fn split(area: Rect) -> Areas {
    // Main layout: header, content, notice, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Content (chat + sidebar)
            Constraint::Length(1), // Notice
            Constraint::Length(3), // Input
        ])
        .split(area);

    // Content layout: chat (70%) and sidebar (30%)
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_layout[1]);

    Areas {
        header: main_layout[0],
        chat: content_layout[0],
        sidebar: content_layout[1],
        notice: main_layout[2],
        input: main_layout[3],
    }
}

/// Where the chat panel lands on a screen of the given size.
pub fn chat_area(screen: Rect) -> Rect {
    split(screen).chat
}

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let areas = split(frame.area());

    render_header(frame, areas.header, app);
    render_chat(frame, areas.chat, app);
    render_sidebar(frame, areas.sidebar, app);
    render_notice(frame, areas.notice, app);
    render_input(frame, areas.input, app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(app.connection_info(), app.busy);
    frame.render_widget(widget, area);
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let widget = chat::ChatPanel::new(app.session.messages(), app.chat_scroll);
    frame.render_widget(widget, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Sidebar;
    let widget = sidebar::Sidebar::new(&app.form, focused);
    frame.render_widget(widget, area);
}

fn render_notice(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(notice) = &app.notice {
        frame.render_widget(toast::Toast::new(notice), area);
    }
}

/// Renders the input bar.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let widget = input::InputBar::new(&app.input.text, app.input.cursor, focused);
    frame.render_widget(widget, area);

    // Position cursor in input field when focused
    if focused {
        let available = input::InputBar::available_width(area);
        let offset = input::calculate_scroll_offset(app.input.cursor, available);
        // Account for border (1) and prompt "> " (2)
        let cursor_x = area.x + 1 + 2 + (app.input.cursor - offset) as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
