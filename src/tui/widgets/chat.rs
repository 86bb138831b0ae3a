//! Chat panel widget for the TUI.
//!
//! Displays the conversation log, newest at the bottom.

use crate::llm::{Message, Role};
use crate::tui::text::wrap_text;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    messages: &'a [Message],
    /// Lines scrolled up from the bottom.
    scroll: usize,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    pub fn new(messages: &'a [Message], scroll: usize) -> Self {
        Self { messages, scroll }
    }
}

fn label_style(role: Role) -> Style {
    let color = match role {
        Role::Assistant => Color::Cyan,
        Role::User => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Lays out all messages for the given width: a role label line, the
/// wrapped content, then a blank separator.
pub fn chat_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        lines.push(Line::from(Span::styled(
            message.role.label(),
            label_style(message.role),
        )));
        lines.extend(
            // Terminals draw nothing for tabs; query results use them.
            wrap_text(&message.content.replace('\t', "  "), width.saturating_sub(2))
                .into_iter()
                .map(|l| Line::from(format!("  {l}"))),
        );
        lines.push(Line::from(""));
    }
    lines
}

fn panel_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ")
}

/// How far the log can scroll up when drawn into `area`.
pub fn max_scroll(messages: &[Message], area: Rect) -> usize {
    let inner = panel_block().inner(area);
    chat_lines(messages, inner.width as usize)
        .len()
        .saturating_sub(inner.height as usize)
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel_block();
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = chat_lines(self.messages, inner.width as usize);
        let height = inner.height as usize;
        let max_scroll = lines.len().saturating_sub(height);
        let scroll = self.scroll.min(max_scroll);
        let start = lines.len().saturating_sub(height + scroll);
        let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();

        Paragraph::new(visible).render(inner, buf);
    }
}
