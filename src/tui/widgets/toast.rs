//! Notice widget for the TUI.
//!
//! Renders the current notice as a one-line banner colored by its kind.

use crate::tui::app::{Notice, NoticeKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Notice banner widget.
pub struct Toast<'a> {
    notice: &'a Notice,
}

impl<'a> Toast<'a> {
    /// Creates a new toast widget.
    pub fn new(notice: &'a Notice) -> Self {
        Self { notice }
    }

    fn color(&self) -> Color {
        match self.notice.kind {
            NoticeKind::Info => Color::Cyan,
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        }
    }
}

/// Shortens `message` to `max_chars`, ending with an ellipsis when cut.
pub fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let kept: String = message.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

impl Widget for Toast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let display_msg = truncate(&self.notice.message, area.width.saturating_sub(1) as usize);

        let line = Line::from(vec![Span::styled(
            format!(" {display_msg}"),
            Style::default()
                .fg(self.color())
                .add_modifier(Modifier::BOLD),
        )]);

        Paragraph::new(line).render(area, buf);
    }
}
