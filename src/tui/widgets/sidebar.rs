//! Sidebar widget for the TUI.
//!
//! Displays the connection form: one row per field and a Connect button.

use crate::tui::app::SettingsForm;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Label of the button row.
pub const CONNECT_BUTTON: &str = "[ Connect ]";

/// Sidebar widget for the connection settings.
pub struct Sidebar<'a> {
    form: &'a SettingsForm,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    /// Creates a new sidebar widget.
    pub fn new(form: &'a SettingsForm, focused: bool) -> Self {
        Self { form, focused }
    }

    fn row_style(&self, index: usize) -> Style {
        if self.focused && self.form.selected == index {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Settings ");

        let label_style = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::with_capacity(self.form.fields.len() * 2 + 1);

        for (i, field) in self.form.fields.iter().enumerate() {
            lines.push(Line::from(Span::styled(format!("{}:", field.label), label_style)));
            lines.push(Line::from(Span::styled(
                format!(" {}", field.display_value()),
                self.row_style(i),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            CONNECT_BUTTON,
            self.row_style(self.form.fields.len()).add_modifier(Modifier::BOLD),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
