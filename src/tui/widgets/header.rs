//! Header widget for the TUI.
//!
//! Displays the title, a busy label and the connection indicator.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Application title.
pub const TITLE: &str = "Chat with Database";

/// Header bar widget.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
    busy: Option<&'a str>,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: Option<&'a str>, busy: Option<&'a str>) -> Self {
        Self {
            connection_info,
            busy,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_span = Span::styled(format!(" {TITLE}"), style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        if let Some(busy) = self.busy {
            let busy_style = style.fg(Color::Yellow);
            let width = busy.chars().count() as u16;
            let x = area.x + area.width.saturating_sub(width) / 2;
            buf.set_string(x, area.y, busy, busy_style);
        }

        let (dot, dot_color, info) = match self.connection_info {
            Some(info) => ("●", Color::Green, info),
            None => ("○", Color::Gray, "not connected"),
        };
        let info_text = format!(" [db: {info}] ");
        let right_width = info_text.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, dot, style.fg(dot_color));
            buf.set_string(right_x + 2, area.y, &info_text, style);
        }
    }
}
