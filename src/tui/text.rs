//! Text helpers for the TUI: char/byte conversion and word wrapping.

/// Byte offset of the `char_index`-th character, or `text.len()` past the end.
pub fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Character index where the word before `cursor` starts.
///
/// Whitespace directly before the cursor is skipped first, so repeated
/// Ctrl+W removes one word at a time.
pub fn previous_word_start(text: &str, cursor: usize) -> usize {
    let before: Vec<char> = text.chars().take(cursor).collect();
    let trailing_space = before
        .iter()
        .rev()
        .take_while(|c| c.is_whitespace())
        .count();
    let word = before
        .iter()
        .rev()
        .skip(trailing_space)
        .take_while(|c| !c.is_whitespace())
        .count();
    before.len() - trailing_space - word
}

/// Wraps text to `width` columns, breaking at spaces where possible.
///
/// Embedded newlines start new lines. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split(' ') {
            let word_len = word.chars().count();

            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }

            let mut chars = word.chars().peekable();
            while chars.peek().is_some() {
                if current_len == width {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let room = width - current_len;
                let chunk: String = chars.by_ref().take(room).collect();
                current_len += chunk.chars().count();
                current.push_str(&chunk);
            }
        }

        lines.push(current);
    }

    lines
}
