//! # InputBox Component
//!
//! Multi-line prompt editor at the bottom of the screen.
//!
//! The buffer and cursor (a byte offset, always on a char boundary) are
//! internal state. Text wraps with `textwrap` using the same options as the
//! height calculation, so the box grows with its content up to
//! `MAX_VISIBLE_LINES` and then scrolls to keep the cursor in view.
//!
//! Enter always emits `Submit`, even for a blank buffer: a turn may carry
//! only an attachment, and the session decides whether the submission is
//! empty.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const PLACEHOLDER: &str = "Describe the feature you want to test, or upload a document...";
const HINT: &str = " Enter send · Ctrl+J newline · /attach <path> ";
/// Rows of text shown before the box starts scrolling
pub const MAX_VISIBLE_LINES: u16 = 6;
/// Top and bottom border
const VERTICAL_OVERHEAD: u16 = 2;
/// Left and right border
const HORIZONTAL_OVERHEAD: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Submit(String),
    Changed,
}

#[derive(Default)]
pub struct InputBox {
    buffer: String,
    cursor: usize,
    /// First wrapped row shown
    scroll: u16,
}

fn wrap_options(width: usize) -> textwrap::Options<'static> {
    textwrap::Options::new(width.max(1))
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Wrapped rows of `text`; a trailing newline opens a new empty row.
fn wrapped_rows(text: &str, width: usize) -> Vec<String> {
    let mut rows: Vec<String> = text
        .split('\n')
        .flat_map(|line| {
            let wrapped = textwrap::wrap(line, wrap_options(width));
            if wrapped.is_empty() {
                vec![String::new()]
            } else {
                wrapped.into_iter().map(|c| c.into_owned()).collect()
            }
        })
        .collect();
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}

fn prev_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map_or(0, |(i, _)| i)
}

fn next_boundary(s: &str, pos: usize) -> usize {
    s[pos..]
        .chars()
        .next()
        .map_or(s.len(), |c| pos + c.len_utf8())
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replace the buffer and park the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.cursor = self.buffer.len();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    /// Box height for the current buffer at `width`, borders included.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;
        let rows = wrapped_rows(&self.buffer, inner).len() as u16;
        rows.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Row and column of the cursor inside the wrapped text.
    fn cursor_row_col(&self, width: usize) -> (u16, u16) {
        let rows = wrapped_rows(&self.buffer[..self.cursor], width);
        let row = rows.len().saturating_sub(1) as u16;
        let col = rows
            .last()
            .map_or(0, |r| unicode_width::UnicodeWidthStr::width(r.as_str()) as u16);
        (row, col)
    }

    fn line_bounds(&self) -> (usize, usize) {
        let start = self.buffer[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
        let end = self.buffer[self.cursor..]
            .find('\n')
            .map_or(self.buffer.len(), |i| self.cursor + i);
        (start, end)
    }

    /// Move to the same column on the previous (`up`) or next logical line.
    fn move_line(&mut self, up: bool) -> bool {
        let (start, end) = self.line_bounds();
        let column = self.buffer[start..self.cursor].chars().count();
        let (target_start, target_end) = if up {
            if start == 0 {
                return false;
            }
            let prev_end = start - 1;
            let prev_start = self.buffer[..prev_end].rfind('\n').map_or(0, |i| i + 1);
            (prev_start, prev_end)
        } else {
            if end == self.buffer.len() {
                return false;
            }
            let next_start = end + 1;
            let next_end = self.buffer[next_start..]
                .find('\n')
                .map_or(self.buffer.len(), |i| next_start + i);
            (next_start, next_end)
        };
        self.cursor = self.buffer[target_start..target_end]
            .char_indices()
            .nth(column)
            .map_or(target_end, |(i, _)| target_start + i);
        true
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(" Message ")
            .title_bottom(Line::from(HINT).style(Style::default().fg(Color::DarkGray)));

        if self.buffer.is_empty() {
            let placeholder = Paragraph::new(PLACEHOLDER)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(placeholder, area);
            frame.set_cursor_position((area.x + 1, area.y + 1));
            return;
        }

        let visible = area.height.saturating_sub(VERTICAL_OVERHEAD).max(1);
        let (row, col) = self.cursor_row_col(inner_width);
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + visible {
            self.scroll = row + 1 - visible;
        }

        let rows = wrapped_rows(&self.buffer, inner_width);
        let shown: Vec<Line> = rows
            .into_iter()
            .skip(self.scroll as usize)
            .take(visible as usize)
            .map(Line::from)
            .collect();
        frame.render_widget(
            Paragraph::new(shown)
                .style(Style::default().fg(Color::Green))
                .block(block),
            area,
        );

        let x = area.x + 1 + col.min(inner_width as u16);
        let y = area.y + 1 + (row - self.scroll);
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<InputEvent> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                // some terminals paste CRLF
                let text = text.replace("\r\n", "\n").replace('\r', "\n");
                self.buffer.insert_str(self.cursor, &text);
                self.cursor += text.len();
                Some(InputEvent::Changed)
            }
            TuiEvent::Backspace if self.cursor > 0 => {
                let prev = prev_boundary(&self.buffer, self.cursor);
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                Some(InputEvent::Changed)
            }
            TuiEvent::Delete if self.cursor < self.buffer.len() => {
                let next = next_boundary(&self.buffer, self.cursor);
                self.buffer.drain(self.cursor..next);
                Some(InputEvent::Changed)
            }
            TuiEvent::CursorLeft if self.cursor > 0 => {
                self.cursor = prev_boundary(&self.buffer, self.cursor);
                Some(InputEvent::Changed)
            }
            TuiEvent::CursorRight if self.cursor < self.buffer.len() => {
                self.cursor = next_boundary(&self.buffer, self.cursor);
                Some(InputEvent::Changed)
            }
            TuiEvent::CursorHome => {
                let (start, _) = self.line_bounds();
                (self.cursor != start).then(|| {
                    self.cursor = start;
                    InputEvent::Changed
                })
            }
            TuiEvent::CursorEnd => {
                let (_, end) = self.line_bounds();
                (self.cursor != end).then(|| {
                    self.cursor = end;
                    InputEvent::Changed
                })
            }
            TuiEvent::CursorUp => self.move_line(true).then_some(InputEvent::Changed),
            TuiEvent::CursorDown => self.move_line(false).then_some(InputEvent::Changed),
            TuiEvent::Submit => {
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.scroll = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
        input
    }

    #[test]
    fn test_typing_and_submit_clears() {
        let mut input = typed("test login");
        assert_eq!(input.text(), "test login");
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit("test login".to_string()))
        );
        assert_eq!(input.text(), "");
    }

    #[test]
    fn test_blank_submit_still_emits() {
        let mut input = InputBox::new();
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit(String::new()))
        );
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = typed("héllo");
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.text(), "hllo");
        input.handle_event(&TuiEvent::CursorHome);
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.text(), "llo");
    }

    #[test]
    fn test_vertical_movement_keeps_column() {
        let mut input = typed("abcdef\nxy");
        // cursor at end of "xy" (column 2), up lands on 'c'
        assert_eq!(input.handle_event(&TuiEvent::CursorUp), Some(InputEvent::Changed));
        input.handle_event(&TuiEvent::InputChar('_'));
        assert_eq!(input.text(), "ab_cdef\nxy");
        assert_eq!(input.handle_event(&TuiEvent::CursorUp), None);
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::Paste("one\r\ntwo".to_string()));
        assert_eq!(input.text(), "one\ntwo");
    }

    #[test]
    fn test_height_grows_then_caps() {
        let mut input = InputBox::new();
        assert_eq!(input.calculate_height(40), 1 + VERTICAL_OVERHEAD);
        input.set_text("a\nb\nc");
        assert_eq!(input.calculate_height(40), 3 + VERTICAL_OVERHEAD);
        input.set_text("x\n".repeat(20));
        assert_eq!(
            input.calculate_height(40),
            MAX_VISIBLE_LINES + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn test_placeholder_when_empty() {
        let mut input = InputBox::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 3)).unwrap();
        terminal.draw(|f| input.render(f, f.area())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Describe the feature you want to test"));
    }
}
