//! Row of staged attachments shown above the input box.
//!
//! Each chip is `[n] 📄 name`; `n` is the 1-based index `/remove` takes.
//! Long names are shortened with an ellipsis so one chip never eats the row.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::staging::StagedAttachment;
use crate::tui::component::Component;

/// Display columns a chip name may take before it is shortened.
const MAX_NAME_WIDTH: usize = 24;

/// Shorten `s` to at most `max_width` display columns, ending in "…" when cut.
pub(crate) fn truncate_to_width(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

pub struct FileChips<'a> {
    pub items: &'a [StagedAttachment],
}

impl<'a> FileChips<'a> {
    pub fn new(items: &'a [StagedAttachment]) -> Self {
        Self { items }
    }

    /// One row when anything is staged, nothing otherwise.
    pub fn height(&self) -> u16 {
        u16::from(!self.items.is_empty())
    }

    fn line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            "Attached: ",
            Style::default().fg(Color::DarkGray),
        )];
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            spans.push(Span::styled(
                format!("[{}] ", i + 1),
                Style::default().fg(Color::DarkGray),
            ));
            spans.push(Span::styled(
                format!("📄 {}", truncate_to_width(&item.display_name, MAX_NAME_WIDTH)),
                Style::default().fg(Color::Magenta),
            ));
        }
        spans.push(Span::styled(
            "  (Ctrl+X removes last)",
            Style::default().fg(Color::DarkGray),
        ));
        Line::from(spans)
    }
}

impl<'a> Component for FileChips<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.items.is_empty() {
            return;
        }
        frame.render_widget(self.line(), area);
    }
}
