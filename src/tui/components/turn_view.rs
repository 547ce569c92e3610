use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::turn::{Role, Turn};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and the text.
const CONTENT_PAD_H: u16 = 1;
/// Borders (left + right) plus padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Top and bottom border.
const VERTICAL_OVERHEAD: u16 = 2;

/// One turn of the conversation, drawn as a rounded box.
///
/// The title carries the author and time. User turns show the attached
/// document on its own line; assistant turns that produced an artifact end
/// with an "Open in Preview" footer, highlighted when the turn is the
/// Tab-selected one and marked when it is the one currently in the preview.
///
/// Like every row of the conversation this is rebuilt each frame; the
/// parent owns selection state and passes it in.
#[derive(Clone, Copy)]
pub struct TurnView<'a> {
    pub turn: &'a Turn,
    pub selected: bool,
    pub previewed: bool,
}

impl<'a> TurnView<'a> {
    pub fn new(turn: &'a Turn, selected: bool, previewed: bool) -> Self {
        Self {
            turn,
            selected,
            previewed,
        }
    }

    /// Text rows inside the border, before wrapping.
    fn body_lines(turn: &Turn) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(attachment) = turn.attachment() {
            lines.push(format!("📎 {}", attachment.name));
        }
        lines.extend(turn.content().trim().lines().map(str::to_string));
        if let Some(artifact) = turn.artifact() {
            lines.push(String::new());
            lines.push(footer_text(&artifact.title));
        }
        lines
    }

    /// Rendered height at `width`, predicted with `textwrap` so the list can
    /// lay out the scroll view without drawing.
    pub fn calculate_height(turn: &Turn, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }

        let options = textwrap::Options::new(content_width as usize)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);

        let rows: usize = Self::body_lines(turn)
            .iter()
            .map(|line| textwrap::wrap(line, &options).len().max(1))
            .sum();
        (rows as u16).max(1) + VERTICAL_OVERHEAD
    }
}

fn footer_text(title: &str) -> String {
    format!("▸ {} · Open in Preview", title)
}

fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Green,
        Role::Assistant => Color::Blue,
    }
}

impl<'a> Widget for TurnView<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let color = role_color(self.turn.role());
        let border_style = if self.selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        let title = format!(
            " {} · {} ",
            self.turn.role().label(),
            self.turn.created_at().format("%H:%M")
        );
        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let text_style = Style::default().fg(color);
        let mut lines: Vec<Line> = Vec::new();
        if let Some(attachment) = self.turn.attachment() {
            lines.push(Line::from(Span::styled(
                format!("📎 {}", attachment.name),
                Style::default().fg(Color::Magenta),
            )));
        }
        for line in self.turn.content().trim().lines() {
            lines.push(Line::from(Span::styled(line.to_string(), text_style)));
        }
        if let Some(artifact) = self.turn.artifact() {
            let footer_style = if self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let mut footer = vec![Span::styled(footer_text(&artifact.title), footer_style)];
            if self.previewed {
                footer.push(Span::styled(" ●", Style::default().fg(Color::Cyan)));
            }
            lines.push(Line::default());
            lines.push(Line::from(footer));
        }

        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

impl<'a> Component for TurnView<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
