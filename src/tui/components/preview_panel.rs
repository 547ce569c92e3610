//! Right-hand panel showing the artifact bound to the preview.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};

use crate::core::turn::Artifact;
use crate::tui::component::Component;
use crate::tui::markdown;

const HELP: &str = " Ctrl+Y copy  Ctrl+S save  Esc close ";

pub struct PreviewPanel<'a> {
    pub artifact: &'a Artifact,
    /// Rows scrolled from the top; clamped on render
    pub scroll: &'a mut u16,
}

impl<'a> Component for PreviewPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Line::styled(
                format!(" {} ", self.artifact.title),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from(HELP).style(Style::default().fg(Color::DarkGray)))
            .padding(Padding::horizontal(1));

        let inner = block.inner(area);
        let paragraph =
            Paragraph::new(markdown::render(&self.artifact.body, Color::Gray)).wrap(Wrap { trim: false });
        let max_scroll = (paragraph.line_count(inner.width) as u16).saturating_sub(inner.height);
        *self.scroll = (*self.scroll).min(max_scroll);

        frame.render_widget(paragraph.scroll((*self.scroll, 0)).block(block), area);
    }
}
