//! # Landing Component
//!
//! Shown in place of the conversation while the session has no turns:
//! a greeting and two cards describing what to upload.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};

use crate::tui::component::Component;

const INTRO: &str =
    "Upload a requirement document or ask a question to begin generating test cases.";

const CARDS: [(&str, &str); 2] = [
    (
        "Upload FSD",
        "Upload your Functional Specification Document for comprehensive test case generation",
    ),
    (
        "Analyze CR",
        "Upload Change Requests to generate targeted test scenarios",
    ),
];

const CARD_WIDTH: u16 = 34;
const CARD_HEIGHT: u16 = 6;

pub struct Landing<'a> {
    pub user_name: &'a str,
}

impl<'a> Component for Landing<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [greeting_area, _, cards_area, _, hint_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(CARD_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .flex(Flex::Center)
        .areas(area);

        let greeting = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Hello, {}", self.user_name),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(INTRO, Style::default().fg(Color::Gray))),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(greeting, greeting_area);

        let card_areas = Layout::horizontal([Constraint::Length(CARD_WIDTH); 2])
            .flex(Flex::Center)
            .spacing(2)
            .split(cards_area);
        for ((title, body), card_area) in CARDS.iter().zip(card_areas.iter()) {
            let card = Paragraph::new(*body)
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true })
                .block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(Color::DarkGray))
                        .title(Span::styled(
                            format!(" {} ", title),
                            Style::default()
                                .fg(Color::Magenta)
                                .add_modifier(Modifier::BOLD),
                        ))
                        .padding(Padding::horizontal(1)),
                );
            frame.render_widget(card, *card_area);
        }

        let hint = Paragraph::new(Line::from(Span::styled(
            "/attach <path> to upload · Ctrl+L models · Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(hint, hint_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_greets_user_and_shows_cards() {
        let mut terminal = Terminal::new(TestBackend::new(90, 16)).unwrap();
        terminal
            .draw(|f| Landing { user_name: "Priya" }.render(f, f.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(text.contains("Hello, Priya"));
        assert!(text.contains("Upload FSD"));
        assert!(text.contains("Analyze CR"));
    }
}
