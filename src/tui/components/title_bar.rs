//! # TitleBar Component
//!
//! One-line status bar at the top of the screen.
//!
//! Shows, left to right: the app name, the active model, the backend, a
//! "generating" marker while a turn is pending, and the current notice.
//! The notice is whichever is more recent of the session's own notice and
//! the TUI-local flash (export results, rejected attachments); the caller
//! decides and passes one in.
//!
//! Stateless: every field is a prop set by the parent right before rendering.
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(session.model_name(), "scripted");
//! title_bar.pending = session.is_pending();
//! title_bar.notice = session.notice().cloned();
//! title_bar.render(frame, title_area);
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::state::{Notice, NoticeLevel};
use crate::tui::component::Component;

pub struct TitleBar {
    pub model_name: String,
    pub backend: String,
    pub pending: bool,
    pub notice: Option<Notice>,
}

impl TitleBar {
    pub fn new(model_name: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            backend: backend.into(),
            pending: false,
            notice: None,
        }
    }
}

pub(crate) fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => Color::Green,
        NoticeLevel::Warning => Color::Yellow,
        NoticeLevel::Error => Color::Red,
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(
                "casegen",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" (model: {}, {})", self.model_name, self.backend), dim),
        ];

        if self.pending {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled("generating…", Style::default().fg(Color::Yellow)));
        }

        if let Some(notice) = &self.notice {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled(
                notice.text.clone(),
                Style::default().fg(notice_color(notice.level)),
            ));
        }

        frame.render_widget(Line::from(spans), area);
    }
}
