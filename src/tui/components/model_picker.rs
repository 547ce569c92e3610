//! # Model Picker Component
//!
//! Overlay for switching the model name the next generation is requested
//! with. Opened with Ctrl+L.
//!
//! Persistent state + transient wrapper:
//! - `ModelPickerState` lives in `TuiState` while the overlay is open
//! - `ModelPicker` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::core::config::ModelEntry;
use crate::tui::components::file_chips::truncate_to_width;
use crate::tui::event::TuiEvent;

pub struct ModelPickerState {
    pub models: Vec<ModelEntry>,
    pub list_state: ListState,
}

impl ModelPickerState {
    /// Opens with the active model highlighted, or the first entry.
    pub fn new(models: Vec<ModelEntry>, current_model: &str) -> Self {
        let mut list_state = ListState::default();
        if !models.is_empty() {
            let index = models
                .iter()
                .position(|m| m.name == current_model)
                .unwrap_or(0);
            list_state.select(Some(index));
        }
        Self { models, list_state }
    }

    pub fn selected(&self) -> Option<&ModelEntry> {
        self.list_state.selected().and_then(|i| self.models.get(i))
    }

    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<ModelPickerEvent> {
        match event {
            TuiEvent::Escape | TuiEvent::OpenModelPicker => Some(ModelPickerEvent::Dismiss),
            TuiEvent::CursorUp if !self.models.is_empty() => {
                let i = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some(i.saturating_sub(1)));
                None
            }
            TuiEvent::CursorDown if !self.models.is_empty() => {
                let i = self.list_state.selected().unwrap_or(0);
                self.list_state.select(Some((i + 1).min(self.models.len() - 1)));
                None
            }
            TuiEvent::Submit => self
                .selected()
                .map(|model| ModelPickerEvent::Select(model.name.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPickerEvent {
    Select(String),
    Dismiss,
}

pub struct ModelPicker<'a> {
    state: &'a mut ModelPickerState,
    current_model: &'a str,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut ModelPickerState, current_model: &'a str) -> Self {
        Self {
            state,
            current_model,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(60, 50, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Models ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" Enter select  Esc back ").centered())
            .padding(Padding::horizontal(1));

        if self.state.models.is_empty() {
            let empty = Paragraph::new(
                "No models configured.\nAdd [[models]] entries to ~/.casegen/config.toml",
            )
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let inner_width = overlay.width.saturating_sub(4) as usize; // borders + padding
        let selected = self.state.list_state.selected();
        let items: Vec<ListItem> = self
            .state
            .models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                let is_active = model.name == self.current_model;
                let marker = if is_active { "● " } else { "  " };
                let name = truncate_to_width(&model.name, inner_width.saturating_sub(2));

                let style = if selected == Some(i) {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_active {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };

                let mut lines = vec![Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(name, style),
                ])];
                if let Some(description) = &model.description {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", truncate_to_width(description, inner_width.saturating_sub(2))),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        frame.render_stateful_widget(List::new(items).block(block), overlay, &mut self.state.list_state);
    }
}

/// A rect of `percent_x` by `percent_y` centered in `outer`.
fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
