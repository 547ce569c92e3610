//! # Conversation Component
//!
//! Scrollable view of the session's turns, with a trailing "Analyzing…"
//! block while a generation is pending.
//!
//! ## Architecture
//!
//! `Conversation` is rebuilt every frame around `&mut ConversationState`
//! (persistent: scroll position, cached heights) and the session's turns
//! (props). `render` takes `&mut self`, so the layout cache and the scroll
//! state are updated during the render pass.
//!
//! ## Layout cache
//!
//! The ledger is append-only and a turn's text never changes after it is
//! appended, so a cached height stays valid until the width changes or the
//! turn count shrinks (a new session). Only newly appended turns are measured.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::turn::{Turn, TurnId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::turn_view::TurnView;
use crate::tui::event::TuiEvent;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Bordered one-line block
const PENDING_HEIGHT: u16 = 3;

pub struct ConversationState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// Follow new turns as they arrive
    pub stick_to_bottom: bool,
    /// Last known viewport height, for clamping between frames
    pub viewport_height: u16,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    /// Forget cached heights and scroll position (new session).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn max_offset(&self) -> u16 {
        self.layout.total().saturating_sub(self.viewport_height)
    }

    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll so the turn at `index` is fully visible (its top edge if it is
    /// taller than the viewport).
    pub fn scroll_to_index(&mut self, index: usize) {
        let Some(bottom) = self.layout.prefix_heights.get(index).copied() else {
            return;
        };
        let top = bottom.saturating_sub(self.layout.heights[index]);
        let offset_y = self.scroll_state.offset().y;

        if top < offset_y || bottom.saturating_sub(top) > self.viewport_height {
            self.scroll_state.set_offset(Position { x: 0, y: top });
            self.stick_to_bottom = false;
        } else if bottom > offset_y + self.viewport_height {
            let y = bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y });
            self.stick_to_bottom = y >= self.max_offset();
        }
    }
}

impl EventHandler for ConversationState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached per-turn heights at one width.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    /// Running sums: `prefix_heights[i]` is the bottom edge of turn `i`
    pub prefix_heights: Vec<u16>,
    width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            width: 0,
        }
    }

    pub fn total(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Measure whatever is not cached yet. Returns how many heights were reused.
    pub fn update(&mut self, turns: &[Turn], width: u16) -> usize {
        if width != self.width || turns.len() < self.heights.len() {
            self.heights.clear();
            self.width = width;
        }
        let reused = self.heights.len();
        for turn in &turns[reused..] {
            self.heights.push(TurnView::calculate_height(turn, width));
        }
        if reused != self.heights.len() || self.prefix_heights.len() != self.heights.len() {
            self.prefix_heights = self
                .heights
                .iter()
                .scan(0u16, |acc, &h| {
                    *acc = acc.saturating_add(h);
                    Some(*acc)
                })
                .collect();
        }
        reused
    }

    /// Turns that intersect the viewport, with half a screen of slack each way.
    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let slack = viewport_height / 2;
        let top = scroll_offset.saturating_sub(slack);
        let bottom = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(slack);

        let start = self.prefix_heights.partition_point(|&end| end <= top);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < bottom)
            .saturating_add(1)
            .min(self.prefix_heights.len());
        start..end
    }
}

pub struct Conversation<'a> {
    pub state: &'a mut ConversationState,
    pub turns: &'a [Turn],
    pub pending: bool,
    pub spinner_frame: usize,
    /// Tab-selected artifact turn
    pub selected: Option<TurnId>,
    /// Turn whose artifact is in the preview panel
    pub previewed: Option<TurnId>,
}

impl<'a> Component for Conversation<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_sub(1); // scrollbar column
        self.state.layout.update(self.turns, width);
        self.state.viewport_height = area.height;

        let turns_height = self.state.layout.total();
        let canvas_height = if self.pending {
            turns_height.saturating_add(PENDING_HEIGHT)
        } else {
            turns_height
        };

        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let mut scroll_view = ScrollView::new(Size::new(width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let range = self
            .state
            .layout
            .visible_range(self.state.scroll_state.offset().y, area.height);
        for i in range {
            let turn = &self.turns[i];
            let height = self.state.layout.heights[i];
            let y = self.state.layout.prefix_heights[i].saturating_sub(height);
            let view = TurnView::new(
                turn,
                self.selected == Some(turn.id()),
                self.previewed == Some(turn.id()),
            );
            scroll_view.render_widget(view, Rect::new(0, y, width, height));
        }

        if self.pending {
            let glyph = SPINNER[self.spinner_frame % SPINNER.len()];
            let block = Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::DarkGray));
            let pending = Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", glyph), Style::default().fg(Color::Yellow)),
                Span::styled(
                    "Analyzing…",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]))
            .block(block);
            scroll_view.render_widget(pending, Rect::new(0, turns_height, width, PENDING_HEIGHT));
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}
