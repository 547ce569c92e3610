//! Frame layout. Pure rendering: reads the session and the TUI state, never
//! sends intents.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::core::state::Session;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{
    Conversation, FileChips, Landing, ModelPicker, PreviewPanel, TitleBar,
};

/// Share of the main area the conversation keeps while a preview is open.
const CONVERSATION_PERCENT: u16 = 60;

/// What the frame needs beyond the session itself.
pub struct Chrome<'a> {
    pub backend: &'a str,
    pub user_name: &'a str,
}

pub fn draw_ui(frame: &mut Frame, session: &Session, tui: &mut TuiState, chrome: &Chrome<'_>) {
    let area = frame.area();
    let chips = FileChips::new(session.staged());
    let chips_height = chips.height();
    let input_height = tui.input_box.calculate_height(area.width);

    let [title_area, main_area, chips_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(chips_height),
        Constraint::Length(input_height),
    ])
    .areas(area);

    let mut title_bar = TitleBar::new(session.model_name(), chrome.backend);
    title_bar.pending = session.is_pending();
    title_bar.notice = session.notice().or(tui.flash.as_ref()).cloned();
    title_bar.render(frame, title_area);

    let preview = session.preview_content();
    let (conversation_area, preview_area) = if preview.is_some() {
        let [left, right] = Layout::horizontal([
            Constraint::Percentage(CONVERSATION_PERCENT),
            Constraint::Percentage(100 - CONVERSATION_PERCENT),
        ])
        .areas(main_area);
        (left, Some(right))
    } else {
        (main_area, None)
    };

    if session.turns().is_empty() && !session.is_pending() {
        Landing {
            user_name: chrome.user_name,
        }
        .render(frame, conversation_area);
    } else {
        Conversation {
            state: &mut tui.conversation,
            turns: session.turns(),
            pending: session.is_pending(),
            spinner_frame: tui.spinner_frame,
            selected: tui.selected_artifact,
            previewed: session.preview_selection(),
        }
        .render(frame, conversation_area);
    }

    if let (Some(artifact), Some(preview_area)) = (preview, preview_area) {
        PreviewPanel {
            artifact,
            scroll: &mut tui.preview_scroll,
        }
        .render(frame, preview_area);
    }

    let mut chips = chips;
    chips.render(frame, chips_area);
    tui.input_box.render(frame, input_area);

    if let Some(picker) = tui.model_picker.as_mut() {
        ModelPicker::new(picker, session.model_name()).render(frame, area);
    }
}
