use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};

/// Terminal input, already translated into what casegen cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    ForceQuit, // Ctrl+C
    Resize,

    // Editing
    InputChar(char),
    Paste(String), // Bracketed paste keeps newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    CursorUp,
    CursorDown,
    Submit,
    Escape,

    // Conversation
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    NextArtifact,     // Tab
    PreviousArtifact, // Shift+Tab

    // Preview and session
    OpenPreview,    // Ctrl+P
    CopyPreview,    // Ctrl+Y
    SavePreview,    // Ctrl+S
    RemoveLastChip, // Ctrl+X
    OpenModelPicker, // Ctrl+L
    NewSession,     // Ctrl+N
}

/// Poll for an event without blocking.
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Waits up to `timeout` for the next event we understand.
/// Terminal read errors are logged and treated as "no event".
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            log::warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(event) => translate(event),
        Err(e) => {
            log::warn!("Event read failed: {}", e);
            None
        }
    }
}

fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            log::debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                KeyCode::Char('c') if ctrl => Some(TuiEvent::ForceQuit),
                // Ctrl+J is ASCII LF; most terminals send it for Ctrl+Enter too
                KeyCode::Char('j') if ctrl => Some(TuiEvent::InputChar('\n')),
                KeyCode::Char('p') if ctrl => Some(TuiEvent::OpenPreview),
                KeyCode::Char('y') if ctrl => Some(TuiEvent::CopyPreview),
                KeyCode::Char('s') if ctrl => Some(TuiEvent::SavePreview),
                KeyCode::Char('x') if ctrl => Some(TuiEvent::RemoveLastChip),
                KeyCode::Char('l') if ctrl => Some(TuiEvent::OpenModelPicker),
                KeyCode::Char('n') if ctrl => Some(TuiEvent::NewSession),
                KeyCode::Char(_) if ctrl => None,
                KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
                KeyCode::Enter => Some(TuiEvent::Submit),
                KeyCode::Esc => Some(TuiEvent::Escape),
                KeyCode::Backspace => Some(TuiEvent::Backspace),
                KeyCode::Delete => Some(TuiEvent::Delete),
                KeyCode::Left => Some(TuiEvent::CursorLeft),
                KeyCode::Right => Some(TuiEvent::CursorRight),
                KeyCode::Home => Some(TuiEvent::CursorHome),
                KeyCode::End => Some(TuiEvent::CursorEnd),
                KeyCode::Up => Some(TuiEvent::CursorUp),
                KeyCode::Down => Some(TuiEvent::CursorDown),
                KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
                KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
                KeyCode::Tab => Some(TuiEvent::NextArtifact),
                KeyCode::BackTab => Some(TuiEvent::PreviousArtifact),
                _ => None,
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
