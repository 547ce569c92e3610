use ratatui::Frame;
use ratatui::layout::Rect;

/// Something that draws itself into a `Rect`.
///
/// Props live in struct fields; `&mut self` lets a component update caches
/// (layout heights, scroll offsets) while rendering, like ratatui's
/// `StatefulWidget`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that turns raw `TuiEvent`s into its own higher-level events.
pub trait EventHandler {
    type Event;

    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
