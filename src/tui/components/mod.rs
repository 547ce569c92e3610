//! # TUI Components
//!
//! Every widget on screen, one file each.
//!
//! Stateless components take all data as struct fields and are rebuilt every
//! frame: `TitleBar`, `TurnView`, `FileChips`, `PreviewPanel`, `Landing`.
//!
//! Stateful ones keep their state in `TuiState` between frames and are
//! wrapped each frame with borrowed state and props: `InputBox`,
//! `Conversation` (`ConversationState`), `ModelPicker` (`ModelPickerState`).
//!
//! ```text
//! components/
//! ├── title_bar.rs      app name, model, notice
//! ├── conversation.rs   scrollable turns + pending block
//! ├── turn_view.rs      one turn
//! ├── file_chips.rs     staged attachments
//! ├── input_box.rs      prompt editor
//! ├── preview_panel.rs  artifact preview
//! ├── model_picker.rs   model overlay
//! └── landing.rs        empty-session greeting
//! ```

pub mod conversation;
pub mod file_chips;
pub mod input_box;
pub mod landing;
pub mod model_picker;
pub mod preview_panel;
pub mod title_bar;
pub mod turn_view;

pub use conversation::{Conversation, ConversationState};
pub use file_chips::FileChips;
pub use input_box::{InputBox, InputEvent};
pub use landing::Landing;
pub use model_picker::{ModelPicker, ModelPickerEvent, ModelPickerState};
pub use preview_panel::PreviewPanel;
pub use title_bar::TitleBar;
pub use turn_view::TurnView;
