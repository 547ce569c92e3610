//! # TUI Adapter
//!
//! The ratatui layer. Owns the terminal, draws the session, and turns key
//! presses into `SessionController` intents. Nothing in `core` knows this
//! module exists.
//!
//! ## Redraw Strategy
//!
//! The loop redraws only when something changed:
//!
//! - the controller's `watch` counter moved (any accepted transition,
//!   including a generation result applied by `process_completions`)
//! - a terminal event arrived
//! - a generation is pending, so the spinner animates (~12fps)
//!
//! Otherwise it sleeps in `poll` for up to `IDLE_POLL`.
//!
//! A `SteadyBlock` cursor is used because `set_cursor_position` resets the
//! blink timer on every `draw()`.

mod attach;
mod commands;
mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::error::SessionError;
use crate::core::export::{self, Clipboard};
use crate::core::state::{Notice, Session};
use crate::core::turn::TurnId;
use crate::core::SessionController;
use crate::inference::GenerationProvider;
use crate::tui::commands::Command;
use crate::tui::component::EventHandler;
use crate::tui::components::{ConversationState, InputBox, InputEvent, ModelPickerEvent, ModelPickerState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ANIMATION_POLL: Duration = Duration::from_millis(80);
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Notices clear themselves after this long.
const NOTICE_TTL: Duration = Duration::from_secs(6);

/// Presentation state that is not part of the session.
pub struct TuiState {
    pub conversation: ConversationState,
    pub input_box: InputBox,
    /// Open while the overlay is shown
    pub model_picker: Option<ModelPickerState>,
    /// Artifact turn chosen with Tab / Shift+Tab
    pub selected_artifact: Option<TurnId>,
    /// Outcome of a front-end-only action (export, rejected attachment)
    pub flash: Option<Notice>,
    pub preview_scroll: u16,
    pub spinner_frame: usize,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            conversation: ConversationState::new(),
            input_box: InputBox::new(),
            model_picker: None,
            selected_artifact: None,
            flash: None,
            preview_scroll: 0,
            spinner_frame: 0,
        }
    }

    /// Forget per-session presentation state.
    fn reset_for_new_session(&mut self) {
        self.conversation.reset();
        self.selected_artifact = None;
        self.flash = None;
        self.preview_scroll = 0;
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Key release events stay off; only presses are handled
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Next (or previous) artifact-bearing turn after `current`, wrapping around.
fn cycle_artifact(session: &Session, current: Option<TurnId>, forward: bool) -> Option<TurnId> {
    let ids: Vec<TurnId> = session
        .turns()
        .iter()
        .filter(|t| t.has_artifact())
        .map(|t| t.id())
        .collect();
    if ids.is_empty() {
        return None;
    }
    let position = current.and_then(|id| ids.iter().position(|&i| i == id));
    let index = match (position, forward) {
        (None, true) => 0,
        (None, false) => ids.len() - 1,
        (Some(i), true) => (i + 1) % ids.len(),
        (Some(i), false) => (i + ids.len() - 1) % ids.len(),
    };
    Some(ids[index])
}

/// Everything the key handlers need besides the event itself.
struct App {
    controller: SessionController,
    tui: TuiState,
    config: ResolvedConfig,
    clipboard: Clipboard,
    /// When the notice on screen first appeared
    notice_since: Option<Instant>,
    should_quit: bool,
}

impl App {
    fn new(controller: SessionController, config: ResolvedConfig) -> Self {
        Self {
            controller,
            tui: TuiState::new(),
            config,
            clipboard: Clipboard::new(),
            notice_since: None,
            should_quit: false,
        }
    }

    fn flash(&mut self, notice: Notice) {
        debug!("Flash: {}", notice.text);
        // The newest message wins the title bar
        self.controller.dismiss_notice();
        self.tui.flash = Some(notice);
        self.notice_since = Some(Instant::now());
    }

    fn handle_event(&mut self, event: TuiEvent) {
        if let Some(picker) = self.tui.model_picker.as_mut() {
            if let Some(picked) = picker.handle_event(&event) {
                if let ModelPickerEvent::Select(name) = picked {
                    info!("Model selected: {}", name);
                    self.controller.select_model(name);
                }
                self.tui.model_picker = None;
            }
            return;
        }

        match event {
            TuiEvent::ForceQuit => self.should_quit = true,
            TuiEvent::Resize => {}
            TuiEvent::ScrollUp | TuiEvent::ScrollDown => {
                self.tui.conversation.handle_event(&event);
            }
            TuiEvent::ScrollPageUp | TuiEvent::ScrollPageDown => {
                if self.controller.session().preview_content().is_some() {
                    let page = 10;
                    self.tui.preview_scroll = if event == TuiEvent::ScrollPageUp {
                        self.tui.preview_scroll.saturating_sub(page)
                    } else {
                        self.tui.preview_scroll.saturating_add(page)
                    };
                } else {
                    self.tui.conversation.handle_event(&event);
                }
            }
            TuiEvent::NextArtifact | TuiEvent::PreviousArtifact => {
                let forward = event == TuiEvent::NextArtifact;
                let session = self.controller.session();
                self.tui.selected_artifact =
                    cycle_artifact(session, self.tui.selected_artifact, forward);
                if let Some(id) = self.tui.selected_artifact
                    && let Some(index) = session.turns().iter().position(|t| t.id() == id)
                {
                    self.tui.conversation.scroll_to_index(index);
                }
            }
            TuiEvent::OpenPreview => self.open_preview(),
            TuiEvent::Escape => {
                if self.controller.session().is_pending() {
                    self.controller.cancel_generation();
                } else if self.controller.session().preview_selection().is_some() {
                    self.controller.close_preview();
                } else {
                    self.controller.dismiss_notice();
                    self.tui.flash = None;
                }
            }
            TuiEvent::CopyPreview => self.copy_preview(),
            TuiEvent::SavePreview => self.save_preview(),
            TuiEvent::RemoveLastChip => {
                let staged = self.controller.session().staged().len();
                if staged > 0 {
                    let _ = self.controller.unstage(staged - 1);
                }
            }
            TuiEvent::OpenModelPicker => {
                let session = self.controller.session();
                self.tui.model_picker = Some(ModelPickerState::new(
                    self.config.models.clone(),
                    session.model_name(),
                ));
            }
            TuiEvent::NewSession => self.new_session(),
            _ => {
                if let Some(InputEvent::Submit(text)) = self.tui.input_box.handle_event(&event) {
                    self.submit(text);
                }
            }
        }
    }

    fn submit(&mut self, text: String) {
        if let Some(command) = commands::parse(&text) {
            if matches!(command, Command::Unknown(_)) {
                // let the user fix a typo instead of retyping
                self.tui.input_box.set_text(text);
            }
            self.run_command(command);
            return;
        }
        match self.controller.submit(text.clone()) {
            Ok(()) => {
                self.tui.conversation.stick_to_bottom = true;
            }
            Err(SessionError::EmptySubmission) => {}
            Err(SessionError::TurnInFlight) => {
                // keep what the user typed
                self.tui.input_box.set_text(text);
            }
            Err(e) => warn!("Submit rejected: {}", e),
        }
    }

    fn run_command(&mut self, command: Command) {
        debug!("Command: {:?}", command);
        match command {
            Command::Attach(paths) if paths.is_empty() => {
                self.flash(Notice::warning("Usage: /attach <path>..."));
            }
            Command::Attach(paths) => {
                let (accepted, rejected) = attach::collect(&paths);
                if !accepted.is_empty()
                    && let Err(e) = self.controller.stage(accepted)
                {
                    warn!("Stage rejected: {}", e);
                    return;
                }
                if !rejected.is_empty() {
                    self.flash(Notice::warning(format!(
                        "Not attached: {}",
                        rejected.join("; ")
                    )));
                }
            }
            Command::Remove(n) => {
                if n > self.controller.session().staged().len() {
                    self.flash(Notice::warning(format!("No attachment #{}", n)));
                } else {
                    let _ = self.controller.unstage(n - 1);
                }
            }
            Command::New => self.new_session(),
            Command::Copy => self.copy_preview(),
            Command::Save => self.save_preview(),
            Command::Unknown(name) => {
                self.flash(Notice::warning(format!("Unknown command: {}", name)));
            }
        }
    }

    fn open_preview(&mut self) {
        let session = self.controller.session();
        let target = self
            .tui
            .selected_artifact
            .or_else(|| session.ledger().last_artifact().map(|t| t.id()));
        let Some(id) = target else {
            self.flash(Notice::info("No test cases to preview yet"));
            return;
        };
        if self.controller.open_preview(id).is_ok() {
            self.tui.preview_scroll = 0;
            self.tui.selected_artifact = Some(id);
        }
    }

    fn copy_preview(&mut self) {
        let outcome = match self.controller.session().preview_content() {
            None => Notice::info("Open a preview first (Ctrl+P)"),
            Some(artifact) => match export::copy_to_clipboard(&mut self.clipboard, artifact) {
                Ok(()) => Notice::info("Copied to clipboard"),
                Err(e) => Notice::error(e.to_string()),
            },
        };
        self.flash(outcome);
    }

    fn save_preview(&mut self) {
        let dir = self
            .config
            .download_dir
            .clone()
            .unwrap_or_else(export::default_download_dir);
        let outcome = match self.controller.session().preview_content() {
            None => Notice::info("Open a preview first (Ctrl+P)"),
            Some(artifact) => match export::save_to_dir(artifact, &dir) {
                Ok(path) => Notice::info(format!("Saved to {}", path.display())),
                Err(e) => Notice::error(e.to_string()),
            },
        };
        self.flash(outcome);
    }

    fn new_session(&mut self) {
        self.controller.new_session();
        self.tui.reset_for_new_session();
        self.tui.input_box.clear();
    }

    /// Fails a generation that has been pending longer than the configured timeout.
    fn watchdog(&mut self) {
        let Some(started_at) = self
            .controller
            .session()
            .lifecycle()
            .pending()
            .map(|p| p.started_at)
        else {
            return;
        };
        let elapsed = (Utc::now() - started_at).to_std().unwrap_or_default();
        if elapsed >= self.config.generation_timeout {
            let secs = self.config.generation_timeout.as_secs();
            warn!("Generation pending for {:?}, failing it", elapsed);
            self.controller
                .fail_in_flight(format!("timed out after {}s", secs));
        }
    }

    /// Clears notices that have been on screen for `NOTICE_TTL`.
    fn expire_notice(&mut self) {
        let showing = self.controller.session().notice().is_some() || self.tui.flash.is_some();
        match (showing, self.notice_since) {
            (false, _) => self.notice_since = None,
            (true, None) => self.notice_since = Some(Instant::now()),
            (true, Some(since)) if since.elapsed() >= NOTICE_TTL => {
                self.controller.dismiss_notice();
                self.tui.flash = None;
                self.notice_since = None;
            }
            _ => {}
        }
    }
}

pub fn run(config: ResolvedConfig, provider: Arc<dyn GenerationProvider>) -> std::io::Result<()> {
    let session = Session::new(config.model_name.clone(), config.capabilities);
    let controller = SessionController::new(session, provider);
    let mut changes = controller.subscribe();
    let backend = controller.provider_name().to_string();
    let mut app = App::new(controller, config);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit {
        if app.controller.process_completions() > 0 {
            debug!("Applied generation results");
        }
        app.watchdog();

        // A new session notice replaces whatever the front-end flashed
        if changes.has_changed().unwrap_or(false) {
            let _ = changes.borrow_and_update();
            if app.controller.session().notice().is_some() {
                app.tui.flash = None;
                app.notice_since = Some(Instant::now());
            }
            needs_redraw = true;
        }
        app.expire_notice();

        let animating = app.controller.session().is_pending();
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            app.tui.spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            let chrome = ui::Chrome {
                backend: &backend,
                user_name: &app.config.user_name,
            };
            terminal.draw(|f| ui::draw_ui(f, app.controller.session(), &mut app.tui, &chrome))?;
            needs_redraw = false;
        }

        let timeout = if animating { ANIMATION_POLL } else { IDLE_POLL };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            app.handle_event(event);
            if app.should_quit {
                break;
            }
        }
    }

    info!("Quitting");
    app.controller.teardown();
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::core::turn::Artifact;
    use crate::inference::GeneratedTurn;
    use crate::core::config::{CasegenConfig, resolve as resolve_config};
    use crate::test_support::{echo_provider, test_session};

    fn test_app() -> App {
        let config = resolve_config(&CasegenConfig::default(), Some("scripted"), None);
        App::new(SessionController::new(test_session(), echo_provider()), config)
    }

    fn resolve(session: &mut Session, prompt: &str, artifact: Option<&str>) {
        update(session, Action::Submit(prompt.to_string()));
        let epoch = session.lifecycle().pending().map(|p| p.epoch).unwrap();
        let turn = match artifact {
            Some(title) => GeneratedTurn::with_artifact("done", Artifact::new(title, "body")),
            None => GeneratedTurn::text("no cases"),
        };
        update(session, Action::GenerationResolved { epoch, turn });
    }

    #[test]
    fn test_cycle_artifact_wraps_both_ways() {
        let mut session = test_session();
        assert_eq!(cycle_artifact(&session, None, true), None);

        resolve(&mut session, "login", Some("Login"));
        resolve(&mut session, "hello", None);
        resolve(&mut session, "checkout", Some("Checkout"));
        let login = session.turns()[1].id();
        let checkout = session.turns()[5].id();

        assert_eq!(cycle_artifact(&session, None, true), Some(login));
        assert_eq!(cycle_artifact(&session, None, false), Some(checkout));
        assert_eq!(cycle_artifact(&session, Some(login), true), Some(checkout));
        assert_eq!(cycle_artifact(&session, Some(checkout), true), Some(login));
        assert_eq!(cycle_artifact(&session, Some(login), false), Some(checkout));
    }

    #[tokio::test]
    async fn test_endpoint_prompt_is_submitted() {
        let mut app = test_app();
        app.submit("/api/v1/login should reject expired tokens".to_string());

        let session = app.controller.session();
        assert_eq!(session.turns().len(), 1);
        assert_eq!(
            session.turns()[0].content(),
            "/api/v1/login should reject expired tokens"
        );
        assert!(app.tui.flash.is_none());
    }

    #[test]
    fn test_unknown_command_keeps_typed_text() {
        let mut app = test_app();
        app.submit("/quit now".to_string());

        assert_eq!(app.tui.input_box.text(), "/quit now");
        assert!(app.controller.session().turns().is_empty());
        assert!(
            app.tui
                .flash
                .as_ref()
                .is_some_and(|n| n.text.contains("Unknown command"))
        );
    }
}
