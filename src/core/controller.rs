//! # Session Controller
//!
//! Owns the `Session` and is the only caller of `update()`. Performs the
//! returned effects and tells subscribers that something changed.
//!
//! ```text
//!  intent ──► update(session, action) ──► Effect
//!                                          │
//!              ┌───────────────────────────┼──────────────────┐
//!              ▼                           ▼                  ▼
//!       SpawnGeneration              AbortGeneration      Rejected(err)
//!       tokio::spawn(generate)       handle.abort()       Err(err) to caller
//!              │
//!              └──► mpsc ──► process_completions() / next_completion()
//!                              └──► update(GenerationResolved | GenerationFailed)
//! ```
//!
//! Every accepted transition bumps the `watch` revision returned by
//! `subscribe()`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;

use crate::core::action::{Action, Effect, GenerationJob, update};
use crate::core::error::SessionError;
use crate::core::staging::StagedAttachment;
use crate::core::state::Session;
use crate::core::turn::TurnId;
use crate::inference::GenerationProvider;

pub struct SessionController {
    session: Session,
    provider: Arc<dyn GenerationProvider>,
    completions_tx: mpsc::UnboundedSender<Action>,
    completions_rx: mpsc::UnboundedReceiver<Action>,
    in_flight: Option<AbortHandle>,
    changes: watch::Sender<u64>,
    seen_revision: u64,
}

impl SessionController {
    pub fn new(session: Session, provider: Arc<dyn GenerationProvider>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (changes, _) = watch::channel(0);
        info!(
            "Session {} started (model={}, backend={})",
            session.id(),
            session.model_name(),
            provider.name()
        );
        Self {
            seen_revision: session.revision(),
            session,
            provider,
            completions_tx,
            completions_rx,
            in_flight: None,
            changes,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Change notifications. The value is a counter, not the session revision:
    /// it keeps increasing across `new_session()`.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    // ── Intents ─────────────────────────────────────────────────────────

    pub fn submit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(Action::Submit(text.into()))
    }

    pub fn stage(&mut self, files: Vec<StagedAttachment>) -> Result<(), SessionError> {
        self.dispatch(Action::Stage(files))
    }

    pub fn unstage(&mut self, index: usize) -> Result<(), SessionError> {
        self.dispatch(Action::Unstage(index))
    }

    pub fn open_preview(&mut self, id: TurnId) -> Result<(), SessionError> {
        self.dispatch(Action::OpenPreview(id))
    }

    pub fn close_preview(&mut self) {
        let _ = self.dispatch(Action::ClosePreview);
    }

    pub fn select_model(&mut self, name: impl Into<String>) {
        let _ = self.dispatch(Action::SelectModel(name.into()));
    }

    pub fn dismiss_notice(&mut self) {
        let _ = self.dispatch(Action::DismissNotice);
    }

    pub fn cancel_generation(&mut self) {
        let _ = self.dispatch(Action::CancelGeneration);
    }

    /// Fails the in-flight generation, if any. Used by timeouts outside the core.
    /// Returns whether there was anything to fail.
    pub fn fail_in_flight(&mut self, reason: impl Into<String>) -> bool {
        let Some(epoch) = self.session.lifecycle().pending().map(|p| p.epoch) else {
            return false;
        };
        self.abort_in_flight();
        let _ = self.dispatch(Action::GenerationFailed {
            epoch,
            reason: reason.into(),
        });
        true
    }

    // ── Completions ─────────────────────────────────────────────────────

    /// Applies every generation result that has already arrived. Never blocks.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.completions_rx.try_recv() {
            self.apply_completion(action);
            applied += 1;
        }
        applied
    }

    /// Waits for the next generation result and applies it.
    ///
    /// Returns `false` without waiting when nothing is queued and no task is
    /// running.
    pub async fn next_completion(&mut self) -> bool {
        if let Ok(action) = self.completions_rx.try_recv() {
            self.apply_completion(action);
            return true;
        }
        if self.in_flight.is_none() {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(action) => {
                self.apply_completion(action);
                true
            }
            None => false,
        }
    }

    // ── Lifetime ────────────────────────────────────────────────────────

    /// Aborts any in-flight generation and returns the lifecycle to Idle.
    pub fn teardown(&mut self) {
        let _ = self.dispatch(Action::Teardown);
    }

    /// Tears the current session down and starts a fresh one with the same
    /// model and capabilities.
    pub fn new_session(&mut self) {
        self.teardown();
        let previous = self.session.id().clone();
        self.session = self.session.successor();
        // Old tasks keep the old sender; their results go nowhere.
        let (tx, rx) = mpsc::unbounded_channel();
        self.completions_tx = tx;
        self.completions_rx = rx;
        self.seen_revision = self.session.revision();
        info!("Session {} replaced by {}", previous, self.session.id());
        self.changes.send_modify(|n| *n += 1);
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        let outcome = match update(&mut self.session, action) {
            Effect::None => Ok(()),
            Effect::SpawnGeneration(job) => {
                self.spawn_generation(job);
                Ok(())
            }
            Effect::AbortGeneration => {
                self.abort_in_flight();
                Ok(())
            }
            Effect::Rejected(err) => Err(err),
        };
        self.publish();
        outcome
    }

    fn apply_completion(&mut self, action: Action) {
        let _ = self.dispatch(action);
        if !self.session.is_pending() {
            self.in_flight = None;
        }
    }

    fn publish(&mut self) {
        let revision = self.session.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.changes.send_modify(|n| *n += 1);
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!("Aborting generation task");
            handle.abort();
        }
    }

    fn spawn_generation(&mut self, job: GenerationJob) {
        self.abort_in_flight();
        let GenerationJob { epoch, request } = job;
        let provider = Arc::clone(&self.provider);
        let tx = self.completions_tx.clone();
        info!(
            "Spawning generation {} on {} (model={}, {} attachments, {} prior turns)",
            epoch,
            provider.name(),
            request.model,
            request.attachments.len(),
            request.history.len()
        );

        let handle = tokio::spawn(async move {
            let started = std::time::Instant::now();
            let outcome = AssertUnwindSafe(provider.generate(request))
                .catch_unwind()
                .await;
            let action = match outcome {
                Ok(Ok(turn)) => Action::GenerationResolved { epoch, turn },
                Ok(Err(e)) => Action::GenerationFailed {
                    epoch,
                    reason: e.to_string(),
                },
                Err(panic) => {
                    let reason = panic_reason(panic.as_ref());
                    warn!("Generation {} panicked: {}", epoch, reason);
                    Action::GenerationFailed { epoch, reason }
                }
            };
            debug!(
                "Generation {} finished in {}ms",
                epoch,
                started.elapsed().as_millis()
            );
            if tx.send(action).is_err() {
                warn!("Generation {} finished after its session was replaced", epoch);
            }
        });
        self.in_flight = Some(handle.abort_handle());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("backend panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::NoticeLevel;
    use crate::inference::{GeneratedTurn, GenerationError, GenerationRequest};
    use crate::test_support::{
        FailingProvider, GatedProvider, echo_provider, staged_file, test_session,
    };
    use async_trait::async_trait;

    struct PanickingProvider;

    #[async_trait]
    impl GenerationProvider for PanickingProvider {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
            panic!("model exploded");
        }
    }

    async fn settle_tasks() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_submit_and_resolve_through_task() {
        let mut controller = SessionController::new(test_session(), echo_provider());
        controller.submit("test login").unwrap();
        assert!(controller.session().is_pending());

        assert!(controller.next_completion().await);
        let turns = controller.session().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content(), "echo: test login");
        assert!(!controller.session().is_pending());
        assert!(controller.in_flight.is_none());
    }

    #[tokio::test]
    async fn test_next_completion_without_work_returns_immediately() {
        let mut controller = SessionController::new(test_session(), echo_provider());
        assert!(!controller.next_completion().await);
    }

    #[tokio::test]
    async fn test_panicking_backend_becomes_failure() {
        let mut controller = SessionController::new(test_session(), Arc::new(PanickingProvider));
        controller.submit("boom").unwrap();
        assert!(controller.next_completion().await);

        assert!(!controller.session().is_pending());
        assert_eq!(controller.session().turns().len(), 1);
        let notice = controller.session().notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("model exploded"));
    }

    #[tokio::test]
    async fn test_failing_backend_leaves_user_turn() {
        let mut controller = SessionController::new(test_session(), Arc::new(FailingProvider));
        controller.submit("test login").unwrap();
        controller.next_completion().await;
        assert_eq!(controller.session().turns().len(), 1);
        assert!(controller.session().notice().unwrap().text.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_queued_result_is_stale_after_teardown() {
        let mut controller = SessionController::new(test_session(), echo_provider());
        controller.submit("test login").unwrap();
        settle_tasks().await;

        controller.teardown();
        assert!(!controller.session().is_pending());
        assert_eq!(controller.process_completions(), 1);
        assert_eq!(controller.session().turns().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_in_flight_aborts_task() {
        let provider = Arc::new(GatedProvider::default());
        let mut controller = SessionController::new(test_session(), provider.clone());
        assert!(!controller.fail_in_flight("timed out"));

        controller.submit("slow").unwrap();
        settle_tasks().await;
        assert_eq!(provider.calls(), 1);

        assert!(controller.fail_in_flight("timed out after 1s"));
        assert!(!controller.session().is_pending());
        assert!(controller.in_flight.is_none());
        provider.release.notify_waiters();
        settle_tasks().await;
        assert_eq!(controller.process_completions(), 0);
        assert_eq!(controller.session().turns().len(), 1);
    }

    #[tokio::test]
    async fn test_new_session_drops_old_results() {
        let mut controller = SessionController::new(test_session(), echo_provider());
        let first_id = controller.session().id().clone();
        controller.stage(vec![staged_file("fsd.pdf")]).unwrap();
        controller.submit("").unwrap();
        settle_tasks().await;

        controller.new_session();
        assert_ne!(controller.session().id(), &first_id);
        assert!(controller.session().turns().is_empty());
        assert_eq!(controller.process_completions(), 0);

        // epochs restart in the new session without colliding
        controller.submit("again").unwrap();
        assert!(controller.next_completion().await);
        assert_eq!(controller.session().turns().len(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_accepted_transitions_only() {
        let mut controller = SessionController::new(test_session(), echo_provider());
        let mut changes = controller.subscribe();
        assert!(!changes.has_changed().unwrap());

        assert_eq!(controller.submit("  "), Err(SessionError::EmptySubmission));
        assert!(!changes.has_changed().unwrap());

        controller.submit("hello").unwrap();
        assert!(changes.has_changed().unwrap());
        changes.mark_unchanged();

        controller.next_completion().await;
        assert!(changes.has_changed().unwrap());
        let seen = *changes.borrow_and_update();

        controller.new_session();
        assert!(*changes.borrow_and_update() > seen);
    }
}
