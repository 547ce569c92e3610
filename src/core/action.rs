//! # Actions
//!
//! Everything that can happen to a session becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::GenerationResolved { epoch, turn }`.
//!
//! `update()` applies one action to the session and returns the `Effect`
//! the caller must perform. No I/O here; the controller spawns and aborts
//! generation tasks.
//!
//! ```text
//! Session + Action  →  update()  →  Session' + Effect
//! ```

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::core::error::{Capability, SessionError};
use crate::core::lifecycle::Epoch;
use crate::core::staging::StagedAttachment;
use crate::core::state::{Notice, Session};
use crate::core::turn::{Turn, TurnId};
use crate::inference::{GeneratedTurn, GenerationRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Submit(String),
    Stage(Vec<StagedAttachment>),
    Unstage(usize),
    GenerationResolved { epoch: Epoch, turn: GeneratedTurn },
    GenerationFailed { epoch: Epoch, reason: String },
    CancelGeneration,
    OpenPreview(TurnId),
    ClosePreview,
    SelectModel(String),
    DismissNotice,
    Teardown,
}

/// A generation the controller has to start for `epoch`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub epoch: Epoch,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    SpawnGeneration(GenerationJob),
    AbortGeneration,
    Rejected(SessionError),
}

pub fn update(session: &mut Session, action: Action) -> Effect {
    debug!("update: {:?}", action);
    let before = (session.ledger.len(), session.staged().len());
    let effect = match action {
        Action::Submit(text) => submit(session, text),
        Action::Stage(files) => stage(session, files),
        Action::Unstage(index) => unstage(session, index),
        Action::GenerationResolved { epoch, turn } => resolve(session, epoch, turn),
        Action::GenerationFailed { epoch, reason } => fail(session, epoch, reason),
        Action::CancelGeneration => {
            if let Some(pending) = session.lifecycle.cancel() {
                info!("Generation {} cancelled by user", pending.epoch);
                session.notice = Some(Notice::info("Generation cancelled"));
                touch(session);
                Effect::AbortGeneration
            } else {
                Effect::None
            }
        }
        Action::OpenPreview(id) => open_preview(session, id),
        Action::ClosePreview => {
            if let Some(preview) = session.preview.as_mut()
                && preview.selection().is_some()
            {
                preview.close();
                touch(session);
            }
            Effect::None
        }
        Action::SelectModel(name) => {
            info!("Model changed: {} -> {}", session.model_name, name);
            session.notice = Some(Notice::info(format!("Model: {name}")));
            session.model_name = name;
            touch(session);
            Effect::None
        }
        Action::DismissNotice => {
            if session.notice.take().is_some() {
                touch(session);
            }
            Effect::None
        }
        Action::Teardown => teardown(session),
    };
    debug!(
        "update done: turns {} -> {}, staged {} -> {}, effect={:?}",
        before.0,
        session.ledger.len(),
        before.1,
        session.staged().len(),
        effect_name(&effect)
    );
    effect
}

fn effect_name(effect: &Effect) -> &'static str {
    match effect {
        Effect::None => "none",
        Effect::SpawnGeneration(_) => "spawn",
        Effect::AbortGeneration => "abort",
        Effect::Rejected(_) => "rejected",
    }
}

fn touch(session: &mut Session) {
    session.revision += 1;
}

/// Ledger errors are programming errors; there is no state to recover into.
fn ledger_invariant(result: Result<(), SessionError>) {
    if let Err(e) = result {
        error!("Turn ledger invariant violated: {}", e);
        panic!("turn ledger invariant violated: {e}");
    }
}

fn reject_with_notice(session: &mut Session, err: SessionError) -> Effect {
    warn!("Rejected: {}", err);
    session.notice = Some(Notice::warning(err.to_string()));
    touch(session);
    Effect::Rejected(err)
}

fn submit(session: &mut Session, text: String) -> Effect {
    if text.trim().is_empty() && session.staged().is_empty() {
        debug!("Empty submission ignored");
        return Effect::Rejected(SessionError::EmptySubmission);
    }
    if session.lifecycle.is_pending() {
        return reject_with_notice(session, SessionError::TurnInFlight);
    }

    let now = Utc::now();
    let id = session.next_turn_id(now);
    let epoch = match session.lifecycle.begin(id, now) {
        Ok(epoch) => epoch,
        Err(e) => return reject_with_notice(session, e),
    };

    let attachments = session
        .staging
        .as_mut()
        .map(|staging| staging.drain_all())
        .unwrap_or_default();
    let history = session.ledger.turns().to_vec();
    let user_turn = Turn::user(id, &text, attachments.first().map(StagedAttachment::to_ref), now);
    ledger_invariant(session.ledger.append(user_turn.clone()));

    info!(
        "Accepted turn {} ({} chars, {} attachments), generation {}",
        id,
        text.len(),
        attachments.len(),
        epoch
    );
    session.notice = None;
    touch(session);

    Effect::SpawnGeneration(GenerationJob {
        epoch,
        request: GenerationRequest {
            user_turn,
            attachments,
            history,
            model: session.model_name.clone(),
        },
    })
}

fn resolve(session: &mut Session, epoch: Epoch, generated: GeneratedTurn) -> Effect {
    let Some(pending) = session.lifecycle.settle(epoch) else {
        debug!("Ignoring stale completion for generation {}", epoch);
        return Effect::None;
    };

    let now = Utc::now();
    let id = session.next_turn_id(now);
    let GeneratedTurn { content, artifact } = generated;
    let has_artifact = artifact.is_some();
    ledger_invariant(session.ledger.append(Turn::assistant(id, content, None, now)));
    if let Some(artifact) = artifact {
        ledger_invariant(session.ledger.attach_artifact(id, artifact));
    }

    let elapsed_ms = (now - pending.started_at).num_milliseconds();
    info!(
        "Generation {} resolved turn {} as {} after {}ms (artifact: {})",
        epoch, pending.responding_to, id, elapsed_ms, has_artifact
    );
    touch(session);
    Effect::None
}

fn fail(session: &mut Session, epoch: Epoch, reason: String) -> Effect {
    let Some(pending) = session.lifecycle.settle(epoch) else {
        debug!("Ignoring stale failure for generation {}: {}", epoch, reason);
        return Effect::None;
    };
    warn!(
        "Generation {} for turn {} failed: {}",
        epoch, pending.responding_to, reason
    );
    let err = SessionError::GenerationFailure(reason);
    session.notice = Some(Notice::error(err.to_string()));
    touch(session);
    Effect::None
}

fn stage(session: &mut Session, files: Vec<StagedAttachment>) -> Effect {
    let Some(staging) = session.staging.as_mut() else {
        return reject_with_notice(session, SessionError::CapabilityDisabled(Capability::Attachments));
    };
    if files.is_empty() {
        return Effect::None;
    }
    for file in &files {
        debug!("Staging {} ({})", file.display_name, file.media_type);
    }
    staging.stage(files);
    touch(session);
    Effect::None
}

fn unstage(session: &mut Session, index: usize) -> Effect {
    let Some(staging) = session.staging.as_mut() else {
        return reject_with_notice(session, SessionError::CapabilityDisabled(Capability::Attachments));
    };
    match staging.unstage(index) {
        Some(removed) => {
            debug!("Unstaged {} at {}", removed.display_name, index);
            touch(session);
        }
        None => debug!("Unstage index {} out of range, ignored", index),
    }
    Effect::None
}

fn open_preview(session: &mut Session, id: TurnId) -> Effect {
    let Some(preview) = session.preview.as_mut() else {
        return reject_with_notice(session, SessionError::CapabilityDisabled(Capability::Preview));
    };
    match preview.open(&session.ledger, id) {
        Ok(artifact) => {
            debug!("Preview opened for turn {}: {}", id, artifact.title);
            touch(session);
            Effect::None
        }
        Err(e) => reject_with_notice(session, e),
    }
}

fn teardown(session: &mut Session) -> Effect {
    if let Some(pending) = session.lifecycle.cancel() {
        info!(
            "Session {} torn down with generation {} in flight",
            session.id, pending.epoch
        );
    }
    if let Some(staging) = session.staging.as_mut() {
        staging.drain_all();
    }
    if let Some(preview) = session.preview.as_mut() {
        preview.close();
    }
    session.notice = None;
    touch(session);
    Effect::AbortGeneration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::LifecycleState;
    use crate::core::staging::PayloadHandle;
    use crate::core::state::{Capabilities, NoticeLevel};
    use crate::core::turn::{Artifact, Role};
    use crate::test_support::{staged_file, test_session};

    fn spawned(effect: Effect) -> GenerationJob {
        match effect {
            Effect::SpawnGeneration(job) => job,
            other => panic!("expected SpawnGeneration, got {:?}", other),
        }
    }

    fn login_cases() -> GeneratedTurn {
        GeneratedTurn::with_artifact(
            "I've analyzed your requirement and generated test cases.",
            Artifact::new("Login Test Cases", "**Test Case 1: Valid Login**"),
        )
    }

    /// Submits `text` and resolves it with a plain reply.
    fn round_trip(session: &mut Session, text: &str) {
        let job = spawned(update(session, Action::Submit(text.to_string())));
        update(
            session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: GeneratedTurn::text(format!("re: {text}")),
            },
        );
    }

    #[test]
    fn test_submit_then_resolve_with_artifact() {
        let mut session = test_session();
        let job = spawned(update(&mut session, Action::Submit("test login".into())));

        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role(), Role::User);
        assert_eq!(session.turns()[0].content(), "test login");
        assert!(session.is_pending());
        assert_eq!(job.request.user_turn.id(), session.turns()[0].id());
        assert!(job.request.history.is_empty());
        assert_eq!(job.request.model, "test-model");

        let effect = update(
            &mut session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: login_cases(),
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(session.turns().len(), 2);
        let reply = &session.turns()[1];
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.artifact().map(|a| a.title.as_str()), Some("Login Test Cases"));
        assert!(reply.id() > session.turns()[0].id());
        assert_eq!(session.lifecycle().state(), LifecycleState::Idle);
    }

    #[test]
    fn test_empty_submission_changes_nothing() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Submit("   \n".into()));
        assert_eq!(effect, Effect::Rejected(SessionError::EmptySubmission));
        assert!(session.turns().is_empty());
        assert!(!session.is_pending());
        assert!(session.notice().is_none());
        assert_eq!(session.revision(), 0);
        assert_eq!(session.lifecycle().latest_epoch().get(), 0);
    }

    #[test]
    fn test_submit_while_pending_is_turn_in_flight() {
        let mut session = test_session();
        let first = spawned(update(&mut session, Action::Submit("first".into())));
        update(&mut session, Action::Stage(vec![staged_file("next.txt")]));

        let effect = update(&mut session, Action::Submit("second".into()));
        assert_eq!(effect, Effect::Rejected(SessionError::TurnInFlight));
        assert_eq!(session.turns().len(), 1);
        // staged files for the next turn survive the rejection
        assert_eq!(session.staged().len(), 1);
        assert_eq!(session.lifecycle().pending().map(|p| p.epoch), Some(first.epoch));
        let notice = session.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[test]
    fn test_ledger_order_matches_accepted_submissions() {
        let mut session = test_session();
        round_trip(&mut session, "one");

        let job = spawned(update(&mut session, Action::Submit("two".into())));
        update(
            &mut session,
            Action::GenerationFailed {
                epoch: job.epoch,
                reason: "boom".into(),
            },
        );
        round_trip(&mut session, "three");

        let contents: Vec<&str> = session.turns().iter().map(|t| t.content()).collect();
        assert_eq!(contents, vec!["one", "re: one", "two", "three", "re: three"]);
        let ids: Vec<TurnId> = session.turns().iter().map(|t| t.id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_stage_two_files_submit_blank() {
        let mut session = test_session();
        update(
            &mut session,
            Action::Stage(vec![staged_file("fsd.pdf"), staged_file("cr.docx")]),
        );
        let job = spawned(update(&mut session, Action::Submit(String::new())));

        let turn = &session.turns()[0];
        assert_eq!(turn.attachment().map(|a| a.name.as_str()), Some("fsd.pdf"));
        assert!(!turn.content().is_empty());
        assert!(session.staged().is_empty());
        // every staged file still reaches the backend
        assert_eq!(job.request.attachments.len(), 2);
        assert_eq!(job.request.attachments[1].display_name, "cr.docx");
    }

    #[test]
    fn test_failure_surfaces_notice_without_turn() {
        let mut session = test_session();
        let job = spawned(update(&mut session, Action::Submit("test login".into())));
        update(
            &mut session,
            Action::GenerationFailed {
                epoch: job.epoch,
                reason: "network error: refused".into(),
            },
        );
        assert_eq!(session.turns().len(), 1);
        assert!(!session.is_pending());
        let notice = session.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("network error: refused"));

        // the user can send again
        assert!(matches!(
            update(&mut session, Action::Submit("test login".into())),
            Effect::SpawnGeneration(_)
        ));
    }

    #[test]
    fn test_stale_resolve_after_teardown_is_ignored() {
        let mut session = test_session();
        let job = spawned(update(&mut session, Action::Submit("test login".into())));
        assert_eq!(update(&mut session, Action::Teardown), Effect::AbortGeneration);
        assert!(!session.is_pending());

        let effect = update(
            &mut session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: login_cases(),
            },
        );
        assert_eq!(effect, Effect::None);
        assert_eq!(session.turns().len(), 1);
    }

    #[test]
    fn test_stale_resolve_from_older_epoch_is_ignored() {
        let mut session = test_session();
        let old = spawned(update(&mut session, Action::Submit("first".into())));
        update(&mut session, Action::CancelGeneration);
        let current = spawned(update(&mut session, Action::Submit("second".into())));

        update(
            &mut session,
            Action::GenerationResolved {
                epoch: old.epoch,
                turn: GeneratedTurn::text("late"),
            },
        );
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.lifecycle().pending().map(|p| p.epoch), Some(current.epoch));
    }

    #[test]
    fn test_cancel_generation() {
        let mut session = test_session();
        assert_eq!(update(&mut session, Action::CancelGeneration), Effect::None);
        spawned(update(&mut session, Action::Submit("go".into())));
        assert_eq!(update(&mut session, Action::CancelGeneration), Effect::AbortGeneration);
        assert!(!session.is_pending());
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.notice().map(|n| n.text.as_str()), Some("Generation cancelled"));
    }

    #[test]
    fn test_open_preview_without_artifact_keeps_selection() {
        let mut session = test_session();
        let job = spawned(update(&mut session, Action::Submit("plain".into())));
        update(
            &mut session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: GeneratedTurn::text("no artifact"),
            },
        );
        let job = spawned(update(&mut session, Action::Submit("test login".into())));
        update(
            &mut session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: login_cases(),
            },
        );
        let plain = session.turns()[1].id();
        let with_artifact = session.turns()[3].id();

        assert_eq!(update(&mut session, Action::OpenPreview(with_artifact)), Effect::None);
        assert_eq!(session.preview_selection(), Some(with_artifact));

        let effect = update(&mut session, Action::OpenPreview(plain));
        assert_eq!(effect, Effect::Rejected(SessionError::NoArtifact(plain)));
        assert_eq!(session.preview_selection(), Some(with_artifact));
        assert_eq!(
            session.preview_content().map(|a| a.title.as_str()),
            Some("Login Test Cases")
        );

        update(&mut session, Action::ClosePreview);
        assert!(session.preview_content().is_none());
    }

    #[test]
    fn test_unstage_out_of_range_is_noop() {
        let mut session = test_session();
        update(&mut session, Action::Stage(vec![staged_file("a.txt")]));
        let revision = session.revision();
        assert_eq!(update(&mut session, Action::Unstage(5)), Effect::None);
        assert_eq!(session.revision(), revision);
        update(&mut session, Action::Unstage(0));
        assert!(session.staged().is_empty());
    }

    #[test]
    fn test_disabled_capabilities_are_reported() {
        let mut session = Session::new(
            "m",
            Capabilities {
                attachments: false,
                preview: false,
            },
        );
        let file = StagedAttachment::new("a.txt", "text/plain", PayloadHandle::File("a.txt".into()));
        assert_eq!(
            update(&mut session, Action::Stage(vec![file])),
            Effect::Rejected(SessionError::CapabilityDisabled(Capability::Attachments))
        );

        let job = spawned(update(&mut session, Action::Submit("hi".into())));
        assert!(job.request.attachments.is_empty());
        update(
            &mut session,
            Action::GenerationResolved {
                epoch: job.epoch,
                turn: login_cases(),
            },
        );
        // the artifact is recorded even though nothing can preview it
        let reply = session.turns()[1].id();
        assert!(session.turns()[1].has_artifact());
        assert_eq!(
            update(&mut session, Action::OpenPreview(reply)),
            Effect::Rejected(SessionError::CapabilityDisabled(Capability::Preview))
        );
    }

    #[test]
    fn test_select_model_and_dismiss_notice() {
        let mut session = test_session();
        update(&mut session, Action::SelectModel("Cortexa-3.5 Turbo".into()));
        assert_eq!(session.model_name(), "Cortexa-3.5 Turbo");
        assert!(session.notice().is_some());
        update(&mut session, Action::DismissNotice);
        assert!(session.notice().is_none());

        let job = spawned(update(&mut session, Action::Submit("x".into())));
        assert_eq!(job.request.model, "Cortexa-3.5 Turbo");
    }

    #[test]
    fn test_history_snapshot_excludes_new_turn() {
        let mut session = test_session();
        round_trip(&mut session, "one");
        let job = spawned(update(&mut session, Action::Submit("two".into())));
        assert_eq!(job.request.history.len(), 2);
        assert_eq!(job.request.history[0].content(), "one");
        assert_eq!(job.request.user_turn.content(), "two");
    }
}
