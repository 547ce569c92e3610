use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use casegen::core::error::Capability;
use casegen::core::staging::{PayloadHandle, StagedAttachment};
use casegen::core::state::NoticeLevel;
use casegen::core::turn::{Artifact, Role};
use casegen::core::{Capabilities, Session, SessionController, SessionError};
use casegen::inference::providers::SCRIPTED_ARTIFACT_TITLE;
use casegen::inference::{
    GeneratedTurn, GenerationError, GenerationProvider, GenerationRequest, ScriptedProvider,
};
use tokio::sync::Notify;

// ============================================================================
// Fake backends
// ============================================================================

/// Answers every prompt with a "Login Test Cases" artifact and remembers the
/// requests it saw.
#[derive(Default)]
struct RecordingProvider {
    seen: Mutex<Vec<GenerationRequest>>,
}

#[async_trait]
impl GenerationProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        let reply = format!("Cases for: {}", request.user_turn.content());
        self.seen.lock().unwrap().push(request);
        Ok(GeneratedTurn::with_artifact(
            reply,
            Artifact::new("Login Test Cases", "**Test Case 1: Valid Login**"),
        ))
    }
}

/// Plain-text replies, no artifact.
struct ChattyProvider;

#[async_trait]
impl GenerationProvider for ChattyProvider {
    fn name(&self) -> &str {
        "chatty"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        Ok(GeneratedTurn::text(format!("re: {}", request.user_turn.content())))
    }
}

/// Blocks until released.
#[derive(Default)]
struct GateProvider {
    release: Notify,
}

#[async_trait]
impl GenerationProvider for GateProvider {
    fn name(&self) -> &str {
        "gate"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        self.release.notified().await;
        Ok(GeneratedTurn::text("too late"))
    }
}

struct DownProvider;

#[async_trait]
impl GenerationProvider for DownProvider {
    fn name(&self) -> &str {
        "down"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        Err(GenerationError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }
}

fn controller_with(provider: Arc<dyn GenerationProvider>) -> SessionController {
    SessionController::new(
        Session::new("Cortexa-4 Pro", Capabilities::default()),
        provider,
    )
}

fn file(name: &str, media_type: &str) -> StagedAttachment {
    StagedAttachment::new(
        name,
        media_type,
        PayloadHandle::Memory(Arc::from(name.as_bytes())),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_submit_then_resolve_with_artifact() {
    let mut controller = controller_with(Arc::new(RecordingProvider::default()));

    controller.submit("test login").unwrap();
    assert_eq!(controller.session().turns().len(), 1);
    assert!(controller.session().is_pending());

    assert!(controller.next_completion().await);

    let turns = controller.session().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role(), Role::User);
    assert_eq!(turns[1].role(), Role::Assistant);
    assert_eq!(
        turns[1].artifact().map(|a| a.title.as_str()),
        Some("Login Test Cases")
    );
    assert!(!controller.session().is_pending());
}

#[tokio::test]
async fn test_blank_submit_with_two_staged_files() {
    let provider = Arc::new(RecordingProvider::default());
    let mut controller = controller_with(provider.clone());

    controller
        .stage(vec![
            file("login-fsd.pdf", "application/pdf"),
            file("cr-42.docx", "application/msword"),
        ])
        .unwrap();
    controller.submit("").unwrap();

    let session = controller.session();
    let user_turn = &session.turns()[0];
    assert_eq!(
        user_turn.attachment().map(|a| a.name.as_str()),
        Some("login-fsd.pdf")
    );
    assert!(!user_turn.content().is_empty());
    assert!(session.staged().is_empty());

    assert!(controller.next_completion().await);
    let seen = provider.seen.lock().unwrap();
    // the backend still gets every staged file
    assert_eq!(seen[0].attachments.len(), 2);
    assert_eq!(seen[0].model, "Cortexa-4 Pro");
}

#[tokio::test]
async fn test_empty_submission_changes_nothing() {
    let mut controller = controller_with(Arc::new(RecordingProvider::default()));

    assert_eq!(controller.submit("   "), Err(SessionError::EmptySubmission));
    assert!(controller.session().turns().is_empty());
    assert!(!controller.session().is_pending());
    assert!(controller.session().notice().is_none());
    assert!(!controller.next_completion().await);
}

#[tokio::test]
async fn test_open_preview_without_artifact_keeps_selection() {
    let mut controller = controller_with(Arc::new(RecordingProvider::default()));
    controller.submit("test login").unwrap();
    controller.next_completion().await;

    let (turn1, turn2) = {
        let turns = controller.session().turns();
        (turns[0].id(), turns[1].id())
    };

    controller.open_preview(turn2).unwrap();
    assert_eq!(
        controller.open_preview(turn1),
        Err(SessionError::NoArtifact(turn1))
    );
    assert_eq!(controller.session().preview_selection(), Some(turn2));
    assert_eq!(
        controller.session().preview_content().map(|a| a.title.as_str()),
        Some("Login Test Cases")
    );
}

#[tokio::test]
async fn test_submit_while_pending_is_rejected() {
    let gate = Arc::new(GateProvider::default());
    let mut controller = controller_with(gate.clone());

    controller.submit("first").unwrap();
    assert_eq!(controller.submit("second"), Err(SessionError::TurnInFlight));
    assert_eq!(controller.session().turns().len(), 1);
    assert_eq!(
        controller.session().notice().map(|n| n.level),
        Some(NoticeLevel::Warning)
    );

    gate.release.notify_one();
    assert!(controller.next_completion().await);
    assert_eq!(controller.session().turns().len(), 2);
    assert!(!controller.session().is_pending());
}

#[tokio::test]
async fn test_teardown_discards_stale_result() {
    let gate = Arc::new(GateProvider::default());
    let mut controller = controller_with(gate.clone());

    controller.submit("test login").unwrap();
    controller.teardown();
    gate.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(controller.process_completions(), 0);
    assert_eq!(controller.session().turns().len(), 1);
    assert!(!controller.session().is_pending());
}

#[tokio::test]
async fn test_backend_failure_keeps_user_turn_for_resubmit() {
    let mut controller = controller_with(Arc::new(DownProvider));

    controller.submit("test login").unwrap();
    assert!(controller.next_completion().await);

    let session = controller.session();
    assert_eq!(session.turns().len(), 1);
    assert!(!session.is_pending());
    let notice = session.notice().expect("error notice");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.text.contains("overloaded"));

    // idle again, so the user can resubmit
    assert!(controller.submit("test login").is_ok());
}

#[tokio::test]
async fn test_ledger_order_follows_submissions() {
    let mut controller = controller_with(Arc::new(ChattyProvider));

    for prompt in ["login", "logout", "password reset"] {
        controller.submit(prompt).unwrap();
        assert!(controller.next_completion().await);
    }

    let contents: Vec<&str> = controller
        .session()
        .turns()
        .iter()
        .map(|t| t.content())
        .collect();
    assert_eq!(
        contents,
        vec![
            "login",
            "re: login",
            "logout",
            "re: logout",
            "password reset",
            "re: password reset"
        ]
    );
}

#[tokio::test]
async fn test_disabled_attachments_capability() {
    let mut controller = SessionController::new(
        Session::new(
            "Cortexa-4 Pro",
            Capabilities {
                attachments: false,
                preview: true,
            },
        ),
        Arc::new(ChattyProvider),
    );

    assert_eq!(
        controller.stage(vec![file("fsd.pdf", "application/pdf")]),
        Err(SessionError::CapabilityDisabled(Capability::Attachments))
    );
    assert!(controller.session().staged().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_each_change() {
    let mut controller = controller_with(Arc::new(ChattyProvider));
    let mut changes = controller.subscribe();

    controller.submit("hello").unwrap();
    assert!(changes.has_changed().unwrap());
    let _ = changes.borrow_and_update();

    controller.next_completion().await;
    assert!(changes.has_changed().unwrap());
}

#[tokio::test]
async fn test_scripted_backend_end_to_end() {
    let mut controller = controller_with(Arc::new(ScriptedProvider::new(Duration::ZERO)));

    controller.stage(vec![file("login-fsd.pdf", "application/pdf")]).unwrap();
    controller.submit("Generate test cases").unwrap();
    assert!(controller.next_completion().await);

    let reply = &controller.session().turns()[1];
    assert!(reply.content().contains("login-fsd.pdf"));
    let artifact = reply.artifact().expect("scripted suite");
    assert_eq!(artifact.title, SCRIPTED_ARTIFACT_TITLE);
    assert!(artifact.body.contains("**Test Case 5: Session Management**"));
}
