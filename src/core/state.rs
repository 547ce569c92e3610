//! # Session State
//!
//! The aggregate root. One `Session` per conversation, owned by the
//! `SessionController`; nothing else gets a `&mut` to it.
//!
//! ```text
//! Session
//! ├── id: SessionId                      // uuid v4
//! ├── model_name: String                 // set by the model picker
//! ├── ledger: TurnLedger                 // completed turns, in order
//! ├── staging: Option<AttachmentStaging> // None = attachments disabled
//! ├── lifecycle: ResponseLifecycle       // Idle | Pending(epoch)
//! ├── preview: Option<ArtifactPreviewBinding> // None = preview disabled
//! ├── notice: Option<Notice>             // transient, never in the ledger
//! └── revision: u64                      // bumped on every accepted transition
//! ```
//!
//! State changes only happen through `update(session, action)` in action.rs.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::ledger::TurnLedger;
use crate::core::lifecycle::ResponseLifecycle;
use crate::core::preview::ArtifactPreviewBinding;
use crate::core::staging::{AttachmentStaging, StagedAttachment};
use crate::core::turn::{Artifact, Turn, TurnId, TurnIdGenerator};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which optional components the session is wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub attachments: bool,
    pub preview: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            attachments: true,
            preview: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient message for the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) model_name: String,
    pub(crate) capabilities: Capabilities,
    pub(crate) ledger: TurnLedger,
    pub(crate) staging: Option<AttachmentStaging>,
    pub(crate) lifecycle: ResponseLifecycle,
    pub(crate) preview: Option<ArtifactPreviewBinding>,
    pub(crate) notice: Option<Notice>,
    pub(crate) ids: TurnIdGenerator,
    pub(crate) revision: u64,
}

impl Session {
    pub fn new(model_name: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            id: SessionId::generate(),
            model_name: model_name.into(),
            capabilities,
            ledger: TurnLedger::new(),
            staging: capabilities.attachments.then(AttachmentStaging::new),
            lifecycle: ResponseLifecycle::new(),
            preview: capabilities.preview.then(ArtifactPreviewBinding::new),
            notice: None,
            ids: TurnIdGenerator::new(),
            revision: 0,
        }
    }

    /// A fresh session with the same model and wiring.
    pub fn successor(&self) -> Self {
        Self::new(self.model_name.clone(), self.capabilities)
    }

    pub(crate) fn next_turn_id(&mut self, now: DateTime<Utc>) -> TurnId {
        self.ids.next_at(now)
    }

    // ── Read-only projections ───────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn turns(&self) -> &[Turn] {
        self.ledger.turns()
    }

    pub fn ledger(&self) -> &TurnLedger {
        &self.ledger
    }

    pub fn lifecycle(&self) -> &ResponseLifecycle {
        &self.lifecycle
    }

    pub fn is_pending(&self) -> bool {
        self.lifecycle.is_pending()
    }

    pub fn staged(&self) -> &[StagedAttachment] {
        self.staging.as_ref().map(|s| s.items()).unwrap_or(&[])
    }

    pub fn preview_selection(&self) -> Option<TurnId> {
        self.preview.as_ref().and_then(|p| p.selection())
    }

    /// Artifact currently open in the preview surface.
    pub fn preview_content(&self) -> Option<&Artifact> {
        self.preview.as_ref().and_then(|p| p.current(&self.ledger))
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
