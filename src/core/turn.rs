//! # Turns
//!
//! A `Turn` is one message in the conversation. Once built it is immutable,
//! with a single exception: an assistant turn may receive its `Artifact`
//! exactly once, and only through `TurnLedger::attach_artifact`.

use std::fmt;

use chrono::{DateTime, Utc};

/// Content used for a user turn that was submitted with attachments but no text.
pub const ATTACHMENT_ONLY_PROMPT: &str = "I've uploaded documents for test case generation.";

/// Unique, strictly increasing turn identifier (wall-clock milliseconds, bumped on ties).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

impl TurnId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out `TurnId`s derived from creation time.
///
/// Two turns created in the same millisecond (a fast scripted reply, or a
/// clock that stepped backwards) still get distinct, ordered ids.
#[derive(Debug, Default)]
pub struct TurnIdGenerator {
    last: u64,
}

impl TurnIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_at(&mut self, now: DateTime<Utc>) -> TurnId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last = millis.max(self.last + 1);
        TurnId(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lightweight reference to an attachment. Never carries the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub name: String,
    pub media_type: String,
}

/// A derived document produced alongside an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub title: String,
    pub body: String,
}

impl Artifact {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    id: TurnId,
    role: Role,
    content: String,
    attachment: Option<AttachmentRef>,
    created_at: DateTime<Utc>,
    artifact: Option<Artifact>,
}

impl Turn {
    /// Builds a user turn. Blank text with an attachment becomes `ATTACHMENT_ONLY_PROMPT`.
    pub fn user(
        id: TurnId,
        text: &str,
        attachment: Option<AttachmentRef>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = if text.trim().is_empty() && attachment.is_some() {
            ATTACHMENT_ONLY_PROMPT.to_string()
        } else {
            text.to_string()
        };
        Self {
            id,
            role: Role::User,
            content,
            attachment,
            created_at,
            artifact: None,
        }
    }

    pub fn assistant(
        id: TurnId,
        content: impl Into<String>,
        artifact: Option<Artifact>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
            attachment: None,
            created_at,
            artifact,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachment(&self) -> Option<&AttachmentRef> {
        self.attachment.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact.is_some()
    }

    /// Only the ledger binds artifacts, and only once.
    pub(super) fn bind_artifact(&mut self, artifact: Artifact) {
        self.artifact = Some(artifact);
    }
}
