use crate::core::staging::StagedAttachment;
use crate::core::turn::{Artifact, Turn};

/// Line that separates a reply's conversational text from its artifact.
/// Format: `=== ARTIFACT: <title> ===`
pub const ARTIFACT_MARKER_PREFIX: &str = "=== ARTIFACT:";
const ARTIFACT_MARKER_SUFFIX: &str = "===";

/// Everything a backend gets to produce one assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The turn being answered (already in the ledger).
    pub user_turn: Turn,
    /// Every attachment staged for this turn, payload handles included.
    pub attachments: Vec<StagedAttachment>,
    /// Ledger snapshot before `user_turn`.
    pub history: Vec<Turn>,
    pub model: String,
}

/// A backend's successful answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTurn {
    pub content: String,
    pub artifact: Option<Artifact>,
}

impl GeneratedTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            artifact: None,
        }
    }

    pub fn with_artifact(content: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            content: content.into(),
            artifact: Some(artifact),
        }
    }

    /// Splits a raw model reply at the first artifact marker line.
    ///
    /// Text before the marker is the turn content, text after it the artifact
    /// body. A marker without a title falls back to "Generated Test Cases".
    pub fn from_reply(reply: &str) -> Self {
        let mut offset = 0;
        for line in reply.split_inclusive('\n') {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix(ARTIFACT_MARKER_PREFIX) {
                let title = rest.trim().trim_end_matches(ARTIFACT_MARKER_SUFFIX).trim();
                let title = if title.is_empty() {
                    "Generated Test Cases"
                } else {
                    title
                };
                let content = reply[..offset].trim();
                let body = reply[offset + line.len()..].trim();
                return Self::with_artifact(content, Artifact::new(title, body));
            }
            offset += line.len();
        }
        Self::text(reply.trim())
    }
}
