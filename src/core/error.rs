use std::fmt;

use crate::core::turn::TurnId;

/// Optional capabilities a session may be built without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Attachments,
    Preview,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Attachments => write!(f, "attachment"),
            Capability::Preview => write!(f, "preview"),
        }
    }
}

/// Everything a session transition can refuse.
///
/// `DuplicateTurn`, `UnknownTurn`, `NotAssistantTurn` and `AlreadyBoundArtifact`
/// are programming errors: correct orchestration never produces them.
/// The rest are ordinary, user-facing outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Blank text and nothing staged. Never shown to the user.
    EmptySubmission,
    /// A generation is already running for this session.
    TurnInFlight,
    /// The turn already has an artifact; artifacts are write-once.
    AlreadyBoundArtifact(TurnId),
    /// The turn is missing or has no artifact to preview.
    NoArtifact(TurnId),
    /// The generation capability reported a failure.
    GenerationFailure(String),
    DuplicateTurn(TurnId),
    UnknownTurn(TurnId),
    NotAssistantTurn(TurnId),
    /// The session was built without this capability.
    CapabilityDisabled(Capability),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::AlreadyBoundArtifact(_)
                | SessionError::DuplicateTurn(_)
                | SessionError::UnknownTurn(_)
                | SessionError::NotAssistantTurn(_)
        )
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptySubmission => write!(f, "nothing to send"),
            SessionError::TurnInFlight => {
                write!(f, "still waiting for the previous response")
            }
            SessionError::AlreadyBoundArtifact(id) => {
                write!(f, "turn {id} already has an artifact")
            }
            SessionError::NoArtifact(id) => write!(f, "turn {id} has nothing to preview"),
            SessionError::GenerationFailure(reason) => write!(f, "generation failed: {reason}"),
            SessionError::DuplicateTurn(id) => write!(f, "turn {id} is already in the ledger"),
            SessionError::UnknownTurn(id) => write!(f, "turn {id} does not exist"),
            SessionError::NotAssistantTurn(id) => {
                write!(f, "turn {id} is not an assistant turn")
            }
            SessionError::CapabilityDisabled(cap) => {
                write!(f, "{cap} support is disabled for this session")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_violations_are_fatal() {
        assert!(SessionError::AlreadyBoundArtifact(TurnId::new(1)).is_fatal());
        assert!(SessionError::DuplicateTurn(TurnId::new(1)).is_fatal());
        assert!(!SessionError::TurnInFlight.is_fatal());
        assert!(!SessionError::NoArtifact(TurnId::new(1)).is_fatal());
        assert!(!SessionError::GenerationFailure("x".into()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            SessionError::GenerationFailure("timeout".into()).to_string(),
            "generation failed: timeout"
        );
        assert_eq!(
            SessionError::CapabilityDisabled(Capability::Preview).to_string(),
            "preview support is disabled for this session"
        );
    }
}
