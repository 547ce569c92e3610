//! # Artifact Preview Binding
//!
//! Tracks which assistant turn's artifact is open in the preview surface.
//! The selection only ever points at a turn that has an artifact.

use crate::core::error::SessionError;
use crate::core::ledger::TurnLedger;
use crate::core::turn::{Artifact, TurnId};

#[derive(Debug, Default)]
pub struct ArtifactPreviewBinding {
    selection: Option<TurnId>,
}

impl ArtifactPreviewBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id` and returns its artifact. On failure the selection is left as it was.
    pub fn open<'a>(&mut self, ledger: &'a TurnLedger, id: TurnId) -> Result<&'a Artifact, SessionError> {
        let artifact = ledger
            .find(id)
            .and_then(|turn| turn.artifact())
            .ok_or(SessionError::NoArtifact(id))?;
        self.selection = Some(id);
        Ok(artifact)
    }

    pub fn close(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<TurnId> {
        self.selection
    }

    pub fn current<'a>(&self, ledger: &'a TurnLedger) -> Option<&'a Artifact> {
        self.selection
            .and_then(|id| ledger.find(id))
            .and_then(|turn| turn.artifact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::turn::Turn;
    use chrono::Utc;

    fn ledger() -> TurnLedger {
        let mut ledger = TurnLedger::new();
        ledger
            .append(Turn::assistant(TurnId::new(1), "plain", None, Utc::now()))
            .unwrap();
        ledger
            .append(Turn::assistant(
                TurnId::new(2),
                "with artifact",
                Some(Artifact::new("Login Test Cases", "**Test Case 1**")),
                Utc::now(),
            ))
            .unwrap();
        ledger
            .append(Turn::assistant(
                TurnId::new(3),
                "another",
                Some(Artifact::new("Payment Cases", "...")),
                Utc::now(),
            ))
            .unwrap();
        ledger
    }

    #[test]
    fn test_open_returns_artifact() {
        let ledger = ledger();
        let mut preview = ArtifactPreviewBinding::new();
        let artifact = preview.open(&ledger, TurnId::new(2)).unwrap();
        assert_eq!(artifact.title, "Login Test Cases");
        assert_eq!(preview.selection(), Some(TurnId::new(2)));
    }

    #[test]
    fn test_open_without_artifact_keeps_selection() {
        let ledger = ledger();
        let mut preview = ArtifactPreviewBinding::new();
        preview.open(&ledger, TurnId::new(2)).unwrap();

        let err = preview.open(&ledger, TurnId::new(1)).unwrap_err();
        assert_eq!(err, SessionError::NoArtifact(TurnId::new(1)));
        assert_eq!(preview.selection(), Some(TurnId::new(2)));

        assert!(preview.open(&ledger, TurnId::new(404)).is_err());
        assert_eq!(preview.selection(), Some(TurnId::new(2)));
    }

    #[test]
    fn test_switch_replaces_selection() {
        let ledger = ledger();
        let mut preview = ArtifactPreviewBinding::new();
        preview.open(&ledger, TurnId::new(2)).unwrap();
        preview.open(&ledger, TurnId::new(3)).unwrap();
        assert_eq!(preview.current(&ledger).map(|a| a.title.as_str()), Some("Payment Cases"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let ledger = ledger();
        let mut preview = ArtifactPreviewBinding::new();
        preview.close();
        preview.open(&ledger, TurnId::new(2)).unwrap();
        preview.close();
        preview.close();
        assert!(preview.selection().is_none());
        assert!(preview.current(&ledger).is_none());
    }
}
