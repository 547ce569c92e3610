//! # Turn Ledger
//!
//! Append-only, ordered record of completed turns. Insertion order is display
//! order is chronological order. Entries are never reordered or rewritten;
//! the only late write is binding an assistant turn's artifact, once.

use std::collections::HashMap;

use crate::core::error::SessionError;
use crate::core::turn::{Artifact, Role, Turn, TurnId};

#[derive(Debug, Default)]
pub struct TurnLedger {
    turns: Vec<Turn>,
    positions: HashMap<TurnId, usize>,
}

impl TurnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) -> Result<(), SessionError> {
        let id = turn.id();
        if self.positions.contains_key(&id) {
            return Err(SessionError::DuplicateTurn(id));
        }
        self.positions.insert(id, self.turns.len());
        self.turns.push(turn);
        Ok(())
    }

    pub fn find(&self, id: TurnId) -> Option<&Turn> {
        self.positions.get(&id).map(|&pos| &self.turns[pos])
    }

    pub fn attach_artifact(&mut self, id: TurnId, artifact: Artifact) -> Result<(), SessionError> {
        let pos = *self
            .positions
            .get(&id)
            .ok_or(SessionError::UnknownTurn(id))?;
        let turn = &mut self.turns[pos];
        if turn.role() != Role::Assistant {
            return Err(SessionError::NotAssistantTurn(id));
        }
        if turn.has_artifact() {
            return Err(SessionError::AlreadyBoundArtifact(id));
        }
        turn.bind_artifact(artifact);
        Ok(())
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent turn that carries an artifact.
    pub fn last_artifact(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.has_artifact())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
