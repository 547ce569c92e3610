//! # Response Lifecycle
//!
//! Single-flight state machine for the assistant's reply:
//!
//! ```text
//!          begin(user turn)            resolve / fail / cancel
//!   Idle ────────────────────▶ Pending ───────────────────────▶ Idle
//! ```
//!
//! Every `begin` starts a new epoch. A completion is only accepted while
//! `Pending` and only for the epoch that is currently in flight; anything
//! else is stale and ignored.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::error::SessionError;
use crate::core::turn::TurnId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The assistant turn being waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTurn {
    pub epoch: Epoch,
    pub responding_to: TurnId,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Pending(PendingTurn),
}

#[derive(Debug)]
pub struct ResponseLifecycle {
    state: LifecycleState,
    epochs: u64,
}

impl Default for ResponseLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            epochs: 0,
        }
    }

    /// Starts waiting for a reply to `user_turn`. Refused while another reply is pending.
    pub fn begin(&mut self, user_turn: TurnId, now: DateTime<Utc>) -> Result<Epoch, SessionError> {
        if let LifecycleState::Pending(_) = self.state {
            return Err(SessionError::TurnInFlight);
        }
        self.epochs += 1;
        let epoch = Epoch(self.epochs);
        self.state = LifecycleState::Pending(PendingTurn {
            epoch,
            responding_to: user_turn,
            started_at: now,
        });
        Ok(epoch)
    }

    /// Ends the pending turn for `epoch`. Returns `None` for stale or unexpected completions.
    ///
    /// Used for both resolve and fail; the caller decides whether a turn is appended.
    pub fn settle(&mut self, epoch: Epoch) -> Option<PendingTurn> {
        match self.state {
            LifecycleState::Pending(pending) if pending.epoch == epoch => {
                self.state = LifecycleState::Idle;
                Some(pending)
            }
            _ => None,
        }
    }

    /// Abandons whatever is in flight (teardown, user cancel).
    pub fn cancel(&mut self) -> Option<PendingTurn> {
        match std::mem::replace(&mut self.state, LifecycleState::Idle) {
            LifecycleState::Pending(pending) => Some(pending),
            LifecycleState::Idle => None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingTurn> {
        match &self.state {
            LifecycleState::Pending(pending) => Some(pending),
            LifecycleState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Epoch of the most recent `begin` (zero before the first one).
    pub fn latest_epoch(&self) -> Epoch {
        Epoch(self.epochs)
    }
}
