//! # Core
//!
//! casegen's conversation logic. Knows nothing about terminals or HTTP.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!                    │            CORE              │
//!                    │                              │
//!                    │  • Session (state)           │
//!                    │  • Action → update() → Effect│
//!                    │  • SessionController         │
//!                    └──────────────┬───────────────┘
//!                                   │
//!               ┌───────────────────┴──────────────────┐
//!               ▼                                      ▼
//!        ┌────────────┐                        ┌──────────────┐
//!        │    TUI     │                        │  inference   │
//!        │  (ratatui) │                        │  (backends)  │
//!        └────────────┘                        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`turn`]: `Turn`, `TurnId`, `Artifact`
//! - [`staging`], [`ledger`], [`lifecycle`], [`preview`]: the session's components
//! - [`state`]: the `Session` aggregate
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`controller`]: runs effects, owns the generation task
//! - [`export`]: clipboard and file export of a previewed artifact
//! - [`config`]: `~/.casegen/config.toml` loading and resolution

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod ledger;
pub mod lifecycle;
pub mod preview;
pub mod staging;
pub mod state;
pub mod turn;

pub use controller::SessionController;
pub use error::SessionError;
pub use state::{Capabilities, Session};
