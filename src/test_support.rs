//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::staging::{PayloadHandle, StagedAttachment};
use crate::core::state::{Capabilities, Session};
use crate::inference::{GeneratedTurn, GenerationError, GenerationProvider, GenerationRequest};

/// Answers every request immediately with `"echo: <user text>"`.
pub struct EchoProvider;

#[async_trait]
impl GenerationProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        Ok(GeneratedTurn::text(format!(
            "echo: {}",
            request.user_turn.content()
        )))
    }
}

/// Always fails with a network error.
pub struct FailingProvider;

#[async_trait]
impl GenerationProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        Err(GenerationError::Network("connection refused".to_string()))
    }
}

/// Blocks every request until `release` is notified. Counts calls.
#[derive(Default)]
pub struct GatedProvider {
    pub release: Notify,
    pub calls: AtomicUsize,
}

impl GatedProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for GatedProvider {
    fn name(&self) -> &str {
        "gated"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedTurn, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(GeneratedTurn::text(format!(
            "released: {}",
            request.user_turn.content()
        )))
    }
}

/// Creates a test Session with every capability enabled.
pub fn test_session() -> Session {
    Session::new("test-model", Capabilities::default())
}

pub fn echo_provider() -> Arc<dyn GenerationProvider> {
    Arc::new(EchoProvider)
}

/// An in-memory staged file; the media type follows the extension loosely.
pub fn staged_file(name: &str) -> StagedAttachment {
    let media_type = if name.ends_with(".pdf") {
        "application/pdf"
    } else {
        "text/plain"
    };
    StagedAttachment::new(
        name,
        media_type,
        PayloadHandle::Memory(Arc::from(name.as_bytes())),
    )
}
