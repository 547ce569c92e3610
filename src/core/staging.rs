//! # Attachment Staging
//!
//! Files the user picked for the next turn. Nothing here touches the
//! payload; reading bytes is the generation backend's business.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::turn::AttachmentRef;

/// Where the attachment's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHandle {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAttachment {
    pub display_name: String,
    pub media_type: String,
    pub payload: PayloadHandle,
}

impl StagedAttachment {
    pub fn new(
        display_name: impl Into<String>,
        media_type: impl Into<String>,
        payload: PayloadHandle,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            media_type: media_type.into(),
            payload,
        }
    }

    /// The payload-free reference the ledger keeps.
    pub fn to_ref(&self) -> AttachmentRef {
        AttachmentRef {
            name: self.display_name.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

/// Ordered set of staged attachments. Same-named files stay distinct items.
#[derive(Debug, Default)]
pub struct AttachmentStaging {
    items: Vec<StagedAttachment>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, files: impl IntoIterator<Item = StagedAttachment>) {
        self.items.extend(files);
    }

    /// Removes the item at `index`. Out-of-range is a no-op (double-clicked remove).
    pub fn unstage(&mut self, index: usize) -> Option<StagedAttachment> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Takes the whole staged set, leaving staging empty.
    pub fn drain_all(&mut self) -> Vec<StagedAttachment> {
        std::mem::take(&mut self.items)
    }

    pub fn items(&self) -> &[StagedAttachment] {
        &self.items
    }

    pub fn first(&self) -> Option<&StagedAttachment> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
