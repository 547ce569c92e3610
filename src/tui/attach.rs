//! Turns `/attach` paths into staged attachments.
//!
//! The extension decides the media type; the file itself is only checked
//! for existence. Reading it is left to the generation backend.

use std::path::{Path, PathBuf};

use crate::core::staging::{PayloadHandle, StagedAttachment};

const ACCEPTED: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
];

/// Media type for an accepted extension, case-insensitive.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED
        .iter()
        .find(|(accepted, _)| *accepted == ext)
        .map(|(_, media_type)| *media_type)
}

/// Expand a leading `~/` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Resolve each path into a staged attachment. Returns the accepted items and
/// a human-readable reason for each rejected path, in input order.
pub fn collect(paths: &[String]) -> (Vec<StagedAttachment>, Vec<String>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for raw in paths {
        let path = expand_home(raw);
        let Some(media_type) = media_type_for(&path) else {
            rejected.push(format!("{}: unsupported type (pdf, doc, docx, txt, md)", raw));
            continue;
        };
        if !path.is_file() {
            rejected.push(format!("{}: not a file", raw));
            continue;
        }
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw.clone());
        log::debug!("Staging {} as {}", path.display(), media_type);
        accepted.push(StagedAttachment::new(
            display_name,
            media_type,
            PayloadHandle::File(path),
        ));
    }

    (accepted, rejected)
}
