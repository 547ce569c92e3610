//! Preview export: copy the artifact body to the clipboard or save it as a
//! Markdown file. The body is passed through untouched.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::core::turn::Artifact;

const FALLBACK_STEM: &str = "test-cases";

#[derive(Debug)]
pub enum ExportError {
    Clipboard(String),
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Clipboard(msg) => write!(f, "clipboard unavailable: {msg}"),
            ExportError::Io(e) => write!(f, "could not save file: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// System clipboard handle, connected on first use and kept for the life of
/// the app. On X11 and Wayland the owning process serves the selection, so
/// dropping the handle right after `set_text` loses the copied text.
#[derive(Default)]
pub struct Clipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_some()
    }

    fn connect(&mut self) -> Result<&mut arboard::Clipboard, ExportError> {
        let handle = match self.inner.take() {
            Some(handle) => handle,
            None => {
                debug!("Connecting to system clipboard");
                arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?
            }
        };
        Ok(self.inner.insert(handle))
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), ExportError> {
        let result = self
            .connect()?
            .set_text(text.to_owned())
            .map_err(|e| ExportError::Clipboard(e.to_string()));
        if result.is_err() {
            // reconnect next time
            self.inner = None;
        }
        result
    }
}

/// Puts the artifact's raw body on the system clipboard.
pub fn copy_to_clipboard(clipboard: &mut Clipboard, artifact: &Artifact) -> Result<(), ExportError> {
    clipboard.set_text(&artifact.body)?;
    info!("Copied '{}' to clipboard ({} bytes)", artifact.title, artifact.body.len());
    Ok(())
}

/// Where downloads go when the config doesn't say.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Writes the artifact body to `<dir>/<slug>.md` without overwriting
/// anything. Returns the path written.
pub fn save_to_dir(artifact: &Artifact, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = free_path(dir, &slug(&artifact.title));
    atomic_write(&path, artifact.body.as_bytes())?;
    info!("Saved '{}' to {}", artifact.title, path.display());
    Ok(path)
}

/// Lowercase ASCII alphanumerics joined by single dashes.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        out
    }
}

fn free_path(dir: &Path, stem: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}.md"));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.md")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Write `.tmp` then rename into place.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("md.tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
