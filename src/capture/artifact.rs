//! Uniquely named output files.
//!
//! Every artifact is created exclusively with a random name component, so
//! concurrent transactions never collide even when attachment names repeat.
//! Artifacts are never deleted by the process.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::capture::error::CaptureError;

const NAME_PREFIX: &str = "mailpeek";
const RANDOM_LEN: usize = 12;
const MAX_STEM_LEN: usize = 64;
const MAX_EXTENSION_LEN: usize = 16;

/// Rendered HTML documents produced per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// The decoded message body.
    Body,
    /// The page linking all attachments.
    Index,
}

impl DocumentKind {
    fn prefix(self) -> String {
        match self {
            DocumentKind::Body => format!("{NAME_PREFIX}-mail-"),
            DocumentKind::Index => format!("{NAME_PREFIX}-index-"),
        }
    }
}

/// Directory that artifacts are created in.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

/// A freshly created, open artifact.
#[derive(Debug)]
pub struct Artifact {
    file: File,
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create `mailpeek-mail-<random>.html` or `mailpeek-index-<random>.html`.
    pub fn create_document(&self, kind: DocumentKind) -> Result<Artifact, CaptureError> {
        self.create(&kind.prefix(), ".html")
    }

    /// Create `mailpeek-attachment-<stem>-<random>[.<ext>]` for a declared
    /// attachment filename. Only the last path component of the name is used.
    pub fn create_attachment(&self, filename: &str) -> Result<Artifact, CaptureError> {
        let (stem, extension) = split_filename(filename);
        let prefix = format!(
            "{NAME_PREFIX}-attachment-{}-",
            sanitize_filename_part(stem, MAX_STEM_LEN)
        );
        let suffix = extension
            .map(|ext| format!(".{}", sanitize_filename_part(ext, MAX_EXTENSION_LEN)))
            .unwrap_or_default();
        self.create(&prefix, &suffix)
    }

    fn create(&self, prefix: &str, suffix: &str) -> Result<Artifact, CaptureError> {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(RANDOM_LEN)
            .tempfile_in(&self.dir)
            .map_err(|e| CaptureError::storage(self.dir.join(format!("{prefix}*{suffix}")), e))?;

        let path = temp.path().to_path_buf();
        let (file, path) = temp
            .keep()
            .map_err(|e| CaptureError::storage(&path, e.error))?;

        tracing::debug!(path = %path.display(), "Created artifact");
        Ok(Artifact { file, path })
    }
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Write `bytes` and flush.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        self.file
            .write_all(bytes)
            .and_then(|()| self.file.flush())
            .map_err(|e| CaptureError::storage(&self.path, e))
    }

    /// Copy `reader` to the end into the artifact. Returns the bytes copied.
    pub fn copy_from(&mut self, reader: &mut dyn Read) -> Result<u64, CaptureError> {
        let copied = io::copy(reader, &mut self.file)
            .and_then(|n| self.file.flush().map(|()| n))
            .map_err(|e| CaptureError::storage(&self.path, e))?;
        Ok(copied)
    }
}

/// Split a declared filename into stem and extension, ignoring any
/// directory components.
fn split_filename(filename: &str) -> (&str, Option<&str>) {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        sanitized
    }
}
