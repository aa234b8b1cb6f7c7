//! Opening generated documents for the user.

use std::io;

/// Shows a document location (a `file://` URL) to the user.
pub trait Viewer: Send + Sync {
    fn open(&self, location: &str) -> io::Result<()>;
}

/// Opens locations with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemViewer;

impl Viewer for SystemViewer {
    fn open(&self, location: &str) -> io::Result<()> {
        opener::open(location).map_err(io::Error::other)
    }
}

/// Only logs locations; used when opening is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogViewer;

impl Viewer for LogViewer {
    fn open(&self, location: &str) -> io::Result<()> {
        tracing::info!(%location, "Document ready");
        Ok(())
    }
}
