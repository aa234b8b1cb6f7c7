//! Writing rendered documents and handing them to the viewer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::capture::artifact::{ArtifactStore, DocumentKind};
use crate::capture::error::CaptureError;
use crate::capture::viewer::Viewer;

#[derive(Clone)]
pub struct Publisher {
    store: ArtifactStore,
    viewer: Arc<dyn Viewer>,
}

impl Publisher {
    pub fn new(store: ArtifactStore, viewer: Arc<dyn Viewer>) -> Self {
        Self { store, viewer }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Write `bytes` to a new artifact and open it.
    ///
    /// A viewer failure is returned as [`CaptureError::ViewerLaunch`]; the
    /// file stays on disk.
    pub fn publish(&self, kind: DocumentKind, bytes: &[u8]) -> Result<PathBuf, CaptureError> {
        let mut artifact = self.store.create_document(kind)?;
        artifact.write_all(bytes)?;
        let path = artifact.into_path();
        tracing::info!(?kind, path = %path.display(), "Temporary file has been created");

        let location = file_url(&path);
        self.viewer
            .open(&location)
            .map_err(|source| CaptureError::ViewerLaunch { location, source })?;
        Ok(path)
    }
}

/// Percent-encoded `file://` URL for the absolute form of `path`.
fn file_url(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match Url::from_file_path(&absolute) {
        Ok(url) => url.into(),
        Err(()) => format!("file://{}", absolute.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingViewer {
        opened: Mutex<Vec<String>>,
    }

    impl Viewer for RecordingViewer {
        fn open(&self, location: &str) -> io::Result<()> {
            self.opened.lock().unwrap().push(location.to_string());
            Ok(())
        }
    }

    struct BrokenViewer;

    impl Viewer for BrokenViewer {
        fn open(&self, _location: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no browser"))
        }
    }

    #[test]
    fn test_publish_writes_and_opens() {
        let dir = tempfile::tempdir().unwrap();
        let viewer = Arc::new(RecordingViewer::default());
        let publisher = Publisher::new(ArtifactStore::new(dir.path()), viewer.clone());

        let path = publisher.publish(DocumentKind::Body, b"<p>body</p>").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"<p>body</p>");
        let opened = viewer.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("file://"));
        assert!(opened[0].ends_with(&*path.file_name().unwrap().to_string_lossy()));
    }

    #[test]
    fn test_file_url_is_percent_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("mail #1 drafts");
        std::fs::create_dir(&nested).unwrap();
        let viewer = Arc::new(RecordingViewer::default());
        let publisher = Publisher::new(ArtifactStore::new(&nested), viewer.clone());

        let path = publisher.publish(DocumentKind::Body, b"<p>body</p>").unwrap();

        let opened = viewer.opened.lock().unwrap();
        assert!(opened[0].contains("/mail%20%231%20drafts/"));
        assert_eq!(Url::parse(&opened[0]).unwrap().to_file_path().unwrap(), path);
    }

    #[test]
    fn test_viewer_failure_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(ArtifactStore::new(dir.path()), Arc::new(BrokenViewer));

        let result = publisher.publish(DocumentKind::Index, b"<ul></ul>");

        match result {
            Err(CaptureError::ViewerLaunch { location, .. }) => {
                assert!(location.starts_with("file://"));
            }
            other => panic!("expected viewer error, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
