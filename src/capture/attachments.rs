//! Persisting attachments to artifacts.

use std::path::PathBuf;

use crate::capture::artifact::ArtifactStore;
use crate::capture::error::CaptureError;
use crate::capture::message::Attachment;

/// A persisted attachment, as linked from the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub display_name: String,
    pub artifact_path: PathBuf,
}

/// Copy every attachment to its own artifact, in order.
///
/// The first failure aborts the rest; artifacts already written stay on disk.
pub fn materialize(
    attachments: Vec<Attachment>,
    store: &ArtifactStore,
) -> Result<Vec<AttachmentRecord>, CaptureError> {
    attachments
        .into_iter()
        .map(|mut attachment| {
            let mut artifact = store.create_attachment(&attachment.filename)?;
            let size = artifact.copy_from(&mut attachment.content)?;
            tracing::debug!(
                name = %attachment.filename,
                path = %artifact.path().display(),
                size,
                "Saved attachment"
            );
            Ok(AttachmentRecord {
                display_name: attachment.filename,
                artifact_path: artifact.into_path(),
            })
        })
        .collect()
}
