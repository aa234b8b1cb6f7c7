//! One captured transaction, from raw bytes to opened documents.
//!
//! The steps run strictly in order: parse, decode the body, publish it, then
//! (only when the message has attachments) materialize them, render the
//! index and publish that. Any failure stops the transaction at that point;
//! artifacts already written are left in place.

use std::path::PathBuf;
use std::sync::Arc;

use crate::capture::artifact::{ArtifactStore, DocumentKind};
use crate::capture::attachments::{AttachmentRecord, materialize};
use crate::capture::decoder::decode_body;
use crate::capture::error::CaptureError;
use crate::capture::index::{IndexOptions, render_index};
use crate::capture::message::ParsedMessage;
use crate::capture::publisher::Publisher;
use crate::capture::viewer::Viewer;

/// What one successful transaction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub subject: String,
    pub body_path: PathBuf,
    pub attachments: Vec<AttachmentRecord>,
    /// Present only when the message had attachments.
    pub index_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct CapturePipeline {
    publisher: Publisher,
}

impl CapturePipeline {
    pub fn new(store: ArtifactStore, viewer: Arc<dyn Viewer>) -> Self {
        Self {
            publisher: Publisher::new(store, viewer),
        }
    }

    /// Parse a raw message and publish it.
    pub fn capture(&self, raw: &[u8]) -> Result<CaptureReport, CaptureError> {
        let msg = ParsedMessage::parse(raw)?;
        tracing::info!(
            subject = %msg.subject,
            date = %msg.date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            attachments = msg.attachments.len(),
            "Received mail"
        );
        self.process(msg)
    }

    /// Publish an already parsed message.
    pub fn process(&self, msg: ParsedMessage) -> Result<CaptureReport, CaptureError> {
        // Decoded in full first so a malformed body leaves no artifacts
        let body = decode_body(&msg)?;
        let body_path = self.publisher.publish(DocumentKind::Body, &body)?;

        let ParsedMessage {
            subject,
            attachments,
            ..
        } = msg;

        if attachments.is_empty() {
            return Ok(CaptureReport {
                subject,
                body_path,
                attachments: Vec::new(),
                index_path: None,
            });
        }

        let records = materialize(attachments, self.publisher.store())?;
        let page = render_index(IndexOptions {
            title: subject.clone(),
            attachments: records.clone(),
        });
        let index_path = self.publisher.publish(DocumentKind::Index, &page)?;

        Ok(CaptureReport {
            subject,
            body_path,
            attachments: records,
            index_path: Some(index_path),
        })
    }
}
