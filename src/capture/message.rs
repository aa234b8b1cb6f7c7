//! Parsed view of a captured message.

use std::fmt;
use std::io::{Cursor, Read};

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders, PartType};

use crate::capture::error::CaptureError;

/// The parts of a message the pipeline renders.
#[derive(Debug, Default)]
pub struct ParsedMessage {
    pub subject: String,
    pub date: Option<DateTime<Utc>>,
    pub text_body: String,
    /// First HTML part, empty when the message has none.
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// One attachment; `content` can be read once.
pub struct Attachment {
    pub filename: String,
    pub content: Box<dyn Read + Send>,
}

impl Attachment {
    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: Box::new(Cursor::new(bytes.into())),
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

impl ParsedMessage {
    /// Parse a raw RFC 5322 message.
    ///
    /// Attachments without a declared filename are named `attachment_<n>`,
    /// `n` being their zero-based position.
    pub fn parse(raw: &[u8]) -> Result<Self, CaptureError> {
        let msg = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| CaptureError::Parse("not a MIME message".to_string()))?;

        if msg.headers().is_empty() {
            return Err(CaptureError::Parse("message has no headers".to_string()));
        }

        // `body_html` would render text parts as HTML; only real HTML parts count.
        let html_body = msg
            .html_body
            .iter()
            .filter_map(|id| msg.part(*id))
            .find_map(|part| match &part.body {
                PartType::Html(html) => Some(html.to_string()),
                _ => None,
            })
            .unwrap_or_default();

        let attachments = msg
            .attachments()
            .enumerate()
            .map(|(idx, part)| {
                let filename = part
                    .attachment_name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("attachment_{idx}"));
                Attachment::from_bytes(filename, part.contents())
            })
            .collect();

        Ok(Self {
            subject: msg.subject().unwrap_or_default().to_string(),
            date: msg
                .date()
                .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0)),
            text_body: msg
                .body_text(0)
                .map(|s| s.into_owned())
                .unwrap_or_default(),
            html_body,
            attachments,
        })
    }
}
