//! SMTP callbacks that feed the capture pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::capture::pipeline::CapturePipeline;
use crate::smtp::{Backend, MailHandler, SmtpError};

/// Creates one [`CaptureSession`] per connection, all sharing one pipeline.
#[derive(Clone)]
pub struct CaptureBackend {
    pipeline: Arc<CapturePipeline>,
}

impl CaptureBackend {
    pub fn new(pipeline: CapturePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl Backend for CaptureBackend {
    type Handler = CaptureSession;

    fn new_session(&self, peer: SocketAddr) -> CaptureSession {
        CaptureSession {
            peer,
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

/// Accepts every sender and recipient and captures each message.
///
/// Holds no transaction state; reset and logout have nothing to clear.
pub struct CaptureSession {
    peer: SocketAddr,
    pipeline: Arc<CapturePipeline>,
}

impl MailHandler for CaptureSession {
    fn on_sender(&mut self, from: &str) -> Result<(), SmtpError> {
        tracing::info!(peer = %self.peer, "mail from: {from}");
        Ok(())
    }

    fn on_recipient(&mut self, to: &str) -> Result<(), SmtpError> {
        tracing::info!(peer = %self.peer, "rcpt to: {to}");
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), SmtpError> {
        match self.pipeline.capture(data) {
            Ok(report) => {
                tracing::debug!(
                    peer = %self.peer,
                    body = %report.body_path.display(),
                    attachments = report.attachments.len(),
                    "Captured message"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(peer = %self.peer, error = %e, "Failed to capture message");
                Err(e.into())
            }
        }
    }
}
