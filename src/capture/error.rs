//! Error types for the capture pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::smtp::SmtpError;

/// Failure of one captured transaction. Every variant is fatal to that
/// transaction only.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("cannot parse message: {0}")]
    Parse(String),

    #[error("cannot decode message body: {0}")]
    Decode(#[source] io::Error),

    #[error("cannot write artifact {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open {location} in viewer: {source}")]
    ViewerLaunch {
        location: String,
        #[source]
        source: io::Error,
    },
}

impl CaptureError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CaptureError::Storage {
            path: path.into(),
            source,
        }
    }
}

impl From<CaptureError> for SmtpError {
    fn from(err: CaptureError) -> Self {
        SmtpError::TransactionFailed(err.to_string())
    }
}
