//! # mailpeek
//!
//! mailpeek is a local SMTP server for development.
//!
//! Point an application's outgoing mail at it and every message is rendered
//! to an HTML file and opened in the default browser, with its attachments
//! saved next to it. Nothing is ever relayed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mailpeek::capture::{ArtifactStore, CaptureBackend, CapturePipeline, SystemViewer};
//! use mailpeek::config::ServerConfig;
//! use mailpeek::SmtpServer;
//!
//! let pipeline = CapturePipeline::new(
//!     ArtifactStore::new(std::env::temp_dir()),
//!     Arc::new(SystemViewer),
//! );
//! let server = SmtpServer::new(ServerConfig::default(), CaptureBackend::new(pipeline));
//!
//! // Blocks; the application sends mail to localhost:2028
//! server.start().unwrap();
//! ```
//!
//! ## What gets written
//!
//! For each message, in the artifact directory (the system temp directory
//! by default):
//!
//! - `mailpeek-mail-<random>.html` - the message body. HTML bodies are
//!   quoted-printable decoded; plain text bodies are wrapped in `<pre>`.
//! - `mailpeek-attachment-<name>-<random>.<ext>` - one file per attachment.
//! - `mailpeek-index-<random>.html` - a page linking the attachments, only
//!   when there are any.
//!
//! The body page is opened first and the index page last. Files are never
//! deleted.
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the sender (`EHLO` advertises `PIPELINING`,
//!   `8BITMIME`, `SMTPUTF8` and `SIZE`)
//! - `MAIL FROM` - Specify the sender's address (`<>` is accepted)
//! - `RCPT TO` - Specify the destination (multiple destinations are supported)
//! - `DATA` - Send the email body
//! - `RSET` - Reset the current transaction
//! - `NOOP` - Do nothing
//! - `QUIT` - Close connection
//!
//! ## Notes
//!
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - Mail relay is not supported.
//! - A message that cannot be parsed, decoded or stored is answered with
//!   `554` and nothing further is written for it.
//!
//! ## Size Limits
//!
//! The server enforces RFC 5321 size limits:
//! - User names: 64 characters max
//! - Domain names: 255 characters max
//! - Paths: 256 characters max
//! - Command lines: 512 characters max
//!
//! Message size (256 MiB) and recipients per message (50) are configurable,
//! see [`config::ServerConfig`].

pub mod capture;
pub mod config;
mod smtp;

pub use smtp::{
    Backend, MailHandler, SmtpCommandHandler, SmtpError, SmtpLimits, SmtpResponse, SmtpServer,
    SmtpSession, SmtpState,
};
