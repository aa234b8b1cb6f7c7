//! Callbacks through which the server hands transactions to the application

use std::net::SocketAddr;

use crate::smtp::error::SmtpError;

/// Per-connection transaction callbacks.
///
/// The server invokes these in protocol order: `on_sender` once per
/// transaction, `on_recipient` once per accepted recipient, `on_data` with the
/// complete message, then `on_reset`. `on_logout` runs once when the
/// connection ends, however it ends.
///
/// Every method except `on_data` has a default implementation that accepts.
pub trait MailHandler {
    /// Called after a valid `MAIL FROM`. An empty address is the null reverse-path.
    fn on_sender(&mut self, _from: &str) -> Result<(), SmtpError> {
        Ok(())
    }

    /// Called after a valid `RCPT TO`, once the recipient limit has been checked
    fn on_recipient(&mut self, _to: &str) -> Result<(), SmtpError> {
        Ok(())
    }

    /// Called with the full message once the data terminator has been read.
    ///
    /// The bytes are dot-unstuffed and every line ends in CRLF.
    fn on_data(&mut self, data: &[u8]) -> Result<(), SmtpError>;

    /// Called when the current transaction is discarded (`RSET`, `HELO`, or after `DATA`)
    fn on_reset(&mut self) {}

    /// Called when the connection closes
    fn on_logout(&mut self) {}
}

/// Creates one [`MailHandler`] per accepted connection.
pub trait Backend: Send + Sync + 'static {
    type Handler: MailHandler;

    fn new_session(&self, peer: SocketAddr) -> Self::Handler;
}
