//! SMTP response handling

use std::fmt::Write;

use crate::smtp::error::SmtpError;

/// An SMTP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    /// Reply code (e.g. 250, 354, 554)
    pub code: u16,
    /// Text of the first line
    pub message: String,
    /// Further lines of a multiline reply (EHLO capabilities)
    pub lines: Vec<String>,
}

impl SmtpResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            lines: Vec::new(),
        }
    }

    /// 250 OK
    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    /// 220 service ready
    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, format!("{hostname} ESMTP mailpeek ready"))
    }

    pub fn helo(hostname: &str, client_domain: &str) -> Self {
        Self::new(250, format!("{hostname} Hello {client_domain}"))
    }

    /// EHLO reply listing the supported extensions
    pub fn ehlo(hostname: &str, client_domain: &str, max_message_bytes: usize) -> Self {
        Self {
            lines: vec![
                "PIPELINING".to_owned(),
                "8BITMIME".to_owned(),
                "SMTPUTF8".to_owned(),
                format!("SIZE {max_message_bytes}"),
            ],
            ..Self::helo(hostname, client_domain)
        }
    }

    /// 354, sent after DATA
    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    pub fn quit() -> Self {
        Self::new(221, "Bye")
    }

    /// Error reply. The text is folded onto one line, since error sources
    /// such as a failed viewer command may carry their own line breaks.
    pub fn error(err: &SmtpError) -> Self {
        Self::new(err.to_response_code(), single_line(&err.to_response_message()))
    }

    /// Format for the wire; every line but the last uses `-` after the code
    pub fn format(&self) -> String {
        let mut out = String::new();
        let last = self.lines.len();
        for (i, text) in std::iter::once(&self.message).chain(&self.lines).enumerate() {
            let sep = if i == last { ' ' } else { '-' };
            let _ = write!(out, "{}{sep}{text}\r\n", self.code);
        }
        out
    }

    /// Whether the connection ends after this reply
    pub fn closes_connection(&self) -> bool {
        matches!(self.code, 221 | 421)
    }
}

/// Replace each run of control characters with a single space
fn single_line(text: &str) -> String {
    text.split(|c: char| c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
