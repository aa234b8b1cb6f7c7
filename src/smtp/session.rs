//! SMTP session state management

use crate::smtp::error::{SmtpError, SmtpLimits};

/// Represents the current state of an SMTP session
#[derive(Debug, Clone, PartialEq)]
pub enum SmtpState {
    /// Initial state - waiting for HELO
    Initial,
    /// HELO received - ready for MAIL command
    GreetingReceived,
    /// MAIL FROM received - ready for RCPT commands
    MailReceived,
    /// At least one RCPT TO received - ready for DATA or more RCPT commands
    RecipientsReceived,
    /// DATA command received - collecting email data
    DataMode,
}

/// Manages the protocol state and envelope for a single SMTP connection
#[derive(Debug)]
pub struct SmtpSession {
    /// Current state of the session
    pub state: SmtpState,
    /// Sender address from MAIL FROM command
    pub from: Option<String>,
    /// List of recipients from RCPT TO commands
    pub to: Vec<String>,
    /// Raw message bytes collected during DATA mode, CRLF terminated
    pub data: Vec<u8>,
    /// Whether we're currently in data collection mode
    pub in_data_mode: bool,
    /// Set once the collected data exceeded `max_data_size`; the rest is discarded
    pub data_overflow: bool,
    /// Client domain from HELO command
    pub client_domain: Option<String>,
    max_recipients: usize,
    max_data_size: usize,
}

impl SmtpSession {
    /// Create a new SMTP session with the given recipient and message size limits
    pub fn new(max_recipients: usize, max_data_size: usize) -> Self {
        Self {
            state: SmtpState::Initial,
            from: None,
            to: Vec::new(),
            data: Vec::new(),
            in_data_mode: false,
            data_overflow: false,
            client_domain: None,
            max_recipients,
            max_data_size,
        }
    }

    /// Reset the session to post-HELO state (clears transaction data)
    pub fn reset(&mut self) {
        self.state = if self.client_domain.is_some() {
            SmtpState::GreetingReceived
        } else {
            SmtpState::Initial
        };
        self.from = None;
        self.to.clear();
        self.data = Vec::new();
        self.in_data_mode = false;
        self.data_overflow = false;
    }

    /// Set the sender address
    pub fn set_sender(&mut self, sender: String) -> Result<(), SmtpError> {
        if sender.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }

        self.from = Some(sender);
        self.to.clear();
        self.data.clear();
        self.state = SmtpState::MailReceived;
        Ok(())
    }

    /// Check that one more recipient fits within the configured limit
    pub fn ensure_recipient_capacity(&self) -> Result<(), SmtpError> {
        if self.to.len() >= self.max_recipients {
            return Err(SmtpError::TooManyRecipients {
                max: self.max_recipients,
            });
        }
        Ok(())
    }

    /// Add a recipient address
    pub fn add_recipient(&mut self, recipient: String) -> Result<(), SmtpError> {
        if recipient.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }
        self.ensure_recipient_capacity()?;

        self.to.push(recipient);
        self.state = SmtpState::RecipientsReceived;
        Ok(())
    }

    /// Check a size declared with the `SIZE=` MAIL parameter
    pub fn check_declared_size(&self, size: usize) -> Result<(), SmtpError> {
        if size > self.max_data_size {
            return Err(SmtpError::TooMuchData {
                max: self.max_data_size,
            });
        }
        Ok(())
    }

    /// Start data collection mode
    pub fn start_data_mode(&mut self) -> Result<(), SmtpError> {
        if self.state != SmtpState::RecipientsReceived {
            return Err(SmtpError::InvalidState(
                "DATA command requires RCPT first".to_string(),
            ));
        }

        self.in_data_mode = true;
        self.data.clear();
        self.data_overflow = false;
        self.state = SmtpState::DataMode;
        Ok(())
    }

    /// Add one dot-unstuffed data line, without its line ending.
    ///
    /// Lines past the size limit are dropped; the overflow is reported by
    /// [`finish_data_collection`](Self::finish_data_collection) so the
    /// terminator can still be found.
    pub fn add_data_line(&mut self, line: &[u8]) {
        if self.data_overflow {
            return;
        }

        let line_size = line.len() + 2;
        if self.data.len() + line_size > self.max_data_size {
            self.data_overflow = true;
            self.data = Vec::new();
            return;
        }

        self.data.extend_from_slice(line);
        self.data.extend_from_slice(b"\r\n");
    }

    /// Finish data collection and hand out the raw message
    pub fn finish_data_collection(&mut self) -> Result<Vec<u8>, SmtpError> {
        if !self.in_data_mode {
            return Err(SmtpError::InvalidState(
                "Not in data collection mode".to_string(),
            ));
        }

        self.in_data_mode = false;
        self.state = SmtpState::GreetingReceived;

        if self.data_overflow {
            self.data_overflow = false;
            return Err(SmtpError::TooMuchData {
                max: self.max_data_size,
            });
        }

        if self.from.is_none() || self.to.is_empty() {
            return Err(SmtpError::InvalidState(
                "No envelope for collected data".to_string(),
            ));
        }

        Ok(std::mem::take(&mut self.data))
    }

    /// Set the client domain from HELO command
    pub fn set_client_domain(&mut self, domain: String) -> Result<(), SmtpError> {
        if domain.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
            return Err(SmtpError::DomainTooLong {
                max: SmtpLimits::DOMAIN_MAX_LENGTH,
            });
        }

        self.client_domain = Some(domain);
        self.reset(); // Clear any existing transaction
        Ok(())
    }

    /// Check if the session is ready for a specific command
    pub fn can_execute_command(&self, command: &str) -> bool {
        match command.to_uppercase().as_str() {
            "EHLO" | "HELO" => true, // can be sent at any time
            "MAIL" => self.state == SmtpState::GreetingReceived,
            "RCPT" => {
                self.state == SmtpState::MailReceived || self.state == SmtpState::RecipientsReceived
            }
            "DATA" => self.state == SmtpState::RecipientsReceived,
            "RSET" => self.state != SmtpState::Initial,
            "NOOP" | "QUIT" => true,
            _ => false,
        }
    }

    /// Get the current data size
    pub fn current_data_size(&self) -> usize {
        self.data.len()
    }
}
