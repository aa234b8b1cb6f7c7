//! Implementation of SMTP commands

use crate::smtp::error::{SmtpError, SmtpLimits};
use crate::smtp::handler::MailHandler;
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::SmtpSession;

/// Handles SMTP commands and returns appropriate responses
#[derive(Debug)]
pub struct SmtpCommandHandler<'a> {
    hostname: &'a str,
    max_message_bytes: usize,
}

impl<'a> SmtpCommandHandler<'a> {
    /// Create a new command handler
    pub fn new(hostname: &'a str, max_message_bytes: usize) -> Self {
        Self {
            hostname,
            max_message_bytes,
        }
    }

    /// Process a command line and return a response
    pub fn process_command(
        &self,
        command_line: &str,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        // Check command line length
        if command_line.len() > SmtpLimits::COMMAND_LINE_MAX_LENGTH {
            return Err(SmtpError::LineTooLong {
                max: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
            });
        }

        let mut parts = command_line.splitn(2, char::is_whitespace);
        let cmd = match parts.next() {
            Some(verb) if !verb.is_empty() => verb.to_uppercase(),
            _ => return Err(SmtpError::InvalidCommand),
        };
        let args = parts.next().unwrap_or("").trim();

        match cmd.as_str() {
            "HELO" => self.handle_helo(args, session, handler),
            "EHLO" => self.handle_ehlo(args, session, handler),
            "MAIL" => self.handle_mail(args, session, handler),
            "RCPT" => self.handle_rcpt(args, session, handler),
            "DATA" => self.handle_data(args, session),
            "RSET" => self.handle_rset(session, handler),
            "NOOP" => Ok(SmtpResponse::ok()),
            "QUIT" => Ok(SmtpResponse::quit()),
            _ => Err(SmtpError::InvalidCommand),
        }
    }

    /// Handle HELO command
    fn handle_helo(
        &self,
        args: &str,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        let client_domain = greeting_domain(args, "HELO")?;
        session.set_client_domain(client_domain.clone())?;
        handler.on_reset();

        Ok(SmtpResponse::helo(self.hostname, &client_domain))
    }

    /// Handle EHLO command
    fn handle_ehlo(
        &self,
        args: &str,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        let client_domain = greeting_domain(args, "EHLO")?;
        session.set_client_domain(client_domain.clone())?;
        handler.on_reset();

        Ok(SmtpResponse::ehlo(
            self.hostname,
            &client_domain,
            self.max_message_bytes,
        ))
    }

    /// Handle MAIL command
    fn handle_mail(
        &self,
        args: &str,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("MAIL") {
            return Err(SmtpError::InvalidState(
                "MAIL command requires HELO first".to_string(),
            ));
        }

        let (addr, params) = parse_path_argument(args, "FROM:", "MAIL FROM:<address>")?;

        // The null reverse-path is valid for MAIL
        if !addr.is_empty() {
            self.validate_email_address(&addr)?;
        }

        for param in params.split_whitespace() {
            if let Some(value) = param
                .get(..5)
                .filter(|key| key.eq_ignore_ascii_case("SIZE="))
                .and_then(|_| param.get(5..))
            {
                let size: usize = value.parse().map_err(|_| {
                    SmtpError::InvalidSyntax(format!("Invalid SIZE parameter: {value}"))
                })?;
                session.check_declared_size(size)?;
            }
        }

        handler.on_sender(&addr)?;
        session.set_sender(addr)?;

        Ok(SmtpResponse::ok())
    }

    /// Handle RCPT command
    fn handle_rcpt(
        &self,
        args: &str,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("RCPT") {
            return Err(SmtpError::InvalidState(
                "RCPT command requires MAIL first".to_string(),
            ));
        }

        let (addr, _params) = parse_path_argument(args, "TO:", "RCPT TO:<address>")?;
        if addr.is_empty() {
            return Err(SmtpError::InvalidSyntax(
                "TO address cannot be empty".to_string(),
            ));
        }

        // Validate email address components
        self.validate_email_address(&addr)?;
        session.ensure_recipient_capacity()?;

        handler.on_recipient(&addr)?;
        session.add_recipient(addr)?;

        Ok(SmtpResponse::ok())
    }

    /// Handle DATA command
    fn handle_data(&self, args: &str, session: &mut SmtpSession) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("DATA") {
            return Err(SmtpError::InvalidState(
                "DATA command requires RCPT first".to_string(),
            ));
        }

        if !args.is_empty() {
            return Err(SmtpError::InvalidSyntax(
                "DATA command takes no arguments".to_string(),
            ));
        }

        session.start_data_mode()?;

        Ok(SmtpResponse::data_start())
    }

    /// Handle RSET command
    fn handle_rset(
        &self,
        session: &mut SmtpSession,
        handler: &mut dyn MailHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        if !session.can_execute_command("RSET") {
            return Err(SmtpError::InvalidState(
                "RSET command requires HELO first".to_string(),
            ));
        }

        session.reset();
        handler.on_reset();
        Ok(SmtpResponse::ok())
    }

    /// Validate email address format and size limits
    fn validate_email_address(&self, addr: &str) -> Result<(), SmtpError> {
        if addr.len() > SmtpLimits::PATH_MAX_LENGTH {
            return Err(SmtpError::PathTooLong {
                max: SmtpLimits::PATH_MAX_LENGTH,
            });
        }

        let Some((user_part, domain_part)) = addr.rsplit_once('@') else {
            return Err(SmtpError::InvalidSyntax(
                "Email address must contain @ symbol".to_string(),
            ));
        };

        if user_part.len() > SmtpLimits::USER_MAX_LENGTH {
            return Err(SmtpError::UserTooLong {
                max: SmtpLimits::USER_MAX_LENGTH,
            });
        }

        if domain_part.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
            return Err(SmtpError::DomainTooLong {
                max: SmtpLimits::DOMAIN_MAX_LENGTH,
            });
        }

        if user_part.is_empty() || domain_part.is_empty() {
            return Err(SmtpError::InvalidSyntax(
                "Invalid email address format".to_string(),
            ));
        }

        Ok(())
    }
}

/// Extract the client domain from a HELO/EHLO argument
fn greeting_domain(args: &str, verb: &str) -> Result<String, SmtpError> {
    args.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SmtpError::InvalidSyntax(format!("{verb} requires domain argument")))
}

/// Split `FROM:<path> PARAMS` (or `TO:`) into the bare path and its trailing parameters
fn parse_path_argument<'l>(
    args: &'l str,
    keyword: &str,
    usage: &str,
) -> Result<(String, &'l str), SmtpError> {
    let rest = args
        .get(..keyword.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(keyword))
        .and_then(|_| args.get(keyword.len()..))
        .ok_or_else(|| SmtpError::InvalidSyntax(format!("command must be '{usage}'")))?
        .trim_start();

    let path_end = rest
        .strip_prefix('<')
        .and_then(|inner| inner.find('>'))
        .ok_or_else(|| {
            SmtpError::InvalidSyntax("address must be enclosed in angle brackets".to_string())
        })?;

    let path = rest[1..=path_end].to_string();
    let params = rest[path_end + 2..].trim();
    Ok((path, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHandler {
        senders: Vec<String>,
        recipients: Vec<String>,
        resets: usize,
    }

    impl MailHandler for RecordingHandler {
        fn on_sender(&mut self, from: &str) -> Result<(), SmtpError> {
            self.senders.push(from.to_string());
            Ok(())
        }

        fn on_recipient(&mut self, to: &str) -> Result<(), SmtpError> {
            self.recipients.push(to.to_string());
            Ok(())
        }

        fn on_data(&mut self, _data: &[u8]) -> Result<(), SmtpError> {
            Ok(())
        }

        fn on_reset(&mut self) {
            self.resets += 1;
        }
    }

    fn create_handler<'a>() -> SmtpCommandHandler<'a> {
        SmtpCommandHandler::new("test.local", 1024)
    }

    fn run(
        command: &str,
        session: &mut SmtpSession,
        handler: &mut RecordingHandler,
    ) -> Result<SmtpResponse, SmtpError> {
        create_handler().process_command(command, session, handler)
    }

    fn greeted() -> (SmtpSession, RecordingHandler) {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();
        run("HELO client.local", &mut session, &mut handler).unwrap();
        (session, handler)
    }

    #[test]
    fn test_helo_command() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let response = run("HELO client.local", &mut session, &mut handler).unwrap();

        assert_eq!(response.code, 250);
        assert_eq!(response.message, "test.local Hello client.local");
        assert_eq!(session.client_domain, Some("client.local".to_string()));
        assert_eq!(handler.resets, 1);
    }

    #[test]
    fn test_ehlo_advertises_size() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let response = run("EHLO client.local", &mut session, &mut handler).unwrap();
        assert!(response.format().contains("250 SIZE 1024\r\n"));
    }

    #[test]
    fn test_helo_missing_domain() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let result = run("HELO", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidSyntax(_))));
    }

    #[test]
    fn test_mail_command() {
        let (mut session, mut handler) = greeted();

        let response = run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();

        assert_eq!(response.code, 250);
        assert_eq!(session.from, Some("sender@example.com".to_string()));
        assert_eq!(handler.senders, vec!["sender@example.com"]);
    }

    #[test]
    fn test_mail_with_parameters() {
        let (mut session, mut handler) = greeted();

        let response = run(
            "MAIL FROM: <sender@example.com> BODY=8BITMIME SMTPUTF8 SIZE=512",
            &mut session,
            &mut handler,
        )
        .unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(session.from, Some("sender@example.com".to_string()));
    }

    #[test]
    fn test_mail_declared_size_too_large() {
        let (mut session, mut handler) = greeted();

        let result = run(
            "MAIL FROM:<sender@example.com> SIZE=4096",
            &mut session,
            &mut handler,
        );
        assert!(matches!(result, Err(SmtpError::TooMuchData { max: 1024 })));
        assert!(handler.senders.is_empty());
    }

    #[test]
    fn test_null_reverse_path_accepted() {
        let (mut session, mut handler) = greeted();

        let response = run("MAIL FROM:<>", &mut session, &mut handler).unwrap();
        assert_eq!(response.code, 250);
        assert_eq!(session.from, Some(String::new()));
    }

    #[test]
    fn test_mail_without_helo() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let result = run("MAIL FROM:<sender@example.com>", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidState(_))));
    }

    #[test]
    fn test_mail_invalid_syntax() {
        let (mut session, mut handler) = greeted();

        let result = run("MAIL sender@example.com", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidSyntax(_))));

        let result = run("MAIL FROM:sender@example.com", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidSyntax(_))));
    }

    #[test]
    fn test_rcpt_command() {
        let (mut session, mut handler) = greeted();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();

        let response = run("RCPT TO:<recipient@example.com>", &mut session, &mut handler).unwrap();

        assert_eq!(response.code, 250);
        assert_eq!(session.to, vec!["recipient@example.com".to_string()]);
        assert_eq!(handler.recipients, vec!["recipient@example.com"]);
    }

    #[test]
    fn test_rcpt_limit_checked_before_handler() {
        let mut session = SmtpSession::new(1, 1024);
        let mut handler = RecordingHandler::default();
        run("HELO client.local", &mut session, &mut handler).unwrap();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();
        run("RCPT TO:<one@example.com>", &mut session, &mut handler).unwrap();

        let result = run("RCPT TO:<two@example.com>", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::TooManyRecipients { max: 1 })));
        assert_eq!(handler.recipients, vec!["one@example.com"]);
    }

    #[test]
    fn test_rcpt_without_mail() {
        let (mut session, mut handler) = greeted();

        let result = run("RCPT TO:<recipient@example.com>", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidState(_))));
    }

    #[test]
    fn test_data_command() {
        let (mut session, mut handler) = greeted();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();
        run("RCPT TO:<recipient@example.com>", &mut session, &mut handler).unwrap();

        let response = run("DATA", &mut session, &mut handler).unwrap();

        assert_eq!(response.code, 354);
        assert!(session.in_data_mode);
    }

    #[test]
    fn test_data_without_rcpt() {
        let (mut session, mut handler) = greeted();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();

        let result = run("DATA", &mut session, &mut handler);
        assert!(result.is_err());
    }

    #[test]
    fn test_rset_command() {
        let (mut session, mut handler) = greeted();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();
        run("RCPT TO:<recipient@example.com>", &mut session, &mut handler).unwrap();

        let response = run("RSET", &mut session, &mut handler).unwrap();

        assert_eq!(response.code, 250);
        assert!(session.from.is_none());
        assert!(session.to.is_empty());
        assert_eq!(handler.resets, 2);
    }

    #[test]
    fn test_noop_and_quit() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        assert_eq!(run("NOOP", &mut session, &mut handler).unwrap().code, 250);
        assert_eq!(run("quit", &mut session, &mut handler).unwrap().code, 221);
    }

    #[test]
    fn test_invalid_command() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let result = run("INVALID", &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::InvalidCommand)));
    }

    #[test]
    fn test_command_line_too_long() {
        let mut session = SmtpSession::new(50, 1024);
        let mut handler = RecordingHandler::default();

        let long_command = "HELO ".to_string() + &"a".repeat(SmtpLimits::COMMAND_LINE_MAX_LENGTH);
        let result = run(&long_command, &mut session, &mut handler);
        assert!(matches!(result, Err(SmtpError::LineTooLong { .. })));
    }

    #[test]
    fn test_validate_email_address() {
        let handler = create_handler();

        // Valid addresses
        assert!(handler.validate_email_address("user@example.com").is_ok());
        assert!(handler.validate_email_address("test@test.local").is_ok());

        // Invalid addresses
        assert!(handler.validate_email_address("invalid").is_err());
        assert!(handler.validate_email_address("@example.com").is_err());
        assert!(handler.validate_email_address("user@").is_err());

        // Too long user part
        let long_user = "a".repeat(SmtpLimits::USER_MAX_LENGTH + 1) + "@example.com";
        assert!(matches!(
            handler.validate_email_address(&long_user),
            Err(SmtpError::UserTooLong { .. })
        ));

        // Too long path
        let long_path = "user@".to_string() + &"a".repeat(SmtpLimits::PATH_MAX_LENGTH);
        assert!(matches!(
            handler.validate_email_address(&long_path),
            Err(SmtpError::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let (mut session, mut handler) = greeted();
        run("MAIL FROM:<sender@example.com>", &mut session, &mut handler).unwrap();

        let result = run("RCPT TO:<>", &mut session, &mut handler);
        assert!(result.is_err());
    }
}
