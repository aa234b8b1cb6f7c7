//! SMTP server implementation

use crate::config::ServerConfig;
use crate::smtp::commands::SmtpCommandHandler;
use crate::smtp::error::{SmtpError, SmtpLimits};
use crate::smtp::handler::{Backend, MailHandler};
use crate::smtp::response::SmtpResponse;
use crate::smtp::session::SmtpSession;

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// SMTP server that drives one [`MailHandler`] per connection
pub struct SmtpServer<B> {
    config: ServerConfig,
    backend: Arc<B>,
}

impl<B: Backend> SmtpServer<B> {
    /// Create a new SMTP server
    pub fn new(config: ServerConfig, backend: B) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
        }
    }

    /// Bind the configured address and serve connections (blocking)
    pub fn start(&self) -> Result<(), SmtpError> {
        let listener = TcpListener::bind(&self.config.addr)?;
        self.start_with_listener(listener)
    }

    /// Serve connections from an existing listener (blocking).
    ///
    /// Every accepted connection runs on its own thread.
    pub fn start_with_listener(&self, listener: TcpListener) -> Result<(), SmtpError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "SMTP server listening");

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let config = self.config.clone();
                    let backend = Arc::clone(&self.backend);
                    thread::spawn(move || {
                        if let Err(e) = handle_client(stream, &config, backend.as_ref()) {
                            tracing::warn!(error = %e, "Error handling client");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Error accepting connection");
                }
            }
        }

        Ok(())
    }
}

/// Handle a client connection from greeting to close
fn handle_client<B: Backend>(
    stream: TcpStream,
    config: &ServerConfig,
    backend: &B,
) -> Result<(), SmtpError> {
    let peer = stream.peer_addr()?;
    stream.set_read_timeout(config.read_timeout())?;
    stream.set_write_timeout(config.write_timeout())?;
    tracing::debug!(%peer, "Accepted connection");

    let mut handler = backend.new_session(peer);
    let result = serve_connection(stream, config, &mut handler);
    handler.on_logout();

    tracing::debug!(%peer, "Connection closed");
    result
}

fn serve_connection<H: MailHandler>(
    stream: TcpStream,
    config: &ServerConfig,
    handler: &mut H,
) -> Result<(), SmtpError> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let command_handler = SmtpCommandHandler::new(&config.hostname, config.max_message_bytes);
    let mut session = SmtpSession::new(config.max_recipients, config.max_message_bytes);

    // Send greeting
    send_response(&mut writer, &SmtpResponse::greeting(&config.hostname))?;

    let mut line_buffer = Vec::new();
    loop {
        line_buffer.clear();

        match reader.read_until(b'\n', &mut line_buffer) {
            Ok(0) => break, // Connection closed
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Error reading from client");
                break;
            }
        }

        // Handle data mode specially
        if session.in_data_mode {
            let line = strip_line_ending(&line_buffer);
            if line == b"." {
                let response = complete_transaction(&mut session, handler);
                handler.on_reset();
                send_response(&mut writer, &response)?;
            } else {
                let line = line.strip_prefix(b".").unwrap_or(line);
                session.add_data_line(line);
            }
            continue;
        }

        // Replace invalid UTF-8 sequences; such commands are rejected as unrecognized
        let line = String::from_utf8_lossy(&line_buffer);
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        let response = match command_handler.process_command(command, &mut session, handler) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(command = %command, error = %e, "Command rejected");
                SmtpResponse::error(&e)
            }
        };
        send_response(&mut writer, &response)?;
        if response.closes_connection() {
            break;
        }
    }

    Ok(())
}

/// Hand the collected message to the handler and build the final DATA reply
fn complete_transaction(session: &mut SmtpSession, handler: &mut dyn MailHandler) -> SmtpResponse {
    let result = session
        .finish_data_collection()
        .and_then(|data| handler.on_data(&data));
    session.reset();

    match result {
        Ok(()) => SmtpResponse::ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Message not accepted");
            SmtpResponse::error(&e)
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Send a response to the client
fn send_response<W: Write>(writer: &mut W, response: &SmtpResponse) -> Result<(), SmtpError> {
    let formatted = response.format();
    if response.lines.is_empty() && formatted.len() > SmtpLimits::REPLY_LINE_MAX_LENGTH {
        let truncated_response = SmtpResponse::new(response.code, "Response too long (truncated)");
        writer.write_all(truncated_response.format().as_bytes())?;
    } else {
        writer.write_all(formatted.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
