//! SMTP server implementation

pub mod commands;
pub mod error;
pub mod handler;
pub mod response;
pub mod server;
pub mod session;

pub use commands::SmtpCommandHandler;
pub use error::{SmtpError, SmtpLimits};
pub use handler::{Backend, MailHandler};
pub use response::SmtpResponse;
pub use server::SmtpServer;
pub use session::{SmtpSession, SmtpState};
