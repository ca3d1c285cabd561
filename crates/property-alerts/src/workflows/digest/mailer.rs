use std::fmt::{self, Debug};

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use tracing::{debug, info};

use super::DigestEmail;
use crate::config::SmtpConfig;

/// Port on which the relay expects TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP authentication failed, check SMTP_USERNAME and SMTP_PASSWORD: {0}")]
    Authentication(#[source] lettre::transport::smtp::Error),
    #[error("SMTP delivery failed: {0}")]
    Transport(#[source] lettre::transport::smtp::Error),
}

pub trait MailTransport: Debug {
    fn send(&self, email: &DigestEmail) -> Result<(), MailError>;
}

/// Sends through an authenticated, TLS-secured relay. Pooling is disabled, so
/// each send opens its own connection and closes it before returning.
pub struct SmtpMailer {
    host: String,
    port: u16,
    credentials: Credentials,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
        }
    }

    fn transport(&self) -> Result<SmtpTransport, MailError> {
        let builder = if self.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&self.host)
        } else {
            SmtpTransport::starttls_relay(&self.host)
        }
        .map_err(MailError::Transport)?;

        Ok(builder
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, email: &DigestEmail) -> Result<(), MailError> {
        let message = build_message(email)?;
        let transport = self.transport()?;
        debug!(host = %self.host, port = self.port, "connecting to mail relay");

        transport.send(&message).map_err(classify_smtp_error)?;
        info!(to = %email.to, subject = %email.subject, "digest email sent");
        Ok(())
    }
}

fn classify_smtp_error(err: lettre::transport::smtp::Error) -> MailError {
    let auth_rejected = err
        .status()
        .map(|code| matches!(code.to_string().as_str(), "530" | "534" | "535"))
        .unwrap_or(false);
    if auth_rejected {
        MailError::Authentication(err)
    } else {
        MailError::Transport(err)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| MailError::Address {
            address: address.to_string(),
            source,
        })
}

/// Builds the MIME message. `to` may hold several comma separated recipients.
pub fn build_message(email: &DigestEmail) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_HTML);

    for recipient in email.to.split(',').filter(|part| !part.trim().is_empty()) {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    Ok(builder.body(email.html_body.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> DigestEmail {
        DigestEmail {
            subject: "Property alert: 3 properties found in Leeds".to_string(),
            html_body: "<html><body><p>Leeds</p></body></html>".to_string(),
            from: "Property Bot <alerts@example.com>".to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn message_is_html_with_subject_and_recipients() {
        let message = build_message(&email("buyer@example.com, partner@example.com"))
            .expect("message builds");
        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");

        assert!(raw.contains("Subject: Property alert: 3 properties found in Leeds"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("buyer@example.com"));
        assert!(raw.contains("partner@example.com"));
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn malformed_recipient_is_an_address_error() {
        let err = build_message(&email("not-an-address")).expect_err("address rejected");
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let mailer = SmtpMailer::from_config(&SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
            email_from: "alerts@example.com".to_string(),
            email_to: "buyer@example.com".to_string(),
        });
        let rendered = format!("{mailer:?}");
        assert!(rendered.contains("smtp.example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
