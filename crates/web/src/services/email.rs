//! Contact form relay over SMTP.
//!
//! Uses lettre for delivery with Askama text and HTML bodies.

use askama::Template;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// A validated contact form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: okinawa_rentals_core::Email,
    pub subject: String,
    pub message: String,
}

#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactEmailHtml<'a> {
    contact: &'a ContactMessage,
}

#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactEmailText<'a> {
    contact: &'a ContactMessage,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// SMTP relay for contact form messages.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    inbox: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            inbox: config.inbox.clone(),
        })
    }

    /// Relay a contact submission to the site inbox. Replies go to the submitter.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or the SMTP send fails.
    pub async fn send_contact(&self, contact: &ContactMessage) -> Result<(), EmailError> {
        let email = self.build_contact(contact)?;
        self.mailer.send(email).await?;
        tracing::info!(subject = %contact.subject, "Contact message relayed");
        Ok(())
    }

    fn build_contact(&self, contact: &ContactMessage) -> Result<Message, EmailError> {
        let html = ContactEmailHtml { contact }.render()?;
        let text = ContactEmailText { contact }.render()?;

        let reply_to = Mailbox::new(
            Some(contact.name.clone()),
            parse_address(contact.email.as_str())?,
        );

        Ok(Message::builder()
            .from(Mailbox::new(
                Some("Okinawa Rentals".to_string()),
                parse_address(&self.from_address)?,
            ))
            .to(Mailbox::new(None, parse_address(&self.inbox)?))
            .reply_to(reply_to)
            .subject(format!("Contact Form: {}", contact.subject))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?)
    }
}

fn parse_address(raw: &str) -> Result<Address, EmailError> {
    raw.parse()
        .map_err(|_| EmailError::InvalidAddress(raw.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn service() -> EmailService {
        EmailService::new(&EmailConfig {
            smtp_host: "smtp.okinawarentals.test".to_string(),
            smtp_port: 587,
            smtp_username: "relay".to_string(),
            smtp_password: SecretString::from("relay-password"),
            from_address: "noreply@okinawarentals.test".to_string(),
            inbox: "hello@okinawarentals.test".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_contact_message_headers() {
        let contact = ContactMessage {
            name: "Sam".to_string(),
            email: okinawa_rentals_core::Email::parse("sam@example.com").unwrap(),
            subject: "Lease question".to_string(),
            message: "Is the Chatan house still available?".to_string(),
        };
        let message = service().build_contact(&contact).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Contact Form: Lease question"));
        assert!(raw.contains("Reply-To:"));
        assert!(raw.contains("sam@example.com"));
        assert!(raw.contains("hello@okinawarentals.test"));
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(matches!(
            parse_address("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
