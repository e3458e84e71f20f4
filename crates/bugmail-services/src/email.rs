//! SMTP delivery of composed reports.

use async_trait::async_trait;
use bugmail_core::{SmtpConfig, SmtpSecurity};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt::Display;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("No recipients given")]
    NoRecipients,

    #[error("Failed to build message: {0}")]
    Message(String),

    /// Connection, TLS, authentication or relay rejection. Carries the
    /// transport's diagnostic text.
    #[error("{0}")]
    Transport(String),

    #[error("SMTP configuration error: {0}")]
    Config(String),
}

/// Sends a composed HTML document to a set of addresses.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> Result<(), DispatchError>;
}

pub type SmtpDispatcher = EmailDispatcher<AsyncSmtpTransport<Tokio1Executor>>;

/// Delivers reports over any lettre transport. Production uses SMTP; tests
/// substitute the stub transport.
#[derive(Clone)]
pub struct EmailDispatcher<T> {
    transport: T,
    from: Mailbox,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DispatchError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| DispatchError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

impl EmailDispatcher<AsyncSmtpTransport<Tokio1Executor>> {
    /// Build an SMTP dispatcher. Does not connect; the connection is opened
    /// per message.
    pub fn from_config(smtp: &SmtpConfig) -> Result<Self, DispatchError> {
        let sender = smtp.sender().ok_or_else(|| {
            DispatchError::Config("SMTP_FROM or SMTP_USER must be set".to_string())
        })?;
        let from = parse_mailbox(sender)?;

        let builder = match smtp.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| DispatchError::Config(e.to_string()))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                    .map_err(|e| DispatchError::Config(e.to_string()))?
            }
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
            }
        };

        let builder = builder.port(smtp.port).timeout(Some(smtp.timeout()));
        let builder = if let (Some(u), Some(p)) = (&smtp.user, &smtp.password) {
            builder.credentials(Credentials::new(u.clone(), p.clone()))
        } else {
            builder
        };

        tracing::info!(
            host = %smtp.host,
            port = smtp.port,
            security = %smtp.security,
            "Email dispatcher initialized"
        );

        Ok(Self::with_transport(builder.build(), from))
    }
}

impl<T> EmailDispatcher<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: Display,
{
    pub fn with_transport(transport: T, from: Mailbox) -> Self {
        Self { transport, from }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One message, one HTML part, every recipient on the same envelope.
    pub fn build_message(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> Result<Message, DispatchError> {
        if recipients.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for address in recipients {
            builder = builder.to(parse_mailbox(address)?);
        }

        builder
            .multipart(MultiPart::mixed().singlepart(SinglePart::html(html_body.to_string())))
            .map_err(|e| DispatchError::Message(e.to_string()))
    }

    /// Send in a single SMTP transaction. No retry.
    pub async fn deliver(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> Result<(), DispatchError> {
        let message = self.build_message(subject, html_body, recipients)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        info!(count = recipients.len(), subject = %subject, "Report email sent");
        Ok(())
    }
}

#[async_trait]
impl<T> ReportMailer for EmailDispatcher<T>
where
    T: AsyncTransport + Send + Sync,
    T::Error: Display,
{
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> Result<(), DispatchError> {
        self.deliver(subject, html_body, recipients).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::transport::stub::AsyncStubTransport;

    fn dispatcher(transport: AsyncStubTransport) -> EmailDispatcher<AsyncStubTransport> {
        let from = "Reporter <bugs@example.com>".parse().unwrap();
        EmailDispatcher::with_transport(transport, from)
    }

    fn smtp(security: SmtpSecurity) -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            security,
            user: None,
            password: None,
            from: Some("bugs@example.com".to_string()),
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn sends_one_html_message_to_all_recipients() {
        let mailer = dispatcher(AsyncStubTransport::new_ok());
        let recipients = vec!["qa@example.com".to_string(), "dev@example.com".to_string()];

        mailer
            .send("[BUG REPORT] X", "<html><body>hi</body></html>", &recipients)
            .await
            .unwrap();

        let messages = mailer.transport().messages().await;
        assert_eq!(messages.len(), 1);
        let (envelope, raw) = &messages[0];
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(|a| a.to_string()).as_deref(),
            Some("bugs@example.com")
        );
        assert!(raw.contains("Subject: [BUG REPORT] X"));
        assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
        assert!(raw.contains("<html><body>hi</body></html>"));
    }

    #[tokio::test]
    async fn transport_failure_surfaces_once() {
        let mailer = dispatcher(AsyncStubTransport::new_error());
        let err = mailer
            .send("s", "<p>x</p>", &["qa@example.com".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }

    #[tokio::test]
    async fn bad_recipient_is_rejected_before_sending() {
        let mailer = dispatcher(AsyncStubTransport::new_ok());
        let err = mailer
            .send("s", "<p>x</p>", &["not an address".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidAddress { .. }));
        assert!(mailer.transport().messages().await.is_empty());
    }

    #[test]
    fn empty_recipient_list_is_an_error() {
        let mailer = dispatcher(AsyncStubTransport::new_ok());
        assert!(matches!(
            mailer.build_message("s", "<p>x</p>", &[]),
            Err(DispatchError::NoRecipients)
        ));
    }

    #[test]
    fn from_config_requires_a_sender() {
        let mut config = smtp(SmtpSecurity::None);
        config.from = None;
        assert!(matches!(
            SmtpDispatcher::from_config(&config),
            Err(DispatchError::Config(_))
        ));
    }

    #[test]
    fn from_config_builds_plaintext_and_starttls_transports() {
        assert!(SmtpDispatcher::from_config(&smtp(SmtpSecurity::None)).is_ok());
        assert!(SmtpDispatcher::from_config(&smtp(SmtpSecurity::StartTls)).is_ok());
    }
}
