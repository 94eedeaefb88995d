//! SMTP email notifier.
//!
//! Logs in to the configured mail server over STARTTLS and sends the rendered
//! message from the account's own address to itself. One attempt per call;
//! retrying is left to the next run.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor};
use tracing::{info, warn};

use super::{render_message, Notifier};
use crate::error::{NotifyError, NotifyResult};
use crate::record::Record;
use crate::secret::SecretString;

/// Submission port used when none is configured.
pub const DEFAULT_SMTP_PORT: u16 = 587;

// Reply codes a server uses when it does not accept the login.
const AUTH_FAILURE_CODES: &[&str] = &["454", "530", "534", "535", "538"];

/// Settings for [`SmtpNotifier`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,

    /// Login name, sender and recipient
    pub email_address: String,

    pub password: SecretString,

    /// Name of the watched employer, used in the subject
    pub source_name: String,

    pub timeout: Duration,
}

impl SmtpConfig {
    fn server(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    mailbox: Mailbox,
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> NotifyResult<Self> {
        let mailbox: Mailbox = config.email_address.parse().map_err(|e| {
            NotifyError::Render(format!(
                "invalid email address {:?}: {}",
                config.email_address, e
            ))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Connect {
                server: config.server(),
                source: Box::new(e),
            })?
            .port(config.port)
            .credentials(Credentials::new(
                config.email_address.clone(),
                config.password.expose().to_string(),
            ))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            transport,
            mailbox,
            config,
        })
    }

    /// Build the multipart email for `records`.
    pub fn build_email(&self, records: &[Record]) -> NotifyResult<Email> {
        let message = render_message(records, &self.config.source_name);

        Email::builder()
            .from(self.mailbox.clone())
            .to(self.mailbox.clone())
            .subject(message.subject)
            .multipart(MultiPart::alternative().singlepart(SinglePart::html(message.html)))
            .map_err(|e| NotifyError::Render(e.to_string()))
    }

    fn classify(&self, err: lettre::transport::smtp::Error) -> NotifyError {
        match err.status().map(|code| code.to_string()) {
            Some(code) if AUTH_FAILURE_CODES.contains(&code.as_str()) => NotifyError::Auth {
                code,
                source: Box::new(err),
            },
            Some(code) => NotifyError::Refused {
                code,
                source: Box::new(err),
            },
            None => NotifyError::Connect {
                server: self.config.server(),
                source: Box::new(err),
            },
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, records: &[Record]) -> NotifyResult<()> {
        let email = self.build_email(records)?;

        info!(
            server = %self.config.server(),
            to = %self.config.email_address,
            jobs = records.len(),
            "Sending new jobs email"
        );

        self.transport.send(email).await.map_err(|e| {
            let err = self.classify(e);
            warn!(error = %err, "Email delivery failed");
            err
        })?;

        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> SmtpConfig {
        SmtpConfig {
            host: host.to_string(),
            port,
            email_address: "me@example.com".to_string(),
            password: SecretString::new("hunter2"),
            source_name: "Red Hat".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    fn record(id: &str) -> Record {
        Record::new(
            id,
            format!("Job {}", id),
            "Brisbane",
            "Engineering",
            "21 Dec 2017, 9:05 AM",
            format!("https://example.com/jobs/{}", id),
        )
    }

    #[tokio::test]
    async fn test_email_is_html_to_self() {
        let notifier = SmtpNotifier::new(config("smtp.example.com", DEFAULT_SMTP_PORT)).unwrap();

        let email = notifier.build_email(&[record("1"), record("2")]).unwrap();

        let envelope = email.envelope();
        assert_eq!(envelope.from().unwrap().to_string(), "me@example.com");
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "me@example.com");

        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Subject: 2 new jobs from Red Hat"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_invalid_address_is_render_error() {
        let mut config = config("smtp.example.com", DEFAULT_SMTP_PORT);
        config.email_address = "not an address".to_string();

        let err = SmtpNotifier::new(config).err().unwrap();
        assert!(matches!(err, NotifyError::Render(_)));
    }

    #[test]
    fn test_password_not_in_debug() {
        let debug = format!("{:?}", config("smtp.example.com", DEFAULT_SMTP_PORT));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("smtp.example.com"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_notify_error() {
        let notifier = SmtpNotifier::new(config("localhost", 9)).unwrap();

        let err = notifier.notify(&[record("1")]).await.unwrap_err();
        assert!(matches!(err, NotifyError::Connect { ref server, .. } if server == "localhost:9"));
    }
}
