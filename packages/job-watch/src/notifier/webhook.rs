//! Mail-relay webhook notifier.
//!
//! Posts the rendered message as JSON to an HTTP mail relay, which turns it
//! into an email. One attempt per call; retrying is left to the next run.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::{render_message, Notifier};
use crate::error::{NotifyError, NotifyResult};
use crate::record::Record;
use crate::secret::SecretString;

/// Settings for [`WebhookNotifier`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Relay endpoint receiving the message
    pub endpoint: String,

    /// Bearer token sent with each request
    pub token: Option<SecretString>,

    /// Address used both as sender and recipient
    pub email_address: String,

    /// Name of the watched employer, used in the subject
    pub source_name: String,

    pub timeout: Duration,
}

/// JSON body accepted by the relay.
#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Http(Box::new(e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, records: &[Record]) -> NotifyResult<()> {
        let message = render_message(records, &self.config.source_name);
        let body = RelayRequest {
            from: &self.config.email_address,
            to: vec![self.config.email_address.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token.expose());
        }

        info!(
            to = %self.config.email_address,
            jobs = records.len(),
            "Sending new jobs message"
        );

        let resp = request
            .send()
            .await
            .map_err(|e| NotifyError::Http(Box::new(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Mail relay rejected message");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_request_shape() {
        let body = RelayRequest {
            from: "me@example.com",
            to: vec!["me@example.com"],
            subject: "1 new job from Red Hat",
            html: "<html></html>",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], "me@example.com");
        assert_eq!(json["to"][0], "me@example.com");
        assert_eq!(json["subject"], "1 new job from Red Hat");
    }

    #[test]
    fn test_token_not_in_debug() {
        let config = WebhookConfig {
            endpoint: "https://relay.example.com/send".to_string(),
            token: Some(SecretString::new("relay-token")),
            email_address: "me@example.com".to_string(),
            source_name: "Red Hat".to_string(),
            timeout: Duration::from_secs(2),
        };

        let debug = format!("{:?}", config);
        assert!(!debug.contains("relay-token"));
        assert!(debug.contains("relay.example.com"));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_notify_error() {
        let notifier = WebhookNotifier::new(WebhookConfig {
            endpoint: "http://127.0.0.1:9/send".to_string(),
            token: None,
            email_address: "me@example.com".to_string(),
            source_name: "Red Hat".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let record = Record::new("1", "t", "l", "c", "d", "https://example.com/1");
        let err = notifier.notify(&[record]).await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }
}
