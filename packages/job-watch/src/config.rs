use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fetcher::{FetcherConfig, DEFAULT_LISTING_URL, DEFAULT_USER_AGENT};
use crate::notifier::{SmtpConfig, WebhookConfig, DEFAULT_SMTP_PORT};
use crate::secret::SecretString;

pub const DEFAULT_STATE_FILE: &str = "jobs.json";
pub const DEFAULT_SOURCE_NAME: &str = "Red Hat";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub listing_url: String,
    pub state_file: PathBuf,
    pub source_name: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub email_address: Option<String>,
    pub email_server_host: Option<String>,
    pub email_server_port: u16,
    pub email_password: Option<SecretString>,
    pub webhook_url: Option<String>,
    pub webhook_token: Option<SecretString>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_vars()
    }

    /// Load an explicit env file, then read configuration from the environment
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
        Self::from_vars()
    }

    fn from_vars() -> Result<Self> {
        Ok(Self {
            listing_url: env::var("JOB_WATCH_URL")
                .unwrap_or_else(|_| DEFAULT_LISTING_URL.to_string()),
            state_file: env::var("JOB_WATCH_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE)),
            source_name: env::var("JOB_WATCH_SOURCE_NAME")
                .unwrap_or_else(|_| DEFAULT_SOURCE_NAME.to_string()),
            user_agent: env::var("JOB_WATCH_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(
                env::var("JOB_WATCH_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("JOB_WATCH_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            email_address: non_empty_var("EMAIL_ADDRESS")
                .or_else(|| non_empty_var("NOTIFY_EMAIL_ADDRESS")),
            email_server_host: non_empty_var("EMAIL_SERVER_HOST"),
            email_server_port: match non_empty_var("EMAIL_SERVER_PORT") {
                Some(port) => port
                    .trim()
                    .parse()
                    .context("EMAIL_SERVER_PORT must be a valid port number")?,
                None => DEFAULT_SMTP_PORT,
            },
            email_password: non_empty_var("EMAIL_PASSWORD").map(SecretString::from),
            webhook_url: non_empty_var("NOTIFY_WEBHOOK_URL"),
            webhook_token: non_empty_var("NOTIFY_WEBHOOK_TOKEN").map(SecretString::from),
        })
    }

    /// Fetcher settings derived from this configuration
    pub fn fetcher(&self) -> FetcherConfig {
        FetcherConfig::new(&self.listing_url)
            .with_user_agent(&self.user_agent)
            .with_timeout(self.http_timeout)
    }

    /// SMTP settings, if the server, the address and the password are configured
    pub fn smtp(&self) -> Option<SmtpConfig> {
        Some(SmtpConfig {
            host: self.email_server_host.clone()?,
            port: self.email_server_port,
            email_address: self.email_address.clone()?,
            password: self.email_password.clone()?,
            source_name: self.source_name.clone(),
            timeout: self.http_timeout,
        })
    }

    /// Webhook settings, if both the relay URL and the address are configured
    pub fn webhook(&self) -> Option<WebhookConfig> {
        Some(WebhookConfig {
            endpoint: self.webhook_url.clone()?,
            token: self.webhook_token.clone(),
            email_address: self.email_address.clone()?,
            source_name: self.source_name.clone(),
            timeout: self.http_timeout,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
