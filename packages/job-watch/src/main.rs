//! Entry point invoked once per scheduled tick.
//!
//! Performs exactly one run and exits with a status reflecting its outcome:
//! 0 when completed, non-zero when aborted or misconfigured.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use job_watch::{
    Config, ConsoleNotifier, HttpFetcher, JsonFileStore, Notifier, RunCoordinator, RunOutcome,
    SmtpNotifier, WebhookNotifier,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NotifierKind {
    /// Email through the configured SMTP server
    Smtp,
    /// Send through the configured mail relay
    Webhook,
    /// Print to stdout
    Console,
}

#[derive(Parser, Debug)]
#[command(name = "job-watch")]
#[command(about = "Check the job listing page and notify about new postings")]
struct Cli {
    /// Env file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Where the known jobs are stored (overrides JOB_WATCH_STATE_FILE)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Listing page to watch (overrides JOB_WATCH_URL)
    #[arg(long)]
    url: Option<String>,

    /// How to deliver new jobs [default: smtp when EMAIL_SERVER_HOST is set, else webhook]
    #[arg(long, value_enum)]
    notifier: Option<NotifierKind>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_watch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => {
            println!("{}", outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let mut config = match &cli.env_file {
        Some(path) => Config::from_env_file(path)?,
        None => Config::from_env().context("Failed to load configuration")?,
    };
    if let Some(state_file) = cli.state_file {
        config.state_file = state_file;
    }
    if let Some(url) = cli.url {
        config.listing_url = url;
    }
    tracing::debug!(url = %config.listing_url, state_file = %config.state_file.display(), "Configuration loaded");

    let kind = cli.notifier.unwrap_or(if config.email_server_host.is_some() {
        NotifierKind::Smtp
    } else {
        NotifierKind::Webhook
    });

    match kind {
        NotifierKind::Smtp => {
            let smtp = config.smtp().context(
                "EMAIL_SERVER_HOST, EMAIL_ADDRESS and EMAIL_PASSWORD must be set (or use --notifier console)",
            )?;
            let notifier = SmtpNotifier::new(smtp).context("Failed to create SMTP notifier")?;
            run_with(&config, notifier).await
        }
        NotifierKind::Webhook => {
            let webhook = config.webhook().context(
                "NOTIFY_WEBHOOK_URL and NOTIFY_EMAIL_ADDRESS must be set (or use --notifier smtp|console)",
            )?;
            let notifier =
                WebhookNotifier::new(webhook).context("Failed to create webhook notifier")?;
            run_with(&config, notifier).await
        }
        NotifierKind::Console => {
            let notifier = ConsoleNotifier::new(&config.source_name);
            run_with(&config, notifier).await
        }
    }
}

async fn run_with<N: Notifier>(config: &Config, notifier: N) -> Result<RunOutcome> {
    let fetcher = HttpFetcher::new(config.fetcher()).context("Failed to create HTTP fetcher")?;
    let store = JsonFileStore::new(&config.state_file);

    let coordinator = RunCoordinator::new(store, fetcher, notifier);
    Ok(coordinator.run_once().await.outcome)
}
