//! Job listing watcher
//!
//! Fetches a job-listing page, works out which postings are new compared to
//! the previously stored set, notifies about them, and only then records
//! them as known.
//!
//! # Usage
//!
//! ```rust,ignore
//! use job_watch::{ConsoleNotifier, FetcherConfig, HttpFetcher, JsonFileStore, RunCoordinator};
//!
//! let coordinator = RunCoordinator::new(
//!     JsonFileStore::new("jobs.json"),
//!     HttpFetcher::new(FetcherConfig::default())?,
//!     ConsoleNotifier::new("Red Hat"),
//! );
//!
//! let report = coordinator.run_once().await;
//! println!("{}", report.outcome);
//! ```
//!
//! # Modules
//!
//! - [`record`] - Record, Snapshot and Delta types
//! - [`reconciler`] - Pure diff/merge of snapshots
//! - [`store`] - Durable snapshot storage
//! - [`fetcher`] - Listing page fetching and extraction
//! - [`notifier`] - Message rendering and delivery
//! - [`coordinator`] - One run of the pipeline
//! - [`secret`] - Redacted credentials
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod notifier;
pub mod reconciler;
pub mod record;
pub mod secret;
pub mod store;
pub mod testing;

pub use config::Config;
pub use coordinator::{RunCoordinator, RunOutcome, RunReport, RunStage};
pub use error::{FetchError, NotifyError, StorageError};
pub use fetcher::{extract_records, normalize_date, Fetcher, FetcherConfig, HttpFetcher};
pub use notifier::{
    render_message, ConsoleNotifier, Message, Notifier, SmtpConfig, SmtpNotifier, WebhookConfig,
    WebhookNotifier,
};
pub use reconciler::{diff, merge};
pub use secret::SecretString;
pub use record::{Delta, Record, Snapshot};
pub use store::{JsonFileStore, SnapshotStore};

// Re-export testing utilities
pub use testing::{MemoryStore, MockFetcher, MockNotifier};
