//! One run of the pipeline: load → fetch → diff → notify → commit.
//!
//! ```text
//! Idle ─► Loading ─► Fetching ─► Diffing ─► Notifying ─► Committing ─► Idle
//!            │           │                      │             │
//!            ▼           ▼                      ▼             ▼
//!     AbortedStorage AbortedFetch         AbortedNotify  AbortedStorage
//! ```
//!
//! The stored snapshot is written only after the notifier accepted the delta
//! (or there was nothing to notify). A failed notification therefore leaves
//! stored state untouched and the next run detects the same jobs again.
//! Nothing is retried inside a run; the scheduler invoking the binary owns
//! retries.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::error::{FetchError, NotifyError, StorageError};
use crate::fetcher::Fetcher;
use crate::notifier::Notifier;
use crate::reconciler;
use crate::record::Delta;
use crate::store::SnapshotStore;

/// Stage a run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Loading,
    Fetching,
    Diffing,
    Notifying,
    Committing,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::Loading => "loading",
            RunStage::Fetching => "fetching",
            RunStage::Diffing => "diffing",
            RunStage::Notifying => "notifying",
            RunStage::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Stored state now includes every fetched job
    Completed { new_jobs: usize },

    /// The listing could not be fetched; nothing was notified or stored
    AbortedFetch(FetchError),

    /// Delivery failed; stored state was left as it was
    AbortedNotify(NotifyError),

    /// Stored state could not be read, or could not be written after notifying
    AbortedStorage {
        stage: RunStage,
        error: StorageError,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed { .. } => 0,
            RunOutcome::AbortedFetch(_) => 2,
            RunOutcome::AbortedNotify(_) => 3,
            RunOutcome::AbortedStorage { .. } => 4,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed { new_jobs: 0 } => write!(f, "Found no new jobs."),
            RunOutcome::Completed { new_jobs: 1 } => write!(f, "Found 1 new job!"),
            RunOutcome::Completed { new_jobs } => write!(f, "Found {} new jobs!", new_jobs),
            RunOutcome::AbortedFetch(e) => write!(f, "Run aborted while fetching: {}", e),
            RunOutcome::AbortedNotify(e) => {
                write!(f, "Run aborted while notifying (state not saved): {}", e)
            }
            RunOutcome::AbortedStorage { stage, error } => {
                write!(f, "Run aborted while {}: {}", stage, error)
            }
        }
    }
}

/// What a run did.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,

    /// New jobs detected this run (empty if the run aborted before diffing)
    pub delta: Delta,
}

impl RunReport {
    fn aborted(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            delta: Delta::default(),
        }
    }
}

/// Runs the pipeline against injected collaborators.
///
/// Must not run concurrently with another coordinator sharing the same store.
pub struct RunCoordinator<S, F, N> {
    store: S,
    fetcher: F,
    notifier: N,
}

impl<S, F, N> RunCoordinator<S, F, N>
where
    S: SnapshotStore,
    F: Fetcher,
    N: Notifier,
{
    pub fn new(store: S, fetcher: F, notifier: N) -> Self {
        Self {
            store,
            fetcher,
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Execute one full run and report how it ended.
    pub async fn run_once(&self) -> RunReport {
        info!(
            store = self.store.name(),
            fetcher = self.fetcher.name(),
            notifier = self.notifier.name(),
            "Starting run"
        );

        enter(RunStage::Loading);
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(error) => {
                error!(error = %error, "Failed to load stored snapshot");
                return RunReport::aborted(RunOutcome::AbortedStorage {
                    stage: RunStage::Loading,
                    error,
                });
            }
        };

        enter(RunStage::Fetching);
        let current = match self.fetcher.fetch().await {
            Ok(current) => current,
            Err(e) => {
                error!(error = %e, "Failed to fetch job listings");
                return RunReport::aborted(RunOutcome::AbortedFetch(e));
            }
        };

        enter(RunStage::Diffing);
        let delta = reconciler::diff(&current, &stored);
        info!(
            fetched = current.len(),
            known = stored.len(),
            new_jobs = delta.len(),
            "Computed new jobs"
        );

        if !delta.is_empty() {
            enter(RunStage::Notifying);
            if let Err(e) = self.notifier.notify(delta.records()).await {
                warn!(error = %e, new_jobs = delta.len(), "Notification failed, state not saved");
                return RunReport {
                    outcome: RunOutcome::AbortedNotify(e),
                    delta,
                };
            }
        }

        enter(RunStage::Committing);
        let merged = reconciler::merge(&stored, &delta);
        if let Err(error) = self.store.save(&merged).await {
            error!(
                error = %error,
                new_jobs = delta.len(),
                "Failed to save snapshot after notifying, the same jobs may be notified again"
            );
            return RunReport {
                outcome: RunOutcome::AbortedStorage {
                    stage: RunStage::Committing,
                    error,
                },
                delta,
            };
        }

        enter(RunStage::Idle);
        info!(new_jobs = delta.len(), total = merged.len(), "Run completed");

        RunReport {
            outcome: RunOutcome::Completed {
                new_jobs: delta.len(),
            },
            delta,
        }
    }
}

fn enter(stage: RunStage) {
    debug!(stage = %stage, "Run stage");
}
