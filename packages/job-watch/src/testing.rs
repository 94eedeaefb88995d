//! Testing utilities including mock implementations.
//!
//! In-memory doubles for every collaborator of a run, with call tracking and
//! switchable failures, so the coordinator can be exercised without network
//! or disk access.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult, NotifyError, NotifyResult, StorageError, StorageResult};
use crate::fetcher::Fetcher;
use crate::notifier::Notifier;
use crate::record::{Record, Snapshot};
use crate::store::SnapshotStore;

/// Build a record with predictable field values for an id.
pub fn sample_record(id: &str) -> Record {
    Record::new(
        id,
        format!("Job {}", id),
        "AU-VIC-Melbourne",
        "Engineering",
        "21 Dec 2017, 9:05 AM",
        format!("https://careers.example.com/jobs/{}/job", id),
    )
}

/// Build a snapshot of [`sample_record`]s.
pub fn sample_snapshot(ids: &[&str]) -> Snapshot {
    ids.iter().map(|id| sample_record(id)).collect()
}

/// In-memory snapshot store.
///
/// `None` state means nothing has been stored yet; the first `load` then
/// initializes it to an empty snapshot, like a real store would.
#[derive(Default)]
pub struct MemoryStore {
    state: Arc<RwLock<Option<Snapshot>>>,
    fail_load: Arc<RwLock<bool>>,
    fail_save: Arc<RwLock<bool>>,
    load_calls: Arc<RwLock<usize>>,
    saves: Arc<RwLock<Vec<Snapshot>>>,
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fail_load: Arc::clone(&self.fail_load),
            fail_save: Arc::clone(&self.fail_save),
            load_calls: Arc::clone(&self.load_calls),
            saves: Arc::clone(&self.saves),
        }
    }
}

impl MemoryStore {
    /// Create a store with no durable state yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        *store.state.write().unwrap() = Some(snapshot);
        store
    }

    /// Make subsequent loads fail.
    pub fn fail_loads(&self, fail: bool) {
        *self.fail_load.write().unwrap() = fail;
    }

    /// Make subsequent saves fail.
    pub fn fail_saves(&self, fail: bool) {
        *self.fail_save.write().unwrap() = fail;
    }

    /// Currently stored snapshot, if initialized.
    pub fn stored(&self) -> Option<Snapshot> {
        self.state.read().unwrap().clone()
    }

    /// Number of `load` calls.
    pub fn load_count(&self) -> usize {
        *self.load_calls.read().unwrap()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.read().unwrap().len()
    }

    /// Every snapshot successfully saved, in order.
    pub fn saves(&self) -> Vec<Snapshot> {
        self.saves.read().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> StorageResult<Snapshot> {
        *self.load_calls.write().unwrap() += 1;
        if *self.fail_load.read().unwrap() {
            return Err(StorageError::Backend("simulated load failure".to_string()));
        }

        let mut state = self.state.write().unwrap();
        Ok(state.get_or_insert_with(Snapshot::new).clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        if *self.fail_save.read().unwrap() {
            return Err(StorageError::Backend("simulated save failure".to_string()));
        }

        *self.state.write().unwrap() = Some(snapshot.clone());
        self.saves.write().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Scripted fetch result.
#[derive(Debug, Clone)]
pub enum FetchScript {
    Records(Snapshot),
    Fail(String),
}

/// Fetcher returning scripted snapshots.
///
/// Scripted results are consumed in order; once exhausted, the fallback
/// snapshot is returned on every call.
#[derive(Default)]
pub struct MockFetcher {
    script: Arc<RwLock<VecDeque<FetchScript>>>,
    fallback: Arc<RwLock<Snapshot>>,
    calls: Arc<RwLock<usize>>,
}

impl Clone for MockFetcher {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            fallback: Arc::clone(&self.fallback),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return `snapshot` unless something else is scripted.
    pub fn returning(snapshot: Snapshot) -> Self {
        let fetcher = Self::new();
        *fetcher.fallback.write().unwrap() = snapshot;
        fetcher
    }

    /// Queue a successful fetch.
    pub fn then_return(self, snapshot: Snapshot) -> Self {
        self.script
            .write()
            .unwrap()
            .push_back(FetchScript::Records(snapshot));
        self
    }

    /// Queue a failing fetch.
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.script
            .write()
            .unwrap()
            .push_back(FetchScript::Fail(reason.into()));
        self
    }

    /// Replace the fallback snapshot.
    pub fn set_listing(&self, snapshot: Snapshot) {
        *self.fallback.write().unwrap() = snapshot;
    }

    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self) -> FetchResult<Snapshot> {
        *self.calls.write().unwrap() += 1;

        let next = self.script.write().unwrap().pop_front();
        match next {
            Some(FetchScript::Records(snapshot)) => Ok(snapshot),
            Some(FetchScript::Fail(reason)) => Err(FetchError::Parse { reason }),
            None => Ok(self.fallback.read().unwrap().clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Notifier that records every delivery and can be told to fail.
#[derive(Default)]
pub struct MockNotifier {
    delivered: Arc<RwLock<Vec<Vec<Record>>>>,
    attempts: Arc<RwLock<Vec<Vec<Record>>>>,
    fail: Arc<RwLock<bool>>,
}

impl Clone for MockNotifier {
    fn clone(&self) -> Self {
        Self {
            delivered: Arc::clone(&self.delivered),
            attempts: Arc::clone(&self.attempts),
            fail: Arc::clone(&self.fail),
        }
    }
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent notifications fail (or succeed again).
    pub fn fail_deliveries(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }

    /// Batches that were delivered successfully.
    pub fn delivered(&self) -> Vec<Vec<Record>> {
        self.delivered.read().unwrap().clone()
    }

    /// Every batch passed to `notify`, including failed ones.
    pub fn attempts(&self) -> Vec<Vec<Record>> {
        self.attempts.read().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.read().unwrap().len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, records: &[Record]) -> NotifyResult<()> {
        self.attempts.write().unwrap().push(records.to_vec());

        if *self.fail.read().unwrap() {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "simulated delivery failure".to_string(),
            });
        }

        self.delivered.write().unwrap().push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_initializes_on_first_load() {
        let store = MemoryStore::new();
        assert!(store.stored().is_none());

        let loaded = store.load().await.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(store.stored(), Some(Snapshot::new()));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_fetcher_script_then_fallback() {
        let fetcher = MockFetcher::returning(sample_snapshot(&["1"]))
            .then_fail("down")
            .then_return(sample_snapshot(&["2"]));

        assert!(fetcher.fetch().await.is_err());
        assert_eq!(fetcher.fetch().await.unwrap(), sample_snapshot(&["2"]));
        assert_eq!(fetcher.fetch().await.unwrap(), sample_snapshot(&["1"]));
        assert_eq!(fetcher.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_notifier_tracks_failures() {
        let notifier = MockNotifier::new();
        notifier.fail_deliveries(true);
        assert!(notifier.notify(&[sample_record("1")]).await.is_err());

        notifier.fail_deliveries(false);
        notifier.notify(&[sample_record("2")]).await.unwrap();

        assert_eq!(notifier.attempt_count(), 2);
        assert_eq!(notifier.delivered(), vec![vec![sample_record("2")]]);
    }
}
