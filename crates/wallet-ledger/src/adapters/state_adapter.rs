//! # In-Memory Ledger Store
//!
//! Versioned key-value store with per-invocation transactions.
//!
//! ## Semantics
//!
//! - Reads see committed state only; a transaction does not observe its own
//!   buffered writes.
//! - Writes and deletes are buffered and applied atomically on commit.
//! - Every key carries a version. A key never written has version 0; a
//!   delete leaves a tombstone and bumps the version.
//! - Commit validates the version of every key the transaction read. If any
//!   changed, nothing is applied and `StateError::Conflict` is returned.

use crate::domain::value_objects::Balance;
use crate::errors::StateError;
use crate::ports::outbound::StateAccess;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Committed value of one key.
#[derive(Clone, Debug, Default)]
struct VersionedValue {
    /// `None` is a tombstone.
    value: Option<Vec<u8>>,
    version: u64,
}

// =============================================================================
// STORE
// =============================================================================

/// Shared committed state.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    entries: RwLock<HashMap<String, VersionedValue>>,
    commits: AtomicU64,
    offline: AtomicBool,
    latency_ms: AtomicU64,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a transaction against the current committed state.
    #[must_use]
    pub fn begin(self: &Arc<Self>) -> LedgerTransaction {
        LedgerTransaction::new(Arc::clone(self))
    }

    /// Committed value of `key`, bypassing any transaction.
    #[must_use]
    pub fn get_committed(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .and_then(|entry| entry.value.clone())
    }

    /// Committed version of `key`; 0 if it was never written.
    #[must_use]
    pub fn version(&self, key: &str) -> u64 {
        self.entries
            .read()
            .get(key)
            .map_or(0, |entry| entry.version)
    }

    /// Write `value` directly, outside any transaction.
    ///
    /// Used to set up fixtures, including values that are not valid balances.
    pub fn seed(&self, key: &str, value: impl Into<Vec<u8>>) {
        let mut entries = self.entries.write();
        let entry = entries.entry(key.to_string()).or_default();
        entry.value = Some(value.into());
        entry.version += 1;
    }

    /// Sum of every live balance.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Corrupted` if any live value is not a balance.
    pub fn total_supply(&self) -> Result<u128, StateError> {
        let entries = self.entries.read();
        let mut total: u128 = 0;
        for (key, entry) in entries.iter() {
            if let Some(bytes) = &entry.value {
                let balance = Balance::decode(key, bytes)?;
                total = total
                    .checked_add(balance.value())
                    .ok_or_else(|| StateError::Other("total supply overflow".to_string()))?;
            }
        }
        Ok(total)
    }

    /// Number of live keys.
    #[must_use]
    pub fn live_keys(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.value.is_some())
            .count()
    }

    /// Number of transactions committed so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    /// Simulate losing the backing store. Every access fails with
    /// `StateError::Unavailable` while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every transactional read by `latency`. Zero disables the delay.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    async fn stall(&self) {
        let millis = self.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            debug!(latency_ms = millis, "Delaying state read");
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn ensure_online(&self) -> Result<(), StateError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StateError::Unavailable);
        }
        Ok(())
    }

    fn read_versioned(&self, key: &str) -> Result<(Option<Vec<u8>>, u64), StateError> {
        self.ensure_online()?;
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .map_or((None, 0), |entry| (entry.value.clone(), entry.version)))
    }

    fn apply(
        &self,
        tx_id: Uuid,
        reads: &HashMap<String, u64>,
        writes: Vec<(String, Option<Vec<u8>>)>,
    ) -> Result<usize, StateError> {
        self.ensure_online()?;
        let mut entries = self.entries.write();

        for (key, read_version) in reads {
            let current = entries.get(key).map_or(0, |entry| entry.version);
            if current != *read_version {
                warn!(
                    tx_id = %tx_id,
                    key = %key,
                    read_version,
                    current,
                    "Read version changed before commit"
                );
                return Err(StateError::Conflict { key: key.clone() });
            }
        }

        let count = writes.len();
        for (key, value) in writes {
            let entry = entries.entry(key).or_default();
            entry.value = value;
            entry.version += 1;
        }
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(count)
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// Result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Transaction id.
    pub tx_id: Uuid,
    /// Number of keys validated.
    pub reads: usize,
    /// Number of writes and deletes applied.
    pub writes: usize,
}

/// One invocation's view of the store.
///
/// The locks below guard plain maps and are never held across an await.
#[derive(Debug)]
pub struct LedgerTransaction {
    tx_id: Uuid,
    store: Arc<InMemoryLedgerStore>,
    read_set: Mutex<HashMap<String, u64>>,
    write_set: Mutex<Vec<(String, Option<Vec<u8>>)>>,
}

impl LedgerTransaction {
    fn new(store: Arc<InMemoryLedgerStore>) -> Self {
        Self {
            tx_id: Uuid::new_v4(),
            store,
            read_set: Mutex::new(HashMap::new()),
            write_set: Mutex::new(Vec::new()),
        }
    }

    /// Transaction id.
    #[must_use]
    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    /// Number of buffered writes and deletes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.write_set.lock().len()
    }

    /// Validate reads and apply buffered writes atomically.
    pub fn commit(self) -> Result<CommitReceipt, StateError> {
        let reads = self.read_set.into_inner();
        let writes = self.write_set.into_inner();
        let applied = self.store.apply(self.tx_id, &reads, writes)?;

        debug!(tx_id = %self.tx_id, reads = reads.len(), writes = applied, "Committed");
        Ok(CommitReceipt {
            tx_id: self.tx_id,
            reads: reads.len(),
            writes: applied,
        })
    }

    /// Drop every buffered write.
    pub fn discard(self) {
        debug!(
            tx_id = %self.tx_id,
            writes = self.write_set.lock().len(),
            "Discarded"
        );
    }

    fn buffer(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), StateError> {
        self.store.ensure_online()?;
        self.write_set.lock().push((key.to_string(), value));
        Ok(())
    }
}

#[async_trait]
impl StateAccess for LedgerTransaction {
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        self.store.stall().await;
        let (value, version) = self.store.read_versioned(key)?;
        self.read_set
            .lock()
            .entry(key.to_string())
            .or_insert(version);
        Ok(value)
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError> {
        self.buffer(key, Some(value))
    }

    async fn delete_state(&self, key: &str) -> Result<(), StateError> {
        self.buffer(key, None)
    }
}

// =============================================================================
// TESTS
// =============================================================================
