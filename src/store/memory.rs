/*!
 * In-memory decision store for tests and offline runs.
 *
 * Mirrors the conflict semantics of the remote store: inserting a decision
 * whose key already exists reports [`Inserted::AlreadyExists`] instead of
 * failing. Failure injection flags simulate an unreachable store.
 */

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::store::client::{DecisionStore, Inserted};
use crate::store::models::DecisionDoc;

/// A [`DecisionStore`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Decisions keyed by fingerprint
    decisions: Mutex<BTreeMap<String, DecisionDoc>>,

    /// Stopword patterns in insertion order
    stopwords: Mutex<Vec<String>>,

    /// When set, every read operation fails
    fail_reads: AtomicBool,

    /// When set, every write operation fails
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with stopword patterns
    pub fn with_stopwords<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut stopwords = store.stopwords.lock().unwrap();
            stopwords.extend(patterns.into_iter().map(|p| p.into()));
        }
        store
    }

    /// Simulate an unreachable store for read operations
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Simulate an unreachable store for write operations
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored decisions
    pub fn decision_count(&self) -> usize {
        self.decisions.lock().unwrap().len()
    }

    /// Look up a stored decision synchronously, for assertions
    pub fn stored_decision(&self, fingerprint: &str) -> Option<DecisionDoc> {
        self.decisions.lock().unwrap().get(fingerprint).cloned()
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::RequestFailed(
                "simulated store outage (read)".to_string(),
            ));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::RequestFailed(
                "simulated store outage (write)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DecisionStore for MemoryStore {
    async fn list_decisions(&self) -> Result<Vec<DecisionDoc>, StoreError> {
        self.check_read()?;
        Ok(self.decisions.lock().unwrap().values().cloned().collect())
    }

    async fn get_decision(&self, fingerprint: &str) -> Result<Option<DecisionDoc>, StoreError> {
        self.check_read()?;
        Ok(self.decisions.lock().unwrap().get(fingerprint).cloned())
    }

    async fn insert_decision(&self, doc: &DecisionDoc) -> Result<Inserted, StoreError> {
        self.check_write()?;

        let mut decisions = self.decisions.lock().unwrap();
        if decisions.contains_key(&doc.id) {
            return Ok(Inserted::AlreadyExists);
        }

        decisions.insert(doc.id.clone(), doc.clone());
        Ok(Inserted::Created)
    }

    async fn list_stopwords(&self) -> Result<Vec<String>, StoreError> {
        self.check_read()?;
        Ok(self.stopwords.lock().unwrap().clone())
    }

    async fn insert_stopword(&self, pattern: &str) -> Result<Inserted, StoreError> {
        self.check_write()?;

        let mut stopwords = self.stopwords.lock().unwrap();
        if stopwords.iter().any(|p| p == pattern) {
            return Ok(Inserted::AlreadyExists);
        }

        stopwords.push(pattern.to_string());
        Ok(Inserted::Created)
    }
}
