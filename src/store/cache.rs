/*!
 * In-process decision cache.
 *
 * Single source of truth for decisions during one run. The cache is an
 * explicitly owned object passed by reference to the classification engine;
 * it is refreshed from the store at run start and fully reloaded after every
 * store write rather than incrementally patched, so concurrent writers
 * sharing the same store are picked up.
 */

use std::collections::HashMap;

use log::debug;

use crate::errors::StoreError;
use crate::store::client::DecisionStore;
use crate::store::models::DecisionCommand;

/// Mapping from fingerprint to decision, held for the duration of one run
#[derive(Debug, Default)]
pub struct DecisionCache {
    /// Fingerprint to command mapping
    decisions: HashMap<String, DecisionCommand>,
}

impl DecisionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the decision for a fingerprint; absence means undecided
    pub fn get(&self, fingerprint: &str) -> Option<DecisionCommand> {
        self.decisions.get(fingerprint).copied()
    }

    /// Replace the cache contents with the store's current state
    pub async fn reload(&mut self, store: &dyn DecisionStore) -> Result<(), StoreError> {
        let docs = store.list_decisions().await?;

        self.decisions = docs
            .into_iter()
            .map(|doc| (doc.hash, doc.command))
            .collect();

        debug!("Reloaded decision cache with {} entries", self.decisions.len());
        Ok(())
    }

    /// Record a decision locally without touching the store.
    ///
    /// Used when a store write failed after an interactive answer: the rest
    /// of the run must still honor the operator's choice, and the prompt
    /// simply recurs on the next run.
    pub fn record(&mut self, fingerprint: impl Into<String>, command: DecisionCommand) {
        self.decisions.insert(fingerprint.into(), command);
    }

    /// Drop all cached decisions
    pub fn invalidate(&mut self) {
        self.decisions.clear();
    }

    /// Number of cached decisions
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Check if the cache holds no decisions
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
