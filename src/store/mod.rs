/*!
 * Decision store integration.
 *
 * This module contains the client for the remote decision store, the
 * in-process decision cache, and the stopword registry loaded from the store.
 */

pub mod cache;
pub mod client;
pub mod memory;
pub mod models;
pub mod stopwords;

pub use cache::DecisionCache;
pub use client::{CouchStore, DecisionStore, Inserted};
pub use memory::MemoryStore;
pub use models::{DecisionCommand, DecisionDoc};
pub use stopwords::StopwordRegistry;
