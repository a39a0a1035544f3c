use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;

// @module: Document types persisted in the decision store

/// Verdict attached to a fingerprint
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionCommand {
    /// Retain any cue with this fingerprint
    Keep,
    /// Drop any cue with this fingerprint
    Delete,
}

impl DecisionCommand {
    // @returns: Lowercase command identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Keep => "keep".to_string(),
            Self::Delete => "delete".to_string(),
        }
    }
}

impl std::fmt::Display for DecisionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for DecisionCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "delete" => Ok(Self::Delete),
            _ => Err(anyhow!("Invalid decision command: {}", s)),
        }
    }
}

/// A persisted keep/delete decision, keyed by the fingerprint of the cue text.
///
/// The document id equals the fingerprint, so at most one decision can exist
/// per distinct trimmed text. Decisions are write-once: a later insert with
/// the same key is reported as a conflict by the store and treated as already
/// satisfied.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DecisionDoc {
    /// Document id (equals `hash`)
    #[serde(rename = "_id")]
    pub id: String,

    /// Store revision, present on documents read back from the store
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Fingerprint of the trimmed cue text
    pub hash: String,

    /// The verdict
    pub command: DecisionCommand,
}

impl DecisionDoc {
    /// Create a decision for an already-computed fingerprint
    pub fn new(hash: impl Into<String>, command: DecisionCommand) -> Self {
        let hash = hash.into();
        DecisionDoc {
            id: hash.clone(),
            rev: None,
            hash,
            command,
        }
    }

    /// Create a decision for a piece of cue text, fingerprinting it first
    pub fn for_text(text: &str, command: DecisionCommand) -> Self {
        Self::new(fingerprint(text.trim()), command)
    }
}

/// Response shape of the store's list operation
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse<T> {
    /// One row per stored document
    pub rows: Vec<AllDocsRow<T>>,
}

/// One row of a list response; `doc` is only present when the listing was
/// requested with documents included
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AllDocsRow<T> {
    /// Document id
    pub id: String,

    /// The document itself, when included
    #[serde(default)]
    pub doc: Option<T>,
}
