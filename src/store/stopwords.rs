use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::store::client::DecisionStore;

// @module: Store-backed stopword registry

/// Patterns seeded into an empty stopword database.
///
/// These are the built-in defaults; operators extend the set by inserting
/// documents into the stopword database, using the document id as the
/// pattern.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "http",
    "uploaded by",
    "subtitles? by",
    "copyright",
    "opensubtitles",
    "@gmail\\.com",
    "@hotmail\\.com",
    "explosiveskull",
    "4KVOD\\.TV",
];

/// Ordered set of compiled stopword matchers, loaded once per run
pub struct StopwordRegistry {
    /// Source pattern and compiled matcher, in registry order
    patterns: Vec<(String, Regex)>,
}

impl StopwordRegistry {
    /// Compile a registry from raw pattern strings.
    ///
    /// Patterns are matched case-insensitively. A pattern that fails to
    /// compile is skipped with a warning rather than poisoning the run.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let compiled = patterns
            .into_iter()
            .map(|p| p.into())
            .filter_map(|pattern| {
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(regex) => Some((pattern, regex)),
                    Err(e) => {
                        warn!("Skipping unusable stopword pattern '{}': {}", pattern, e);
                        None
                    }
                }
            })
            .collect();

        StopwordRegistry { patterns: compiled }
    }

    /// Load the registry from the store, seeding the defaults when the
    /// stopword database is empty.
    ///
    /// A store failure degrades to the built-in defaults so a run can still
    /// flag the common offenders.
    pub async fn load(store: &dyn DecisionStore) -> Self {
        match store.list_stopwords().await {
            Ok(patterns) if !patterns.is_empty() => {
                debug!("Loaded {} stopword patterns from store", patterns.len());
                Self::from_patterns(patterns)
            }
            Ok(_) => {
                debug!("Stopword database is empty, seeding defaults");
                for pattern in DEFAULT_PATTERNS {
                    if let Err(e) = store.insert_stopword(pattern).await {
                        warn!("Failed to seed stopword '{}': {}", pattern, e);
                    }
                }
                Self::from_patterns(DEFAULT_PATTERNS.iter().copied())
            }
            Err(e) => {
                warn!("Failed to load stopwords from store, using defaults: {}", e);
                Self::from_patterns(DEFAULT_PATTERNS.iter().copied())
            }
        }
    }

    /// Return the first pattern matching `text`, if any.
    ///
    /// Registry order is significant and the first match short-circuits.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(pattern, _)| pattern.as_str())
    }

    /// Check whether any pattern matches `text`
    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Number of usable patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the registry holds no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
