/*!
 * Cue classification engine.
 *
 * Classifies each cue of a subtitle document against the decision cache and
 * the stopword registry, escalating undecided matches to the injected
 * prompt, and rewrites the document in place when cues were removed.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::fingerprint::fingerprint;
use crate::prompt::DecisionPrompt;
use crate::store::cache::DecisionCache;
use crate::store::client::DecisionStore;
use crate::store::models::{DecisionCommand, DecisionDoc};
use crate::store::stopwords::StopwordRegistry;
use crate::subtitle_processor::{Cue, CueDocument, SubtitleFormat};

/// Result of cleaning one subtitle document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    /// Path of the processed document
    pub path: PathBuf,

    /// Total cues seen
    pub total: usize,

    /// Cues removed
    pub removed: usize,
}

/// Classify every cue of a parsed document, in document order.
///
/// Returns the retained cues (carrying trimmed text and original timing)
/// together with the removed-cue count. Decisions made at the prompt are
/// persisted to the store and the cache is reloaded before the next cue, so
/// later occurrences of the same text never re-prompt.
pub async fn classify_cues(
    path: &Path,
    doc: &CueDocument,
    store: &dyn DecisionStore,
    cache: &mut DecisionCache,
    stopwords: &StopwordRegistry,
    prompt: &dyn DecisionPrompt,
) -> Result<(Vec<Cue>, usize)> {
    let mut retained = Vec::with_capacity(doc.cues.len());
    let mut removed = 0usize;

    for cue in &doc.cues {
        let trimmed = cue.text.trim();
        let hash = fingerprint(trimmed);

        match cache.get(&hash) {
            Some(DecisionCommand::Delete) => {
                debug!("Dropping cached-delete cue at {}ms", cue.start_ms);
                removed += 1;
                continue;
            }
            Some(DecisionCommand::Keep) => {
                retained.push(Cue::new(cue.start_ms, cue.end_ms, trimmed));
                continue;
            }
            None => {}
        }

        let Some(pattern) = stopwords.first_match(trimmed) else {
            retained.push(Cue::new(cue.start_ms, cue.end_ms, trimmed));
            continue;
        };

        // Undecided and matching: block on the operator
        let command = prompt.decide(path, cue, pattern)?;

        let decision = DecisionDoc::new(hash.clone(), command);
        match store.insert_decision(&decision).await {
            Ok(_) => {
                // Full reload so the rest of this run, and any decision a
                // concurrent writer may have stored first, take effect
                if let Err(e) = cache.reload(store).await {
                    warn!("Failed to reload decision cache: {}", e);
                    cache.record(hash.clone(), command);
                }
            }
            Err(e) => {
                // Accepted data loss: the sanitized output is still written
                // and the same prompt recurs next run
                warn!("Failed to persist decision for {}: {}", hash, e);
                cache.record(hash.clone(), command);
            }
        }

        // The store is the source of truth; apply whatever it now holds
        let effective = cache.get(&hash).unwrap_or(command);
        match effective {
            DecisionCommand::Delete => removed += 1,
            DecisionCommand::Keep => retained.push(Cue::new(cue.start_ms, cue.end_ms, trimmed)),
        }
    }

    Ok((retained, removed))
}

/// Clean one subtitle document on disk.
///
/// The file is overwritten only when at least one cue was removed; a run
/// that removes nothing leaves the source byte-identical.
pub async fn clean_subtitle_file(
    path: &Path,
    store: &dyn DecisionStore,
    cache: &mut DecisionCache,
    stopwords: &StopwordRegistry,
    prompt: &dyn DecisionPrompt,
) -> Result<CleanReport> {
    info!("Processing: {}", path.display());

    let format = SubtitleFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;

    let doc = CueDocument::parse(format, &content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let total = doc.cues.len();
    let (retained, removed) = classify_cues(path, &doc, store, cache, stopwords, prompt).await?;

    if removed > 0 {
        info!("Removing {} unwanted cue(s) from {}", removed, path.display());
        let output = doc.with_cues(retained).render();
        std::fs::write(path, output)
            .with_context(|| format!("Failed to rewrite subtitle file: {}", path.display()))?;
    }

    info!("Cleaned: {}", path.display());

    Ok(CleanReport {
        path: path.to_path_buf(),
        total,
        removed,
    })
}
