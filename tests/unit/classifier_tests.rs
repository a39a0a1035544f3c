/*!
 * Tests for the cue classification engine
 */

use std::path::Path;

use anyhow::Result;
use subsweep::classifier::{classify_cues, clean_subtitle_file};
use subsweep::fingerprint::fingerprint;
use subsweep::prompt::ScriptedPrompt;
use subsweep::store::{DecisionCache, DecisionCommand, DecisionDoc, DecisionStore, MemoryStore, StopwordRegistry};
use subsweep::subtitle_processor::{Cue, CueDocument, SubtitleFormat};

use crate::common;

fn sample_doc() -> CueDocument {
    CueDocument::new(
        SubtitleFormat::Vtt,
        vec![
            Cue::new(0, 1000, "hello"),
            Cue::new(1000, 2000, "visit http://x.com"),
            Cue::new(2000, 3000, "world"),
        ],
    )
}

/// Core scenario: stopword match answered "delete" drops the cue and stores
/// the decision keyed by the fingerprint of the trimmed text
#[tokio::test]
async fn test_classify_withDeleteAnswer_shouldDropCueAndPersistDecision() -> Result<()> {
    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let doc = sample_doc();
    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 1);
    assert_eq!(
        retained,
        vec![Cue::new(0, 1000, "hello"), Cue::new(2000, 3000, "world")]
    );

    let stored = store
        .stored_decision(&fingerprint("visit http://x.com"))
        .expect("decision should be persisted");
    assert_eq!(stored.command, DecisionCommand::Delete);
    assert_eq!(prompt.asked_texts(), vec!["visit http://x.com"]);
    Ok(())
}

/// Test that a cached delete is applied without any prompt or store write
#[tokio::test]
async fn test_classify_withCachedDelete_shouldNotPrompt() -> Result<()> {
    let store = MemoryStore::new();
    store
        .insert_decision(&DecisionDoc::for_text("visit http://x.com", DecisionCommand::Delete))
        .await?;

    let mut cache = DecisionCache::new();
    cache.reload(&store).await?;

    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Keep);

    let doc = sample_doc();
    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 1);
    assert_eq!(retained.len(), 2);
    assert_eq!(prompt.asked_count(), 0);
    Ok(())
}

/// Test that a keep answer retains the cue with original timing
#[tokio::test]
async fn test_classify_withKeepAnswer_shouldRetainCueWithTiming() -> Result<()> {
    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Keep);

    let doc = sample_doc();
    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 0);
    assert_eq!(retained[1], Cue::new(1000, 2000, "visit http://x.com"));

    let stored = store
        .stored_decision(&fingerprint("visit http://x.com"))
        .expect("keep decision should be persisted too");
    assert_eq!(stored.command, DecisionCommand::Keep);
    Ok(())
}

/// Test that identical text with different timing shares one decision and
/// prompts only once within a document
#[tokio::test]
async fn test_classify_withRepeatedText_shouldPromptOnce() -> Result<()> {
    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let doc = CueDocument::new(
        SubtitleFormat::Vtt,
        vec![
            Cue::new(0, 1000, "visit http://x.com"),
            Cue::new(5000, 6000, "  visit http://x.com  "),
        ],
    );

    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 2);
    assert!(retained.is_empty());
    assert_eq!(prompt.asked_count(), 1);
    assert_eq!(store.decision_count(), 1);
    Ok(())
}

/// Test that the cache still advances when the insert hits an existing key:
/// the store's verdict wins over the prompt's answer
#[tokio::test]
async fn test_classify_withConflictingInsert_shouldApplyStoredVerdict() -> Result<()> {
    let store = MemoryStore::new();
    store
        .insert_decision(&DecisionDoc::for_text("visit http://x.com", DecisionCommand::Delete))
        .await?;

    // Stale cache that has not seen the store's decision yet
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Keep);

    let doc = sample_doc();
    let (_, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    // The prompt answered keep, but the store already held delete
    assert_eq!(removed, 1);
    assert_eq!(
        cache.get(&fingerprint("visit http://x.com")),
        Some(DecisionCommand::Delete)
    );
    Ok(())
}

/// Test that a store write failure never blocks the sanitized output
#[tokio::test]
async fn test_classify_withWriteFailure_shouldStillApplyDecisionLocally() -> Result<()> {
    let store = MemoryStore::new();
    store.set_fail_writes(true);

    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let doc = CueDocument::new(
        SubtitleFormat::Vtt,
        vec![
            Cue::new(0, 1000, "visit http://x.com"),
            Cue::new(2000, 3000, "visit http://x.com"),
        ],
    );

    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 2);
    assert!(retained.is_empty());
    // The decision could not be persisted, but the run still advanced and
    // the second occurrence did not re-prompt
    assert_eq!(prompt.asked_count(), 1);
    assert_eq!(store.decision_count(), 0);
    Ok(())
}

/// Test that an empty trimmed cue is classified like any other text
#[tokio::test]
async fn test_classify_withEmptyCue_shouldClassifyNormally() -> Result<()> {
    let store = MemoryStore::new();
    store
        .insert_decision(&DecisionDoc::for_text("", DecisionCommand::Delete))
        .await?;

    let mut cache = DecisionCache::new();
    cache.reload(&store).await?;

    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Keep);

    let doc = CueDocument::new(
        SubtitleFormat::Vtt,
        vec![Cue::new(0, 1000, "   "), Cue::new(1000, 2000, "kept")],
    );

    let (retained, removed) = classify_cues(
        Path::new("test.vtt"),
        &doc,
        &store,
        &mut cache,
        &stopwords,
        &prompt,
    )
    .await?;

    assert_eq!(removed, 1);
    assert_eq!(retained, vec![Cue::new(1000, 2000, "kept")]);
    Ok(())
}

/// Test the on-disk flow: removed cues rewrite the file, order preserved
#[tokio::test]
async fn test_clean_file_withRemovals_shouldRewriteDocument() -> Result<()> {
    let (_dir, path) = common::temp_file("sample.vtt", common::sample_vtt());

    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let report =
        clean_subtitle_file(&path, &store, &mut cache, &stopwords, &prompt).await?;

    assert_eq!(report.total, 3);
    assert_eq!(report.removed, 1);

    let rewritten = std::fs::read_to_string(&path)?;
    let doc = CueDocument::parse(SubtitleFormat::Vtt, &rewritten)?;
    assert_eq!(
        doc.cues,
        vec![Cue::new(0, 1000, "hello"), Cue::new(2000, 3000, "world")]
    );
    Ok(())
}

/// No-op write avoidance: zero removals leave the source byte-identical even
/// when rendering would normalize its formatting
#[tokio::test]
async fn test_clean_file_withNoRemovals_shouldNotRewrite() -> Result<()> {
    // Odd spacing that a rewrite would normalize away
    let original = "WEBVTT\n\n\n00:00:00.000 --> 00:00:01.000\nhello\n\n\n";
    let (_dir, path) = common::temp_file("sample.vtt", original);

    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let report =
        clean_subtitle_file(&path, &store, &mut cache, &stopwords, &prompt).await?;

    assert_eq!(report.removed, 0);
    assert_eq!(std::fs::read_to_string(&path)?, original);
    Ok(())
}

/// Idempotence: a second run over the same document removes nothing and
/// leaves the output byte-identical
#[tokio::test]
async fn test_clean_file_runTwice_shouldBeIdempotent() -> Result<()> {
    let (_dir, path) = common::temp_file("sample.vtt", common::sample_vtt());

    let store = MemoryStore::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Delete);

    let mut cache = DecisionCache::new();
    let first = clean_subtitle_file(&path, &store, &mut cache, &stopwords, &prompt).await?;
    assert_eq!(first.removed, 1);
    let after_first = std::fs::read_to_string(&path)?;

    // Fresh cache, stable store: everything is already decided
    let mut cache = DecisionCache::new();
    cache.reload(&store).await?;
    let second = clean_subtitle_file(&path, &store, &mut cache, &stopwords, &prompt).await?;

    assert_eq!(second.removed, 0);
    assert_eq!(std::fs::read_to_string(&path)?, after_first);
    assert_eq!(prompt.asked_count(), 1);
    Ok(())
}

/// Test that an unparsable document is a terminal error for that document
#[tokio::test]
async fn test_clean_file_withMalformedDocument_shouldFail() {
    let (_dir, path) = common::temp_file("broken.vtt", "not a subtitle file at all");

    let store = MemoryStore::new();
    let mut cache = DecisionCache::new();
    let stopwords = StopwordRegistry::from_patterns(["http"]);
    let prompt = ScriptedPrompt::always(DecisionCommand::Keep);

    let result = clean_subtitle_file(&path, &store, &mut cache, &stopwords, &prompt).await;
    assert!(result.is_err());

    // The document was not touched
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "not a subtitle file at all"
    );
}
