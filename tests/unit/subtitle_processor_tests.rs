/*!
 * Tests for subtitle document parsing and rendering
 */

use anyhow::Result;
use subsweep::subtitle_processor::{Cue, CueDocument, SubtitleFormat};

/// Test VTT timestamp formatting
#[test]
fn test_vtt_timestamp_format_withKnownOffset_shouldFormatCorrectly() {
    assert_eq!(Cue::format_vtt_timestamp(0), "00:00:00.000");
    assert_eq!(Cue::format_vtt_timestamp(5_025_678), "01:23:45.678");
    assert_eq!(Cue::format_srt_timestamp(5_025_678), "01:23:45,678");
}

/// Test parsing a plain VTT document
#[test]
fn test_parse_vtt_withValidDocument_shouldProduceOrderedCues() -> Result<()> {
    let content = "WEBVTT\n\n\
        00:00:00.000 --> 00:00:01.500\nhello\n\n\
        00:00:01.500 --> 00:00:03.000\nsecond line\nwith continuation\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Vtt, content)?;

    assert_eq!(doc.cues.len(), 2);
    assert_eq!(doc.cues[0], Cue::new(0, 1500, "hello"));
    assert_eq!(
        doc.cues[1],
        Cue::new(1500, 3000, "second line\nwith continuation")
    );
    Ok(())
}

/// Test that cue identifiers and NOTE blocks are ignored
#[test]
fn test_parse_vtt_withIdentifiersAndNotes_shouldSkipNonCueContent() -> Result<()> {
    let content = "WEBVTT\n\n\
        NOTE this is a comment\nspanning two lines\n\n\
        intro-cue\n00:00:00.000 --> 00:00:01.000\nhello\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Vtt, content)?;

    assert_eq!(doc.cues.len(), 1);
    assert_eq!(doc.cues[0].text, "hello");
    Ok(())
}

/// Test that hours are optional in VTT timing lines
#[test]
fn test_parse_vtt_withShortTimestamps_shouldParseMinutesSeconds() -> Result<()> {
    let content = "WEBVTT\n\n01:02.345 --> 01:03.000\nshort form\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Vtt, content)?;

    assert_eq!(doc.cues[0].start_ms, 62_345);
    assert_eq!(doc.cues[0].end_ms, 63_000);
    Ok(())
}

/// Test that a missing WEBVTT header is a terminal parse error
#[test]
fn test_parse_vtt_withoutHeader_shouldFail() {
    let content = "00:00:00.000 --> 00:00:01.000\nhello\n\n";
    assert!(CueDocument::parse(SubtitleFormat::Vtt, content).is_err());
}

/// Test that a cue with an empty payload survives parsing
#[test]
fn test_parse_vtt_withEmptyPayload_shouldKeepCue() -> Result<()> {
    let content = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n\n\
        00:00:01.000 --> 00:00:02.000\nafter\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Vtt, content)?;

    assert_eq!(doc.cues.len(), 2);
    assert_eq!(doc.cues[0].text, "");
    assert_eq!(doc.cues[1].text, "after");
    Ok(())
}

/// Test parsing a plain SRT document
#[test]
fn test_parse_srt_withValidDocument_shouldProduceOrderedCues() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:02,500\nfirst\n\n\
        2\n00:00:02,500 --> 00:00:04,000\nsecond\nline\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Srt, content)?;

    assert_eq!(doc.cues.len(), 2);
    assert_eq!(doc.cues[0], Cue::new(1000, 2500, "first"));
    assert_eq!(doc.cues[1], Cue::new(2500, 4000, "second\nline"));
    Ok(())
}

/// Test that malformed timing (end before start) passes through unchanged
#[test]
fn test_parse_srt_withEndBeforeStart_shouldPassThrough() -> Result<()> {
    let content = "1\n00:00:05,000 --> 00:00:01,000\nbackwards\n\n";

    let doc = CueDocument::parse(SubtitleFormat::Srt, content)?;

    assert_eq!(doc.cues.len(), 1);
    assert_eq!(doc.cues[0].start_ms, 5000);
    assert_eq!(doc.cues[0].end_ms, 1000);
    Ok(())
}

/// Test that SRT content without any timing line is a parse error
#[test]
fn test_parse_srt_withNoTimingLines_shouldFail() {
    assert!(CueDocument::parse(SubtitleFormat::Srt, "just some prose\n").is_err());
}

/// Test VTT rendering preserves order and timing exactly
#[test]
fn test_render_vtt_withCues_shouldPreserveOrderAndTiming() {
    let doc = CueDocument::new(
        SubtitleFormat::Vtt,
        vec![Cue::new(0, 1000, "hello"), Cue::new(2000, 3000, "world")],
    );

    let rendered = doc.render();

    assert_eq!(
        rendered,
        "WEBVTT\n\n\
         00:00:00.000 --> 00:00:01.000\nhello\n\n\
         00:00:02.000 --> 00:00:03.000\nworld\n\n"
    );
}

/// Test SRT rendering renumbers sequentially after deletions
#[test]
fn test_render_srt_withCues_shouldRenumberSequentially() {
    let doc = CueDocument::new(
        SubtitleFormat::Srt,
        vec![Cue::new(0, 1000, "kept one"), Cue::new(5000, 6000, "kept two")],
    );

    let rendered = doc.render();

    assert!(rendered.starts_with("1\n00:00:00,000 --> 00:00:01,000\nkept one\n\n"));
    assert!(rendered.contains("2\n00:00:05,000 --> 00:00:06,000\nkept two\n\n"));
}

/// Test that a parse/render round trip is stable on the second pass
#[test]
fn test_round_trip_withRenderedVtt_shouldBeStable() -> Result<()> {
    let doc = CueDocument::new(
        SubtitleFormat::Vtt,
        vec![Cue::new(10, 20, "a"), Cue::new(30, 40, "b")],
    );

    let first = doc.render();
    let reparsed = CueDocument::parse(SubtitleFormat::Vtt, &first)?;
    assert_eq!(reparsed.render(), first);
    Ok(())
}

/// Test format detection from file extension
#[test]
fn test_format_from_path_withKnownExtensions_shouldDetect() {
    assert_eq!(
        SubtitleFormat::from_path("a/b/file.VTT").unwrap(),
        SubtitleFormat::Vtt
    );
    assert_eq!(
        SubtitleFormat::from_path("file.srt").unwrap(),
        SubtitleFormat::Srt
    );
    assert!(SubtitleFormat::from_path("file.ass").is_err());
}
