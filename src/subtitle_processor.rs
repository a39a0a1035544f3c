use std::fmt;
use std::path::Path;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Cue-based subtitle document parsing and rendering

// @const: SRT timing line regex (HH:MM:SS,mmm --> HH:MM:SS,mmm)
static SRT_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2}),(\d{3})")
        .unwrap()
});

// @const: VTT timing line regex, hours optional (MM:SS.mmm or HH:MM:SS.mmm)
static VTT_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})")
        .unwrap()
});

/// A single timed text fragment within a subtitle document.
///
/// Cues are never mutated in place: classification constructs a new cue for
/// output, preserving timing and carrying the trimmed text. Timing is not
/// validated here; a cue with `end_ms < start_ms` passes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Start offset in ms
    pub start_ms: u64,

    // @field: End offset in ms
    pub end_ms: u64,

    // @field: Cue payload text
    pub text: String,
}

impl Cue {
    /// Create a new cue
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Format a millisecond offset as a VTT timestamp (HH:MM:SS.mmm)
    pub fn format_vtt_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }

    /// Format a millisecond offset as an SRT timestamp (HH:MM:SS,mmm)
    pub fn format_srt_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} --> {}\n{}",
            Self::format_vtt_timestamp(self.start_ms),
            Self::format_vtt_timestamp(self.end_ms),
            self.text
        )
    }
}

/// Textual format of a subtitle document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// WebVTT (.vtt)
    Vtt,
    /// SubRip (.srt)
    Srt,
}

impl SubtitleFormat {
    /// Determine the subtitle format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "vtt" => Ok(SubtitleFormat::Vtt),
            "srt" => Ok(SubtitleFormat::Srt),
            other => Err(SubtitleError::UnsupportedFormat(other.to_string()).into()),
        }
    }
}

/// An ordered sequence of cues together with its source format.
///
/// Document order is preserved exactly from parse to render; cues are never
/// reordered or renumbered beyond the sequential indices SRT requires.
#[derive(Debug, Clone)]
pub struct CueDocument {
    /// Source format, used to round-trip the document
    pub format: SubtitleFormat,

    /// Cues in document order
    pub cues: Vec<Cue>,
}

impl CueDocument {
    /// Build a document from already-parsed cues
    pub fn new(format: SubtitleFormat, cues: Vec<Cue>) -> Self {
        CueDocument { format, cues }
    }

    /// Parse a full document text into an ordered cue sequence.
    ///
    /// Parsing failure is terminal for the document; no partial result is
    /// produced.
    pub fn parse(format: SubtitleFormat, content: &str) -> Result<Self> {
        let cues = match format {
            SubtitleFormat::Vtt => Self::parse_vtt(content)?,
            SubtitleFormat::Srt => Self::parse_srt(content)?,
        };

        Ok(CueDocument { format, cues })
    }

    /// Construct a sibling document with the same format and new cues
    pub fn with_cues(&self, cues: Vec<Cue>) -> Self {
        CueDocument {
            format: self.format,
            cues,
        }
    }

    /// Parse WebVTT content into cues
    fn parse_vtt(content: &str) -> Result<Vec<Cue>> {
        let content = content.trim_start_matches('\u{feff}');

        let mut lines = content.lines();
        let header = lines
            .next()
            .ok_or_else(|| SubtitleError::ParseError("Empty document".to_string()))?;

        if !header.trim_end().starts_with("WEBVTT") {
            return Err(SubtitleError::ParseError(
                "Missing WEBVTT header".to_string(),
            )
            .into());
        }

        let mut cues = Vec::new();
        let mut current_timing: Option<(u64, u64)> = None;
        let mut current_text = String::new();
        let mut in_skipped_block = false;

        let mut finalize = |timing: &mut Option<(u64, u64)>, text: &mut String| {
            if let Some((start_ms, end_ms)) = timing.take() {
                cues.push(Cue::new(start_ms, end_ms, text.clone()));
            }
            text.clear();
        };

        for line in lines {
            let trimmed = line.trim_end();

            if trimmed.trim().is_empty() {
                // Blank line terminates the current block
                finalize(&mut current_timing, &mut current_text);
                in_skipped_block = false;
                continue;
            }

            if in_skipped_block {
                continue;
            }

            // NOTE, STYLE and REGION blocks carry no cues
            if current_timing.is_none()
                && (trimmed.starts_with("NOTE")
                    || trimmed == "STYLE"
                    || trimmed.starts_with("REGION"))
            {
                in_skipped_block = true;
                continue;
            }

            if let Some(caps) = VTT_TIMING_REGEX.captures(trimmed) {
                // A timing line inside a payload starts a new cue; a stray
                // cue identifier line before it is simply discarded.
                finalize(&mut current_timing, &mut current_text);

                let start_ms = Self::capture_to_ms(&caps, 1);
                let end_ms = Self::capture_to_ms(&caps, 5);
                current_timing = Some((start_ms, end_ms));
                continue;
            }

            if current_timing.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            }
            // Otherwise: a cue identifier line; the next line carries timing
        }

        finalize(&mut current_timing, &mut current_text);

        Ok(cues)
    }

    /// Parse SubRip content into cues
    fn parse_srt(content: &str) -> Result<Vec<Cue>> {
        let content = content.trim_start_matches('\u{feff}');

        let mut cues = Vec::new();
        let mut current_timing: Option<(u64, u64)> = None;
        let mut current_text = String::new();
        let mut saw_timing = false;

        let mut finalize = |timing: &mut Option<(u64, u64)>, text: &mut String| {
            if let Some((start_ms, end_ms)) = timing.take() {
                cues.push(Cue::new(start_ms, end_ms, text.clone()));
            }
            text.clear();
        };

        for line in content.lines() {
            let trimmed = line.trim_end();

            if trimmed.trim().is_empty() {
                finalize(&mut current_timing, &mut current_text);
                continue;
            }

            if let Some(caps) = SRT_TIMING_REGEX.captures(trimmed) {
                finalize(&mut current_timing, &mut current_text);

                let start_ms = Self::srt_capture_to_ms(&caps, 1);
                let end_ms = Self::srt_capture_to_ms(&caps, 5);
                current_timing = Some((start_ms, end_ms));
                saw_timing = true;
                continue;
            }

            if current_timing.is_some() {
                // Sequence numbers only appear between blocks, so anything
                // here is payload
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else if trimmed.trim().parse::<usize>().is_err() {
                return Err(SubtitleError::ParseError(format!(
                    "Unexpected line outside a cue block: {}",
                    trimmed
                ))
                .into());
            }
        }

        finalize(&mut current_timing, &mut current_text);

        if !saw_timing {
            return Err(
                SubtitleError::ParseError("No cue timing lines found".to_string()).into(),
            );
        }

        Ok(cues)
    }

    /// Serialize the document back into its textual format.
    ///
    /// Cue order and timing are written out exactly as held in memory.
    pub fn render(&self) -> String {
        match self.format {
            SubtitleFormat::Vtt => self.render_vtt(),
            SubtitleFormat::Srt => self.render_srt(),
        }
    }

    fn render_vtt(&self) -> String {
        let mut out = String::from("WEBVTT\n\n");

        for cue in &self.cues {
            out.push_str(&Cue::format_vtt_timestamp(cue.start_ms));
            out.push_str(" --> ");
            out.push_str(&Cue::format_vtt_timestamp(cue.end_ms));
            out.push('\n');
            out.push_str(&cue.text);
            out.push_str("\n\n");
        }

        out
    }

    fn render_srt(&self) -> String {
        let mut out = String::new();

        for (i, cue) in self.cues.iter().enumerate() {
            out.push_str(&format!("{}\n", i + 1));
            out.push_str(&Cue::format_srt_timestamp(cue.start_ms));
            out.push_str(" --> ");
            out.push_str(&Cue::format_srt_timestamp(cue.end_ms));
            out.push('\n');
            out.push_str(&cue.text);
            out.push_str("\n\n");
        }

        out
    }

    /// Convert a VTT regex capture group sequence to milliseconds
    fn capture_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let hours: u64 = caps
            .get(start_idx)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let minutes: u64 = caps
            .get(start_idx + 1)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let seconds: u64 = caps
            .get(start_idx + 2)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let millis: u64 = caps
            .get(start_idx + 3)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));

        (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
    }

    /// Convert an SRT regex capture group sequence to milliseconds
    fn srt_capture_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        // Same layout as VTT captures, hours mandatory
        Self::capture_to_ms(caps, start_idx)
    }
}

impl fmt::Display for CueDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Document")?;
        writeln!(f, "Format: {:?}", self.format)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
