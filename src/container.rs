/*!
 * Transactional media-container mutation.
 *
 * Rewrites a container through external tools under a strict
 * backup -> edit -> verify -> commit-or-rollback protocol. From the moment
 * the backup rename completes until commit or rollback finishes, a full
 * untouched copy of the original always exists at `<path>.backup`.
 */

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::Deserialize;
use tokio::process::Command;

use crate::errors::ContainerError;

/// Probe output: the container's track listing
#[derive(Debug, Deserialize, Default)]
pub struct ProbeReport {
    /// Top-level media element
    #[serde(default)]
    pub media: Option<ProbeMedia>,
}

/// The `media` element of a probe report
#[derive(Debug, Deserialize, Default)]
pub struct ProbeMedia {
    /// All tracks in the container
    #[serde(default)]
    pub track: Vec<ProbeTrack>,
}

/// One track of a probed container
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeTrack {
    /// Track type as reported by the probe ("General", "Video", "Audio", "Text", ...)
    #[serde(rename = "@type")]
    pub kind: String,
}

impl ProbeReport {
    /// Whether the container embeds any text/subtitle track
    pub fn has_text_track(&self) -> bool {
        self.tracks().iter().any(|t| t.kind == "Text")
    }

    /// Number of audio tracks, used to clear every audio track name
    pub fn audio_track_count(&self) -> usize {
        self.tracks().iter().filter(|t| t.kind == "Audio").count()
    }

    fn tracks(&self) -> &[ProbeTrack] {
        self.media.as_ref().map(|m| m.track.as_slice()).unwrap_or(&[])
    }
}

/// Requested in-place metadata edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEdits {
    /// Drop the container title tag
    pub drop_title: bool,

    /// 1-based audio track ids whose name tag should be dropped
    pub drop_audio_track_names: Vec<usize>,
}

/// Options for a container rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemuxOptions {
    /// Stream-copy all streams (never re-encode)
    pub copy_streams: bool,

    /// Drop every subtitle stream
    pub drop_subtitles: bool,

    /// Clear the container title tag
    pub clear_title: bool,
}

impl Default for RemuxOptions {
    fn default() -> Self {
        RemuxOptions {
            copy_streams: true,
            drop_subtitles: true,
            clear_title: true,
        }
    }
}

/// External tool invocations behind a seam, so the state machine is testable
/// with failure injection
#[async_trait]
pub trait MediaToolbox: Send + Sync {
    /// Inspect a container for its track listing
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ContainerError>;

    /// Edit metadata tags in place; the editor's own no-op-on-failure
    /// semantics are relied on, no backup is taken
    async fn edit_metadata(&self, path: &Path, edits: &MetadataEdits)
        -> Result<(), ContainerError>;

    /// Rewrite `input` into `output` according to `options`
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        options: &RemuxOptions,
    ) -> Result<(), ContainerError>;
}

// Allows a shared toolbox handle wherever an owned one is expected
#[async_trait]
impl<T: MediaToolbox + ?Sized> MediaToolbox for std::sync::Arc<T> {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ContainerError> {
        (**self).probe(path).await
    }

    async fn edit_metadata(
        &self,
        path: &Path,
        edits: &MetadataEdits,
    ) -> Result<(), ContainerError> {
        (**self).edit_metadata(path, edits).await
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        options: &RemuxOptions,
    ) -> Result<(), ContainerError> {
        (**self).remux(input, output, options).await
    }
}

/// Production toolbox invoking mediainfo, mkvpropedit and ffmpeg, one
/// subprocess at a time (no timeout is imposed; a hung tool stalls the batch)
#[derive(Debug, Default)]
pub struct SystemToolbox;

impl SystemToolbox {
    /// Create the system toolbox
    pub fn new() -> Self {
        SystemToolbox
    }
}

#[async_trait]
impl MediaToolbox for SystemToolbox {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ContainerError> {
        let output = Command::new("mediainfo")
            .arg("--Output=JSON")
            .arg(path)
            .output()
            .await
            .map_err(|e| ContainerError::ProbeFailed {
                path: path.display().to_string(),
                message: format!("failed to execute mediainfo: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContainerError::ProbeFailed {
                path: path.display().to_string(),
                message: format!("mediainfo exited with {:?}: {}", output.status.code(), stderr),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ContainerError::ProbeFailed {
            path: path.display().to_string(),
            message: format!("unparsable probe output: {}", e),
        })
    }

    async fn edit_metadata(
        &self,
        path: &Path,
        edits: &MetadataEdits,
    ) -> Result<(), ContainerError> {
        let mut command = Command::new("mkvpropedit");
        command.arg(path);

        if edits.drop_title {
            command.args(["-d", "title"]);
        }

        for track_id in &edits.drop_audio_track_names {
            command.args(["--edit", &format!("track:a{}", track_id), "-d", "name"]);
        }

        let output = command
            .output()
            .await
            .map_err(|e| ContainerError::ToolFailed {
                tool: "mkvpropedit".to_string(),
                code: None,
                message: format!("failed to execute: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ContainerError::ToolFailed {
                tool: "mkvpropedit".to_string(),
                code: output.status.code(),
                message: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        options: &RemuxOptions,
    ) -> Result<(), ContainerError> {
        let mut command = Command::new("ffmpeg");
        command.arg("-y").arg("-i").arg(input);

        if options.copy_streams {
            // Copy every stream verbatim, never re-encode
            command.args(["-map", "0", "-c", "copy"]);
        }

        if options.drop_subtitles {
            command.arg("-sn");
        }

        if options.clear_title {
            command.args(["-metadata", "title="]);
        }

        command.arg(output);

        let result = command
            .output()
            .await
            .map_err(|e| ContainerError::ToolFailed {
                tool: "ffmpeg".to_string(),
                code: None,
                message: format!("failed to execute: {}", e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ContainerError::ToolFailed {
                tool: "ffmpeg".to_string(),
                code: result.status.code(),
                message: filter_ffmpeg_stderr(&stderr),
            });
        }

        Ok(())
    }
}

/// Terminal state of the container mutation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerOutcome {
    /// No text track was embedded; stray metadata was stripped in place
    CleanedMetadata,

    /// The container was rewritten without its subtitle tracks and the
    /// backup was deleted
    Committed,

    /// The rewrite failed and the original file was restored from backup
    RolledBack {
        /// Why the rewrite failed
        reason: String,
    },
}

/// Sibling backup path for a container: `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".backup");
    PathBuf::from(os)
}

/// Run the container mutation state machine on one file.
///
/// PROBE -> (NO_SUBS_FOUND | SUBS_FOUND) -> ... -> COMMITTED | ROLLED_BACK.
/// Probe, metadata-edit and backup failures surface as errors with the file
/// left untouched; a failed rewrite rolls back and reports
/// [`ContainerOutcome::RolledBack`].
pub async fn clean_container(
    path: &Path,
    toolbox: &dyn MediaToolbox,
) -> Result<ContainerOutcome, ContainerError> {
    info!("Cleaning {}", path.display());

    let report = toolbox.probe(path).await?;

    if !report.has_text_track() {
        debug!("No text track in {}", path.display());

        // Title and audio track names are presumed dirty; probing them is
        // not reliable, so always attempt the edit
        let edits = MetadataEdits {
            drop_title: true,
            drop_audio_track_names: (1..=report.audio_track_count()).collect(),
        };
        toolbox.edit_metadata(path, &edits).await?;

        info!("Cleaned: {}", path.display());
        return Ok(ContainerOutcome::CleanedMetadata);
    }

    info!("Text track found in {}, removing...", path.display());

    // BACKED_UP: the rename must complete before any destructive invocation;
    // the backup is the sole safety net
    let backup = backup_path(path);
    std::fs::rename(path, &backup).map_err(|e| ContainerError::BackupFailed(format!(
        "failed to rename {} to {}: {}",
        path.display(),
        backup.display(),
        e
    )))?;

    // REWRITTEN: stream-copy everything except subtitles, clear the title
    let remux_result = toolbox
        .remux(&backup, path, &RemuxOptions::default())
        .await;

    match remux_result {
        Ok(()) => {
            // COMMITTED: only a verified successful tool exit deletes the backup
            if let Err(e) = std::fs::remove_file(&backup) {
                warn!("Failed to delete backup {}: {}", backup.display(), e);
            }
            info!("Cleaned: {}", path.display());
            Ok(ContainerOutcome::Committed)
        }
        Err(tool_error) => {
            // ROLLED_BACK: drop any partial output, then restore the original
            if path.exists() {
                let _ = std::fs::remove_file(path);
            }
            std::fs::rename(&backup, path).map_err(|e| {
                ContainerError::BackupFailed(format!(
                    "rewrite failed AND backup restore failed, backup left at {}: {}",
                    backup.display(),
                    e
                ))
            })?;

            error!("Failed to clean {}: {}", path.display(), tool_error);
            Ok(ContainerOutcome::RolledBack {
                reason: tool_error.to_string(),
            })
        }
    }
}

/// Remux an MP4 container into a sibling MKV, dropping subtitle streams.
///
/// The source file is removed only after a successful conversion; on failure
/// any partial output is deleted and the source is left untouched.
pub async fn convert_to_mkv(
    path: &Path,
    toolbox: &dyn MediaToolbox,
) -> Result<PathBuf, ContainerError> {
    let target = path.with_extension("mkv");

    let options = RemuxOptions {
        copy_streams: true,
        drop_subtitles: true,
        clear_title: true,
    };

    match toolbox.remux(path, &target, &options).await {
        Ok(()) => {
            info!("Converted to mkv: {}", path.display());
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove converted source {}: {}", path.display(), e);
            }
            Ok(target)
        }
        Err(e) => {
            if target.exists() {
                let _ = std::fs::remove_file(&target);
            }
            Err(e)
        }
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "  built with",
        "  configuration:",
        "  lib",
        "Input #",
        "  Metadata:",
        "  Duration:",
        "  Chapter",
        "    Chapter",
        "  Stream #",
        "      Metadata:",
        "        title",
        "        BPS",
        "        DURATION",
        "        NUMBER_OF",
        "        _STATISTICS",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            !noise_prefixes.iter().any(|p| line.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
