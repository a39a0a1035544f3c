/*!
 * Shared test utilities for the subsweep test suite.
 */

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use subsweep::container::{
    MediaToolbox, MetadataEdits, ProbeMedia, ProbeReport, ProbeTrack, RemuxOptions,
};
use subsweep::errors::ContainerError;

/// Write `content` to a file named `name` inside a fresh temp dir
pub fn temp_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("failed to write temp file");
    (dir, path)
}

/// A small VTT document with one cue that matches the `http` stopword
pub fn sample_vtt() -> &'static str {
    "WEBVTT\n\n\
     00:00:00.000 --> 00:00:01.000\nhello\n\n\
     00:00:01.000 --> 00:00:02.000\nvisit http://x.com\n\n\
     00:00:02.000 --> 00:00:03.000\nworld\n\n"
}

/// Configurable fake for the external media tools.
///
/// Remux success copies the input to the output so commit/rollback tests can
/// compare real on-disk bytes.
#[derive(Debug, Default)]
pub struct FakeToolbox {
    /// Probe reports a text track
    pub has_text_track: bool,

    /// Number of audio tracks the probe reports
    pub audio_tracks: usize,

    /// Probe fails
    pub fail_probe: bool,

    /// Metadata edits fail
    pub fail_edit: bool,

    /// Remux fails after (optionally) leaving a partial output behind
    pub fail_remux: bool,

    /// Write garbage to the output before failing a remux
    pub partial_output_on_failure: bool,

    /// Recorded metadata edit invocations
    pub edits: Mutex<Vec<MetadataEdits>>,

    /// Recorded remux invocations (input, output)
    pub remuxes: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeToolbox {
    pub fn without_subs(audio_tracks: usize) -> Self {
        FakeToolbox {
            has_text_track: false,
            audio_tracks,
            ..Default::default()
        }
    }

    pub fn with_subs() -> Self {
        FakeToolbox {
            has_text_track: true,
            audio_tracks: 1,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaToolbox for FakeToolbox {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ContainerError> {
        if self.fail_probe {
            return Err(ContainerError::ProbeFailed {
                path: path.display().to_string(),
                message: "simulated probe failure".to_string(),
            });
        }

        let mut tracks = vec![
            ProbeTrack {
                kind: "General".to_string(),
            },
            ProbeTrack {
                kind: "Video".to_string(),
            },
        ];
        for _ in 0..self.audio_tracks {
            tracks.push(ProbeTrack {
                kind: "Audio".to_string(),
            });
        }
        if self.has_text_track {
            tracks.push(ProbeTrack {
                kind: "Text".to_string(),
            });
        }

        Ok(ProbeReport {
            media: Some(ProbeMedia { track: tracks }),
        })
    }

    async fn edit_metadata(
        &self,
        _path: &Path,
        edits: &MetadataEdits,
    ) -> Result<(), ContainerError> {
        if self.fail_edit {
            return Err(ContainerError::ToolFailed {
                tool: "mkvpropedit".to_string(),
                code: Some(2),
                message: "simulated edit failure".to_string(),
            });
        }

        self.edits.lock().unwrap().push(edits.clone());
        Ok(())
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        _options: &RemuxOptions,
    ) -> Result<(), ContainerError> {
        self.remuxes
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));

        if self.fail_remux {
            if self.partial_output_on_failure {
                std::fs::write(output, b"partial garbage").unwrap();
            }
            return Err(ContainerError::ToolFailed {
                tool: "ffmpeg".to_string(),
                code: Some(1),
                message: "simulated remux failure".to_string(),
            });
        }

        std::fs::copy(input, output).map_err(|e| ContainerError::ToolFailed {
            tool: "ffmpeg".to_string(),
            code: None,
            message: e.to_string(),
        })?;
        Ok(())
    }
}
