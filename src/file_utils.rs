use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Kinds of input this tool knows how to process
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MediaKind {
    /// WebVTT subtitle document
    SubtitleVtt,
    /// SubRip subtitle document
    SubtitleSrt,
    /// Matroska-family container (mkv, webm), cleaned in place
    Matroska,
    /// MP4 container, converted to mkv before cleaning
    Mp4,
    /// Anything else, skipped
    Unknown,
}

impl MediaKind {
    /// Classify a path by its file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> MediaKind {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "vtt" => MediaKind::SubtitleVtt,
            "srt" => MediaKind::SubtitleSrt,
            "mkv" | "webm" => MediaKind::Matroska,
            "mp4" => MediaKind::Mp4,
            _ => MediaKind::Unknown,
        }
    }

    /// Whether this kind is processed at all
    pub fn is_supported(&self) -> bool {
        !matches!(self, MediaKind::Unknown)
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    /// Collect every supported file under a directory, in a deterministic
    /// order so batches are reproducible
    pub fn find_media_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && MediaKind::from_path(path).is_supported() {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
