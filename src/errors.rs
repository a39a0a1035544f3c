/*!
 * Error types for the subsweep application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the decision store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error when the HTTP request itself fails
    #[error("Store request failed: {0}")]
    RequestFailed(String),

    /// Error when the store responds with an unexpected status
    #[error("Store responded with error: {status_code} - {message}")]
    StatusError {
        /// HTTP status code
        status_code: u16,
        /// Error body from the store
        message: String,
    },

    /// Error when decoding a store response body
    #[error("Failed to decode store response: {0}")]
    DecodeError(String),

    /// Error when the configured endpoint URL is invalid
    #[error("Invalid store endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Errors that can occur during subtitle document processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Error when a document cannot be parsed into cues
    #[error("Failed to parse subtitle document: {0}")]
    ParseError(String),

    /// Error when a document uses a format this tool cannot round-trip
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),
}

/// Errors that can occur while mutating a media container
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Error when the probe tool fails or produces unusable output
    #[error("Probe failed for {path}: {message}")]
    ProbeFailed {
        /// Path of the probed container
        path: String,
        /// What went wrong
        message: String,
    },

    /// Error when an external editing tool exits non-zero
    #[error("{tool} exited with {code:?}: {message}")]
    ToolFailed {
        /// Name of the external tool
        tool: String,
        /// Exit code if the process terminated normally
        code: Option<i32>,
        /// Filtered stderr of the tool
        message: String,
    },

    /// Error when the backup rename cannot be performed
    #[error("Backup operation failed: {0}")]
    BackupFailed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the decision store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from container mutation
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
