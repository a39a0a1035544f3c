/*!
 * # subsweep
 *
 * A Rust tool that strips unwanted embedded metadata, subtitle tracks and
 * specific subtitle cues from media files, remembering prior human decisions
 * so the same text is never re-reviewed.
 *
 * ## Features
 *
 * - Classify subtitle cues (VTT/SRT) against a content-addressed decision
 *   cache backed by a remote document store
 * - Escalate undecided cues matching a stopword pattern to an interactive
 *   keep/delete prompt, persisting the answer by content hash
 * - Remove embedded subtitle tracks and title/track-name metadata from media
 *   containers via external tools, under a backup/rollback protocol
 * - Convert MP4 containers to MKV before cleaning
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Cue-based subtitle document parsing and rendering
 * - `classifier`: Cue classification engine
 * - `store`: Decision store client, decision cache and stopword registry
 * - `container`: Transactional container mutation via external tools
 * - `prompt`: Injected interactive decision capability
 * - `fingerprint`: Content hashing of cue text
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod classifier;
pub mod container;
pub mod errors;
pub mod file_utils;
pub mod fingerprint;
pub mod prompt;
pub mod store;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller};
pub use classifier::CleanReport;
pub use container::ContainerOutcome;
pub use errors::{AppError, ContainerError, StoreError, SubtitleError};
pub use store::{DecisionCache, DecisionCommand, DecisionStore, StopwordRegistry};
pub use subtitle_processor::{Cue, CueDocument, SubtitleFormat};
