use sha2::{Digest, Sha256};

// @module: Content fingerprinting for cue text

/// Compute the SHA-256 fingerprint of a cue's trimmed text.
///
/// Decisions are keyed on text content only: two cues with identical trimmed
/// text always produce the same fingerprint regardless of timing. The empty
/// string is a valid, stable key.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
