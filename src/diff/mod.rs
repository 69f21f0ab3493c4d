//! Unified-diff ingestion.
//!
//! Translates `git log -p` / `git diff` output into fragments whose
//! byte offsets map back to post-change file coordinates.

pub mod parser;

use thiserror::Error;

/// Errors from the diff parsing layer.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The underlying stream could not be read.
    #[error("failed to read diff stream: {0}")]
    Read(#[from] std::io::Error),
}
