//! Fragment producers.
//!
//! The directory walker, the git history reader, and the staged-diff
//! reader all expose one capability: produce a sequence of fragments.
//! The orchestrator never knows which one is active. Adapters are I/O
//! only and never evaluate rules.

pub mod directory;
pub mod git;

use thiserror::Error;

use crate::detect::Fragment;
use crate::diff::DiffError;

/// Errors that abort a source entirely. Per-file problems are logged
/// and skipped instead; one bad file never aborts the run.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Filesystem access to the scan root failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The git subprocess could not be spawned or exited non-zero.
    #[error("git {args}: {detail}")]
    Git {
        /// The invoked subcommand, for diagnostics.
        args: String,
        /// Exit status and captured stderr.
        detail: String,
    },
    /// The diff stream could not be parsed.
    #[error(transparent)]
    Diff(#[from] DiffError),
}

/// A producer of scan fragments.
pub trait FragmentSource {
    /// Yields every fragment into the sink.
    fn fragments(&self, sink: &mut dyn FnMut(Fragment)) -> Result<(), SourceError>;
}
