use std::path::PathBuf;

/// Commit metadata carried by fragments that originate from git history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit SHA.
    pub sha: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Author date, as printed by `git log`.
    pub date: String,
    /// Commit message.
    pub message: String,
}

/// A unit of text submitted to the scanner.
///
/// Byte offsets inside `raw` translate to coordinates in the originating
/// file via `line_base` plus newline counting inside `raw`.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// The text to scan.
    pub raw: String,
    /// Path of the originating file.
    pub path: PathBuf,
    /// Commit metadata, when the fragment comes from git history.
    pub commit: Option<CommitInfo>,
    /// 1-based line number at which `raw` begins in its file.
    pub line_base: usize,
    /// Original symlink path, when the file was reached through one.
    pub symlink_path: Option<PathBuf>,
}

impl Fragment {
    /// Fragment covering a whole file.
    #[must_use]
    pub fn from_file(path: PathBuf, raw: String) -> Self {
        Self {
            raw,
            path,
            commit: None,
            line_base: 1,
            symlink_path: None,
        }
    }

    /// Fragment covering a run of added lines from a diff hunk.
    #[must_use]
    pub fn from_hunk(
        path: PathBuf,
        raw: String,
        line_base: usize,
        commit: Option<CommitInfo>,
    ) -> Self {
        Self {
            raw,
            path,
            commit,
            line_base,
            symlink_path: None,
        }
    }
}
