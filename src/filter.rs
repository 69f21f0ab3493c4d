//! Ignore-file and baseline loading.
//!
//! Both feed the post-processor with fingerprints to drop. Parse
//! problems here are never fatal: the run continues with an empty set
//! and a warning, per the one-bad-file-never-aborts policy.

use std::fs;
use std::path::Path;

use colored::Colorize;
use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Fingerprints from a `.gitleaksignore`-style file: one per line,
/// verbatim, `#` starts a comment.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    fingerprints: FxHashSet<String>,
}

impl IgnoreSet {
    /// Parses ignore-file content.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        let fingerprints = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_owned)
            .collect();
        Self { fingerprints }
    }

    /// Loads an ignore file; a missing or unreadable file yields an
    /// empty set.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_content(&content),
            Err(_) => Self::default(),
        }
    }

    /// Whether a fingerprint is ignored.
    #[must_use]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    /// Number of ignored fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

/// Minimal shape a baseline entry must have.
#[derive(Debug, Deserialize)]
struct BaselineEntry {
    #[serde(alias = "Fingerprint")]
    fingerprint: String,
}

/// Findings from a previous run; current findings whose fingerprint
/// appears here are dropped.
#[derive(Debug, Default)]
pub struct Baseline {
    fingerprints: FxHashSet<String>,
}

impl Baseline {
    /// Parses a baseline JSON array. Invalid JSON warns and yields an
    /// empty baseline.
    #[must_use]
    pub fn from_json(content: &str) -> Self {
        match serde_json::from_str::<Vec<BaselineEntry>>(content) {
            Ok(entries) => Self {
                fingerprints: entries.into_iter().map(|e| e.fingerprint).collect(),
            },
            Err(err) => {
                eprintln!(
                    "{}",
                    format!("WARNING: could not parse baseline, continuing without it: {err}")
                        .yellow()
                );
                Self::default()
            }
        }
    }

    /// Loads a baseline file; missing or unreadable files warn and
    /// yield an empty baseline.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content),
            Err(err) => {
                eprintln!(
                    "{}",
                    format!(
                        "WARNING: could not read baseline {}: {err}",
                        path.display()
                    )
                    .yellow()
                );
                Self::default()
            }
        }
    }

    /// Whether a fingerprint was already known.
    #[must_use]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.fingerprints.contains(fingerprint)
    }
}
