//! Finding post-processing.
//!
//! Runs once, single-threaded, over the raw finding stream: assign
//! fingerprints, apply the inline allow directive and the ignore and
//! baseline sets, dedup by fingerprint, and sort into the deterministic
//! output order. An error on one finding never suppresses the others.

use rustc_hash::FxHashSet;

use crate::detect::{Finding, INLINE_ALLOW};
use crate::filter::{Baseline, IgnoreSet};

/// Finalizes raw findings into the emitted stream.
#[derive(Debug, Default)]
pub struct PostProcessor {
    /// Fingerprints the user chose to ignore.
    pub ignore: IgnoreSet,
    /// Findings already reported by a prior run.
    pub baseline: Baseline,
}

impl PostProcessor {
    /// Creates a post-processor with the given suppression sets.
    #[must_use]
    pub fn new(ignore: IgnoreSet, baseline: Baseline) -> Self {
        Self { ignore, baseline }
    }

    /// Decorates, filters, dedups, and orders findings.
    ///
    /// The output order is deterministic for a given input regardless
    /// of worker scheduling: (file, start_line, rule_id, start_column).
    #[must_use]
    pub fn process(&self, findings: Vec<Finding>) -> Vec<Finding> {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut out = Vec::with_capacity(findings.len());

        for mut finding in findings {
            finding.fingerprint = finding.compute_fingerprint();

            // The scanner already applies the directive; this catches
            // findings injected from other producers.
            if finding.full_line.contains(INLINE_ALLOW) {
                continue;
            }
            if self.ignore.contains(&finding.fingerprint) {
                continue;
            }
            if self.baseline.contains(&finding.fingerprint) {
                continue;
            }
            if !seen.insert(finding.fingerprint.clone()) {
                continue;
            }
            out.push(finding);
        }

        out.sort_by(|a, b| {
            (&a.file, a.start_line, &a.rule_id, a.start_column).cmp(&(
                &b.file,
                b.start_line,
                &b.rule_id,
                b.start_column,
            ))
        });
        out
    }
}
