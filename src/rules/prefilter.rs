//! Keyword prefilter.
//!
//! One case-insensitive multi-pattern pass over a fragment decides
//! which rules are worth running their regex at all. This is the
//! dominant performance optimization and is used unconditionally,
//! even with a single active rule.

use aho_corasick::AhoCorasick;
use rustc_hash::FxHashSet;

use super::{Rule, RuleError};

/// Maps fragment content to the set of candidate rules.
#[derive(Debug)]
pub struct KeywordIndex {
    automaton: AhoCorasick,
    /// Pattern index -> indices of rules triggered by that keyword.
    keyword_rules: Vec<Vec<usize>>,
    /// Rules with no keywords; candidates for every fragment.
    keywordless: Vec<usize>,
}

impl KeywordIndex {
    /// Builds the index over the union of all rule keywords.
    pub fn build(rules: &[Rule]) -> Result<Self, RuleError> {
        let mut keywords: Vec<String> = Vec::new();
        let mut keyword_rules: Vec<Vec<usize>> = Vec::new();
        let mut keywordless = Vec::new();

        for (rule_idx, rule) in rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                keywordless.push(rule_idx);
                continue;
            }
            for keyword in &rule.keywords {
                match keywords.iter().position(|k| k == keyword) {
                    Some(pos) => keyword_rules[pos].push(rule_idx),
                    None => {
                        keywords.push(keyword.clone());
                        keyword_rules.push(vec![rule_idx]);
                    }
                }
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&keywords)
            .map_err(|e| RuleError::Prefilter(e.to_string()))?;

        Ok(Self {
            automaton,
            keyword_rules,
            keywordless,
        })
    }

    /// Returns the candidate rule indices for a fragment, sorted for
    /// deterministic evaluation order.
    #[must_use]
    pub fn candidates(&self, raw: &str) -> Vec<usize> {
        let mut set: FxHashSet<usize> = self.keywordless.iter().copied().collect();
        for m in self.automaton.find_overlapping_iter(raw) {
            set.extend(self.keyword_rules[m.pattern().as_usize()].iter().copied());
        }
        let mut out: Vec<usize> = set.into_iter().collect();
        out.sort_unstable();
        out
    }
}
