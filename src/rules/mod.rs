//! Rule and allowlist model.
//!
//! Rules are compiled once at startup and held immutably for the whole
//! run; validation failures here are fatal and surface before scanning.

pub mod builtin;
pub mod prefilter;

use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling or validating the rule set.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The designated secret capture group does not exist in the regex.
    #[error("{description} invalid regex secret group {group}, max regex secret group {max}")]
    InvalidSecretGroup {
        /// Rule description, leading the message for parity with
        /// existing tooling.
        description: String,
        /// The configured group number.
        group: usize,
        /// Highest group number the regex defines.
        max: usize,
    },
    /// The detection regex failed to compile. The engine only accepts
    /// patterns the linear-time engine supports; backreferences and
    /// lookaround are rejected here.
    #[error("rule {id}: invalid regex: {source}")]
    InvalidRegex {
        /// Offending rule id.
        id: String,
        /// Compile error from the regex engine.
        source: regex::Error,
    },
    /// The path scoping regex failed to compile.
    #[error("rule {id}: invalid path regex: {source}")]
    InvalidPathRegex {
        /// Offending rule id.
        id: String,
        /// Compile error from the regex engine.
        source: regex::Error,
    },
    /// An allowlist regex failed to compile.
    #[error("allowlist {description:?}: invalid regex: {source}")]
    InvalidAllowlistRegex {
        /// Allowlist description.
        description: String,
        /// Compile error from the regex engine.
        source: regex::Error,
    },
    /// A negative entropy floor makes no sense.
    #[error("rule {id}: entropy floor {value} must be >= 0")]
    NegativeEntropy {
        /// Offending rule id.
        id: String,
        /// Configured floor.
        value: f64,
    },
    /// The keyword prefilter automaton could not be built.
    #[error("failed to build keyword prefilter: {0}")]
    Prefilter(String),
}

/// How an allowlist combines its populated criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    /// Any populated criterion suppresses.
    #[default]
    Or,
    /// Every populated criterion must match to suppress.
    And,
}

/// What text an allowlist's regexes are tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegexTarget {
    /// The captured secret substring.
    #[default]
    Secret,
    /// The full regex match.
    Match,
    /// The full line containing the match.
    Line,
}

/// A suppression filter; when its predicates are satisfied an
/// otherwise-valid finding is discarded.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    /// Human-readable reason for the suppression.
    pub description: String,
    /// How populated criteria combine.
    pub condition: Condition,
    /// Regexes tested against `regex_target`.
    pub regexes: Vec<Regex>,
    /// Regexes tested against the finding's file path.
    pub paths: Vec<Regex>,
    /// Case-insensitive substrings tested against the secret.
    /// Stored lowercase.
    pub stopwords: Vec<String>,
    /// Commit SHAs whose findings are suppressed.
    pub commits: Vec<String>,
    /// Target text for `regexes`.
    pub regex_target: RegexTarget,
}

impl Allowlist {
    /// Returns whether this allowlist suppresses a finding with the
    /// given texts. Empty criteria are ignored; an allowlist with no
    /// populated criterion never suppresses.
    #[must_use]
    pub fn suppresses(
        &self,
        secret: &str,
        matched: &str,
        line: &str,
        path: &str,
        commit: &str,
    ) -> bool {
        let target = match self.regex_target {
            RegexTarget::Secret => secret,
            RegexTarget::Match => matched,
            RegexTarget::Line => line,
        };

        let secret_lower = secret.to_lowercase();
        let mut results = Vec::with_capacity(4);
        if !self.regexes.is_empty() {
            results.push(self.regexes.iter().any(|re| re.is_match(target)));
        }
        if !self.paths.is_empty() {
            results.push(self.paths.iter().any(|re| re.is_match(path)));
        }
        if !self.stopwords.is_empty() {
            results.push(self.stopwords.iter().any(|w| secret_lower.contains(w)));
        }
        if !self.commits.is_empty() {
            results.push(!commit.is_empty() && self.commits.iter().any(|c| c == commit));
        }

        match self.condition {
            Condition::Or => results.iter().any(|&hit| hit),
            Condition::And => !results.is_empty() && results.iter().all(|&hit| hit),
        }
    }
}

/// An immutable detection rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable kebab-case identifier.
    pub id: String,
    /// Human-readable description, copied onto findings.
    pub description: String,
    /// Compiled detection pattern.
    pub regex: Regex,
    /// Capture group holding the secret; 0 means the whole match.
    pub secret_group: usize,
    /// Shannon-entropy floor the secret must reach, when set.
    pub entropy_min: Option<f64>,
    /// Case-insensitive literal prefilter keywords, stored lowercase.
    /// A rule with keywords is only evaluated against fragments that
    /// contain at least one of them.
    pub keywords: Vec<String>,
    /// When set, the rule applies only to matching paths.
    pub path_regex: Option<Regex>,
    /// Labels passed through to findings.
    pub tags: Vec<String>,
    /// Rule-scoped allowlists, evaluated after the global ones.
    pub allowlists: Vec<Allowlist>,
}

impl Rule {
    /// Validates internal consistency. Called for every rule when the
    /// engine is built; a failure aborts the run.
    pub fn validate(&self) -> Result<(), RuleError> {
        // captures_len counts group 0, so the highest usable group
        // number is one less.
        let max_group = self.regex.captures_len() - 1;
        if self.secret_group > max_group {
            return Err(RuleError::InvalidSecretGroup {
                description: self.description.clone(),
                group: self.secret_group,
                max: max_group,
            });
        }
        if let Some(floor) = self.entropy_min {
            if floor < 0.0 {
                return Err(RuleError::NegativeEntropy {
                    id: self.id.clone(),
                    value: floor,
                });
            }
        }
        Ok(())
    }

    /// A global rule has no keywords and no path scoping; it is a
    /// candidate for every fragment.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.keywords.is_empty() && self.path_regex.is_none()
    }
}

/// The compiled rule set handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// All active rules.
    pub rules: Vec<Rule>,
    /// Allowlists applied to findings from every rule, before the
    /// rule-scoped ones.
    pub global_allowlists: Vec<Allowlist>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(regex: &str, secret_group: usize) -> Rule {
        Rule {
            id: "test-rule".to_owned(),
            description: "Test Rule".to_owned(),
            regex: Regex::new(regex).unwrap(),
            secret_group,
            entropy_min: None,
            keywords: Vec::new(),
            path_regex: None,
            tags: Vec::new(),
            allowlists: Vec::new(),
        }
    }

    #[test]
    fn test_secret_group_out_of_range_message() {
        let r = rule(r"key=(\w+)", 3);
        let err = r.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Test Rule invalid regex secret group 3, max regex secret group 1"
        );
    }

    #[test]
    fn test_secret_group_zero_is_always_valid() {
        assert!(rule(r"AKIA[0-9A-Z]{16}", 0).validate().is_ok());
    }

    #[test]
    fn test_negative_entropy_rejected() {
        let mut r = rule(r"\w+", 0);
        r.entropy_min = Some(-1.0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_global_rule_detection() {
        assert!(rule(r"\w+", 0).is_global());
        let mut keyed = rule(r"\w+", 0);
        keyed.keywords = vec!["akia".to_owned()];
        assert!(!keyed.is_global());
    }

    #[test]
    fn test_allowlist_or_any_criterion() {
        let allow = Allowlist {
            stopwords: vec!["example".to_owned()],
            paths: vec![Regex::new(r"^docs/").unwrap()],
            ..Allowlist::default()
        };
        // Stopword hits even though the path does not.
        assert!(allow.suppresses("my-example-key", "m", "l", "src/a.go", ""));
        // Path hits even though the stopword does not.
        assert!(allow.suppresses("hunter2", "m", "l", "docs/a.md", ""));
        assert!(!allow.suppresses("hunter2", "m", "l", "src/a.go", ""));
    }

    #[test]
    fn test_allowlist_and_requires_all() {
        let allow = Allowlist {
            condition: Condition::And,
            stopwords: vec!["example".to_owned()],
            paths: vec![Regex::new(r"^docs/").unwrap()],
            ..Allowlist::default()
        };
        assert!(allow.suppresses("my-example-key", "m", "l", "docs/a.md", ""));
        assert!(!allow.suppresses("my-example-key", "m", "l", "src/a.go", ""));
        assert!(!allow.suppresses("hunter2", "m", "l", "docs/a.md", ""));
    }

    #[test]
    fn test_allowlist_empty_never_suppresses() {
        let allow = Allowlist::default();
        assert!(!allow.suppresses("s", "m", "l", "p", "c"));
        let and = Allowlist {
            condition: Condition::And,
            ..Allowlist::default()
        };
        assert!(!and.suppresses("s", "m", "l", "p", "c"));
    }

    #[test]
    fn test_allowlist_regex_target() {
        let against_line = Allowlist {
            regexes: vec![Regex::new("test fixture").unwrap()],
            regex_target: RegexTarget::Line,
            ..Allowlist::default()
        };
        assert!(against_line.suppresses("s", "m", "key = s // test fixture", "p", ""));
        assert!(!against_line.suppresses("s", "m", "key = s", "p", ""));
    }

    #[test]
    fn test_allowlist_commit_criterion() {
        let allow = Allowlist {
            commits: vec!["deadbeef".to_owned()],
            ..Allowlist::default()
        };
        assert!(allow.suppresses("s", "m", "l", "p", "deadbeef"));
        assert!(!allow.suppresses("s", "m", "l", "p", "feedface"));
        assert!(!allow.suppresses("s", "m", "l", "p", ""));
    }
}
