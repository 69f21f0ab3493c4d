use serde::Deserialize;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::rules::builtin::builtin_specs;
use crate::rules::{Allowlist, Condition, RegexTarget, Rule, RuleError, RuleSet};

/// Name of the discovered configuration file.
pub const CONFIG_FILENAME: &str = ".leaksweep.toml";

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration as deserialized from TOML.
pub struct Config {
    /// Optional human-readable title; ignored by the engine.
    #[serde(default)]
    pub title: Option<String>,
    /// Extension of the built-in base catalogue.
    #[serde(default)]
    pub extend: Extend,
    /// Rule definitions. Rules sharing an id with a built-in override it.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Allowlists applied to findings from every rule.
    #[serde(default)]
    pub allowlists: Vec<AllowlistSpec>,
}

/// Controls merging with the built-in base catalogue.
#[derive(Debug, Deserialize, Clone)]
pub struct Extend {
    /// Whether the built-in rules participate at all.
    #[serde(default = "default_use_default")]
    pub use_default: bool,
    /// Built-in rule ids to drop even when `use_default` is set.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
}

fn default_use_default() -> bool {
    true
}

impl Default for Extend {
    fn default() -> Self {
        Self {
            use_default: default_use_default(),
            disabled_rules: Vec::new(),
        }
    }
}

/// A rule definition in TOML form, before compilation.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSpec {
    /// Stable kebab-case identifier.
    pub id: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Detection pattern.
    pub regex: String,
    /// Capture group holding the secret; 0 means the whole match.
    #[serde(default, alias = "secretGroup")]
    pub secret_group: usize,
    /// Shannon-entropy floor for the secret.
    #[serde(default, alias = "entropy")]
    pub entropy_min: Option<f64>,
    /// Case-insensitive prefilter keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Restricts the rule to matching paths.
    #[serde(default, alias = "path")]
    pub path_regex: Option<String>,
    /// Labels passed through to findings.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Rule-scoped allowlists.
    #[serde(default)]
    pub allowlists: Vec<AllowlistSpec>,
}

/// An allowlist definition in TOML form.
#[derive(Debug, Deserialize, Clone)]
pub struct AllowlistSpec {
    /// Human-readable reason for the suppression.
    #[serde(default)]
    pub description: String,
    /// `"or"` (default) or `"and"`.
    #[serde(default = "default_condition")]
    pub condition: String,
    /// Regexes tested against `regex_target`.
    #[serde(default)]
    pub regexes: Vec<String>,
    /// Regexes tested against the finding's file path.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Case-insensitive substrings tested against the secret.
    #[serde(default)]
    pub stopwords: Vec<String>,
    /// Commit SHAs whose findings are suppressed.
    #[serde(default)]
    pub commits: Vec<String>,
    /// `"secret"` (default), `"match"`, or `"line"`.
    #[serde(default = "default_regex_target", alias = "regexTarget")]
    pub regex_target: String,
}

fn default_condition() -> String {
    "or".to_owned()
}

fn default_regex_target() -> String {
    "secret".to_owned()
}

impl Default for AllowlistSpec {
    fn default() -> Self {
        Self {
            description: String::new(),
            condition: default_condition(),
            regexes: Vec::new(),
            paths: Vec::new(),
            stopwords: Vec::new(),
            commits: Vec::new(),
            regex_target: default_regex_target(),
        }
    }
}

impl AllowlistSpec {
    fn compile(&self) -> Result<Allowlist, RuleError> {
        let compile_all = |patterns: &[String]| -> Result<Vec<Regex>, RuleError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| RuleError::InvalidAllowlistRegex {
                        description: self.description.clone(),
                        source,
                    })
                })
                .collect()
        };

        Ok(Allowlist {
            description: self.description.clone(),
            condition: if self.condition.eq_ignore_ascii_case("and") {
                Condition::And
            } else {
                Condition::Or
            },
            regexes: compile_all(&self.regexes)?,
            paths: compile_all(&self.paths)?,
            stopwords: self.stopwords.iter().map(|w| w.to_lowercase()).collect(),
            commits: self.commits.clone(),
            regex_target: match self.regex_target.to_lowercase().as_str() {
                "match" => RegexTarget::Match,
                "line" => RegexTarget::Line,
                _ => RegexTarget::Secret,
            },
        })
    }
}

impl RuleSpec {
    fn compile(&self) -> Result<Rule, RuleError> {
        let regex = Regex::new(&self.regex).map_err(|source| RuleError::InvalidRegex {
            id: self.id.clone(),
            source,
        })?;
        let path_regex = self
            .path_regex
            .as_ref()
            .map(|p| {
                Regex::new(p).map_err(|source| RuleError::InvalidPathRegex {
                    id: self.id.clone(),
                    source,
                })
            })
            .transpose()?;
        let rule = Rule {
            id: self.id.clone(),
            description: self.description.clone(),
            regex,
            secret_group: self.secret_group,
            entropy_min: self.entropy_min,
            keywords: self.keywords.iter().map(|k| k.to_lowercase()).collect(),
            path_regex,
            tags: self.tags.clone(),
            allowlists: self
                .allowlists
                .iter()
                .map(AllowlistSpec::compile)
                .collect::<Result<_, _>>()?,
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl Config {
    /// Parses a TOML document. Unparseable input is a fatal
    /// configuration error.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse configuration")
    }

    /// Loads configuration from an explicit file path.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Loads configuration by walking up from `path` looking for
    /// `.leaksweep.toml`. Falls back to defaults (built-in rules only)
    /// when no file exists; a file that exists but fails to parse is a
    /// fatal error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate);
            }
            if !current.pop() {
                break;
            }
        }

        Ok(Self::default())
    }

    /// Compiles specs into the immutable rule set, merging the built-in
    /// base catalogue keyed by rule id.
    pub fn compile(&self) -> Result<RuleSet, RuleError> {
        let mut specs: Vec<RuleSpec> = Vec::new();
        if self.extend.use_default {
            for spec in builtin_specs() {
                if self.extend.disabled_rules.contains(&spec.id) {
                    continue;
                }
                specs.push(spec);
            }
        }
        for spec in &self.rules {
            match specs.iter_mut().find(|s| s.id == spec.id) {
                Some(existing) => *existing = spec.clone(),
                None => specs.push(spec.clone()),
            }
        }

        let rules = specs
            .iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let global_allowlists = self
            .allowlists
            .iter()
            .map(AllowlistSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleSet {
            rules,
            global_allowlists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_rule_with_allowlist() {
        let config = Config::from_toml(
            r#"
[[rules]]
id = "aws-access-key"
description = "AWS Access Key"
regex = 'AKIA[0-9A-Z]{16}'
keywords = ["AKIA"]
tags = ["key", "AWS"]

[[rules.allowlists]]
condition = "and"
stopwords = ["example"]
paths = ['^testdata/']
"#,
        )
        .unwrap();
        let ruleset = config.compile().unwrap();
        let rule = ruleset
            .rules
            .iter()
            .find(|r| r.id == "aws-access-key")
            .unwrap();
        assert_eq!(rule.allowlists.len(), 1);
        assert_eq!(rule.keywords, vec!["akia"]);
    }

    #[test]
    fn test_unparseable_toml_is_fatal() {
        assert!(Config::from_toml("[[rules]\nid =").is_err());
    }

    #[test]
    fn test_bad_secret_group_is_fatal() {
        let config = Config::from_toml(
            r#"
[[rules]]
id = "broken"
description = "Broken"
regex = 'key=(\w+)'
secret_group = 2
"#,
        )
        .unwrap();
        let err = config.compile().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Broken invalid regex secret group 2, max regex secret group 1"
        );
    }

    #[test]
    fn test_lookaround_pattern_rejected() {
        // The linear-time engine does not support lookaround; such
        // patterns must fail at load, not at scan time.
        let config = Config::from_toml(
            r#"
[[rules]]
id = "lookahead"
description = "Lookahead"
regex = 'key(?=value)'
"#,
        )
        .unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_backreference_pattern_rejected() {
        let config = Config::from_toml(
            r#"
[[rules]]
id = "backref"
description = "Backref"
regex = '(\w+)\s+\1'
"#,
        )
        .unwrap();
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_extend_override_by_id() {
        let config = Config::from_toml(
            r#"
[[rules]]
id = "aws-access-key"
description = "Tightened AWS rule"
regex = 'AKIA[0-9A-Z]{16}'
keywords = ["AKIA"]
entropy_min = 3.0
"#,
        )
        .unwrap();
        let ruleset = config.compile().unwrap();
        let matching: Vec<_> = ruleset
            .rules
            .iter()
            .filter(|r| r.id == "aws-access-key")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].description, "Tightened AWS rule");
        assert_eq!(matching[0].entropy_min, Some(3.0));
    }

    #[test]
    fn test_disabled_builtin_rule() {
        let config = Config::from_toml(
            r#"
[extend]
disabled_rules = ["github-pat"]
"#,
        )
        .unwrap();
        let ruleset = config.compile().unwrap();
        assert!(!ruleset.rules.iter().any(|r| r.id == "github-pat"));
        assert!(ruleset.rules.iter().any(|r| r.id == "aws-access-key"));
    }

    #[test]
    fn test_no_defaults_when_extension_off() {
        let config = Config::from_toml(
            r#"
[extend]
use_default = false

[[rules]]
id = "only-rule"
regex = 'x'
"#,
        )
        .unwrap();
        let ruleset = config.compile().unwrap();
        assert_eq!(ruleset.rules.len(), 1);
        assert_eq!(ruleset.rules[0].id, "only-rule");
    }

    #[test]
    fn test_load_from_path_traverses_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILENAME)).unwrap();
        writeln!(
            file,
            r#"title = "project config"

[[allowlists]]
stopwords = ["example"]
"#
        )
        .unwrap();

        let config = Config::load_from_path(&nested).unwrap();
        assert_eq!(config.title.as_deref(), Some("project config"));
        assert_eq!(config.allowlists.len(), 1);
    }

    #[test]
    fn test_load_from_path_no_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path()).unwrap();
        assert!(config.rules.is_empty());
        assert!(config.extend.use_default);
    }
}
