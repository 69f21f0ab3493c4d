//! Built-in base catalogue.
//!
//! A deliberately small set; the full catalogue ships separately and is
//! merged over these via the `[extend]` config table, keyed by rule id.

use crate::config::{AllowlistSpec, RuleSpec};

/// Rule specs compiled into every engine unless `extend.use_default`
/// is turned off.
#[must_use]
pub fn builtin_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            id: "aws-access-key".to_owned(),
            description: "AWS Access Key".to_owned(),
            regex: r"AKIA[0-9A-Z]{16}".to_owned(),
            keywords: vec!["AKIA".to_owned()],
            tags: vec!["key".to_owned(), "AWS".to_owned()],
            ..RuleSpec::default()
        },
        RuleSpec {
            id: "github-pat".to_owned(),
            description: "GitHub Personal Access Token".to_owned(),
            regex: r"ghp_[0-9a-zA-Z]{36}".to_owned(),
            keywords: vec!["ghp_".to_owned()],
            tags: vec!["key".to_owned(), "GitHub".to_owned()],
            ..RuleSpec::default()
        },
        RuleSpec {
            id: "pypi-upload-token".to_owned(),
            description: "PyPI upload token".to_owned(),
            regex: r"pypi-AgEIcHlwaS5vcmc[A-Za-z0-9\-_]{50,1000}".to_owned(),
            keywords: vec!["pypi-AgEIcHlwaS5vcmc".to_owned()],
            tags: vec!["key".to_owned(), "pypi".to_owned()],
            ..RuleSpec::default()
        },
        RuleSpec {
            id: "private-key".to_owned(),
            description: "Private Key".to_owned(),
            regex: r"(?i)-----BEGIN[ A-Z0-9_-]{0,100}PRIVATE KEY-----".to_owned(),
            keywords: vec!["-----BEGIN".to_owned()],
            tags: vec!["key".to_owned(), "private".to_owned()],
            allowlists: vec![AllowlistSpec {
                description: "placeholder keys in documentation".to_owned(),
                regex_target: "line".to_owned(),
                regexes: vec![r"EXAMPLE KEY".to_owned()],
                ..AllowlistSpec::default()
            }],
            ..RuleSpec::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_specs_compile() {
        for spec in builtin_specs() {
            assert!(
                regex::Regex::new(&spec.regex).is_ok(),
                "builtin {} has an invalid pattern",
                spec.id
            );
        }
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let specs = builtin_specs();
        let mut ids: Vec<&str> = specs.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), specs.len());
    }
}
