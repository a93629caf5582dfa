//! Allow/deny policy over license identifiers.

use std::str::FromStr;

use regex::Regex;

use crate::models::{LicenseResult, LicenseType};

/// Whether the configured patterns list what is permitted or what is forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    Deny,
}

impl FromStr for Action {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" | "permit" => Ok(Action::Allow),
            "deny" | "forbid" => Ok(Action::Deny),
            _ => Err(RuleError::BadAction(s.to_string())),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Allow => write!(f, "Allow"),
            Action::Deny => write!(f, "Deny"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("bad action given: {0:?}")]
    BadAction(String),
    #[error("bad rule ({pattern}): {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("bad ignore pattern ({pattern}): {source}")]
    BadIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled policy.
#[derive(Debug, Clone)]
pub struct Rules {
    action: Action,
    patterns: Vec<Regex>,
    ignore: Vec<Regex>,
}

/// License types a type policy rejects when none are configured.
pub const DEFAULT_EXCLUDED_TYPES: &[LicenseType] = &[LicenseType::Forbidden];

/// A policy over license categories rather than names: any library with a
/// finding of an excluded type fails.
#[derive(Debug, Clone)]
pub struct TypeRules {
    excluded: Vec<LicenseType>,
    ignore: Vec<Regex>,
}

/// The policy `check` enforces: name patterns when configured, else types.
#[derive(Debug, Clone)]
pub enum Policy {
    Names(Rules),
    Types(TypeRules),
}

/// Outcome of [`Rules::evaluate`]. Every list preserves input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<'a> {
    pub passed: bool,
    /// Records that fail the policy: `mismatched` under allow, `matched` under deny.
    pub offending: Vec<&'a LicenseResult>,
    pub matched: Vec<&'a LicenseResult>,
    pub mismatched: Vec<&'a LicenseResult>,
    pub ignored: Vec<&'a LicenseResult>,
}

impl Rules {
    pub fn new<P, I>(action: Action, patterns: &[P], ignore: &[I]) -> Result<Self, RuleError>
    where
        P: AsRef<str>,
        I: AsRef<str>,
    {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| RuleError::BadPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ignore = compile_ignore(ignore)?;

        Ok(Rules {
            action,
            patterns,
            ignore,
        })
    }

    /// Build from an action keyword (`allow`/`permit`, `deny`/`forbid`).
    pub fn from_keyword<P, I>(keyword: &str, patterns: &[P], ignore: &[I]) -> Result<Self, RuleError>
    where
        P: AsRef<str>,
        I: AsRef<str>,
    {
        Self::new(keyword.parse()?, patterns, ignore)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    fn matches(&self, result: &LicenseResult) -> bool {
        let license = result.license();
        self.patterns.iter().any(|re| re.is_match(&license))
    }

    /// Partition `results` by whether their license matches any pattern and
    /// derive the verdict for this policy's action.
    pub fn evaluate<'a>(&self, results: &'a [LicenseResult]) -> Evaluation<'a> {
        let (matched, mismatched, ignored) = partition(results, &self.ignore, |r| self.matches(r));

        let offending = match self.action {
            Action::Allow => mismatched.clone(),
            Action::Deny => matched.clone(),
        };

        Evaluation {
            passed: offending.is_empty(),
            offending,
            matched,
            mismatched,
            ignored,
        }
    }
}

fn compile_ignore<I: AsRef<str>>(ignore: &[I]) -> Result<Vec<Regex>, RuleError> {
    ignore
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|source| RuleError::BadIgnorePattern {
                pattern: p.as_ref().to_string(),
                source,
            })
        })
        .collect()
}

fn partition<'a>(
    results: &'a [LicenseResult],
    ignore: &[Regex],
    matches: impl Fn(&LicenseResult) -> bool,
) -> (Vec<&'a LicenseResult>, Vec<&'a LicenseResult>, Vec<&'a LicenseResult>) {
    let mut matched = Vec::new();
    let mut mismatched = Vec::new();
    let mut ignored = Vec::new();

    for result in results {
        if ignore.iter().any(|re| re.is_match(&result.library)) {
            tracing::debug!(library = %result.library, "ignored by policy");
            ignored.push(result);
        } else if matches(result) {
            matched.push(result);
        } else {
            mismatched.push(result);
        }
    }
    (matched, mismatched, ignored)
}

impl std::fmt::Display for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<&str> = self.patterns().collect();
        write!(f, "{} [{}]", self.action(), patterns.join(", "))
    }
}

impl TypeRules {
    pub fn new<I: AsRef<str>>(excluded: &[LicenseType], ignore: &[I]) -> Result<Self, RuleError> {
        Ok(TypeRules {
            excluded: excluded.to_vec(),
            ignore: compile_ignore(ignore)?,
        })
    }

    /// `matched` holds libraries with at least one excluded type; those are
    /// the offending ones. Libraries without findings never match.
    pub fn evaluate<'a>(&self, results: &'a [LicenseResult]) -> Evaluation<'a> {
        let (matched, mismatched, ignored) = partition(results, &self.ignore, |r| {
            r.findings
                .iter()
                .any(|f| self.excluded.contains(&f.license_type))
        });
        Evaluation {
            passed: matched.is_empty(),
            offending: matched.clone(),
            matched,
            mismatched,
            ignored,
        }
    }
}

impl std::fmt::Display for TypeRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<String> = self.excluded.iter().map(ToString::to_string).collect();
        write!(f, "Exclude types [{}]", types.join(", "))
    }
}

impl Policy {
    pub fn evaluate<'a>(&self, results: &'a [LicenseResult]) -> Evaluation<'a> {
        match self {
            Policy::Names(rules) => rules.evaluate(results),
            Policy::Types(rules) => rules.evaluate(results),
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Names(rules) => write!(f, "{rules}"),
            Policy::Types(rules) => write!(f, "{rules}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LicenseFinding, LicenseType};

    const NONE: &[&str] = &[];

    fn result(library: &str, license: &str) -> LicenseResult {
        LicenseResult {
            module: library.to_string(),
            library: library.to_string(),
            version: String::new(),
            license_path: None,
            url: None,
            findings: vec![LicenseFinding {
                name: license.to_string(),
                license_type: LicenseType::Notice,
                confidence: 1.0,
            }],
            errors: Vec::new(),
        }
    }

    fn libs(evaluation: &[&LicenseResult]) -> Vec<String> {
        evaluation.iter().map(|r| r.library.clone()).collect()
    }

    #[test]
    fn test_allow_single_match() {
        let rules = Rules::new(Action::Allow, &["MIT-0"], NONE).unwrap();
        let results = vec![result("lib1", "MIT-0")];
        let eval = rules.evaluate(&results);
        assert!(eval.passed);
        assert!(eval.offending.is_empty());
    }

    #[test]
    fn test_allow_fails_on_unlisted_license() {
        let rules = Rules::new(Action::Allow, &["MIT-0"], NONE).unwrap();
        let results = vec![result("lib1", "MIT-0"), result("lib2", "BSD")];
        let eval = rules.evaluate(&results);
        assert!(!eval.passed);
        assert_eq!(libs(&eval.offending), vec!["lib2"]);
        assert_eq!(eval.offending[0].license(), "BSD");
    }

    #[test]
    fn test_allow_with_ignore_passes() {
        let rules = Rules::new(Action::Allow, &["MIT-0"], &["lib2"]).unwrap();
        let results = vec![result("lib1", "MIT-0"), result("lib2", "BSD")];
        let eval = rules.evaluate(&results);
        assert!(eval.passed);
        assert!(eval.offending.is_empty());
        assert_eq!(libs(&eval.ignored), vec!["lib2"]);
    }

    #[test]
    fn test_multiple_allow_patterns() {
        let rules = Rules::new(Action::Allow, &["MIT-0", "BSD.*"], &["lib3"]).unwrap();
        let results = vec![
            result("lib1", "MIT-0"),
            result("lib2", "BSD"),
            result("lib3", "WTFPL"),
        ];
        assert!(rules.evaluate(&results).passed);
    }

    #[test]
    fn test_deny_fails_on_match() {
        let rules = Rules::new(Action::Deny, &["MIT.*"], NONE).unwrap();
        let results = vec![result("lib1", "MIT-0"), result("lib2", "BSD")];
        let eval = rules.evaluate(&results);
        assert!(!eval.passed);
        assert_eq!(libs(&eval.offending), vec!["lib1"]);
        assert_eq!(libs(&eval.mismatched), vec!["lib2"]);
    }

    #[test]
    fn test_deny_passes_without_match() {
        let rules = Rules::new(Action::Deny, &["GPL"], NONE).unwrap();
        let results = vec![result("lib1", "MIT"), result("lib2", "Apache-2.0")];
        assert!(rules.evaluate(&results).passed);
    }

    #[test]
    fn test_evaluation_preserves_input_order() {
        let rules = Rules::new(Action::Allow, &["^MIT$"], NONE).unwrap();
        let results = vec![
            result("c", "GPL-3.0"),
            result("a", "MIT"),
            result("b", "BSD-3-Clause"),
        ];
        let eval = rules.evaluate(&results);
        assert_eq!(libs(&eval.offending), vec!["c", "b"]);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let rules = Rules::new(Action::Deny, &["GPL.*", "AGPL"], &["internal"]).unwrap();
        let results = vec![
            result("x", "GPL-2.0"),
            result("internal", "AGPL-3.0"),
            result("y", "MIT"),
        ];
        assert_eq!(rules.evaluate(&results), rules.evaluate(&results));
    }

    #[test]
    fn test_no_findings_matches_empty_license() {
        let mut r = result("nolicense", "x");
        r.findings.clear();
        let results = vec![r];
        let rules = Rules::new(Action::Allow, &["MIT"], NONE).unwrap();
        assert!(!rules.evaluate(&results).passed);
    }

    #[test]
    fn test_bad_action_keyword() {
        let err = Rules::from_keyword("Unknown", &["MIT"], NONE).unwrap_err();
        assert!(matches!(err, RuleError::BadAction(_)));
        assert!(Rules::from_keyword("permit", &["MIT"], NONE).is_ok());
        assert_eq!(
            Rules::from_keyword("FORBID", &["MIT"], NONE).unwrap().action(),
            Action::Deny
        );
    }

    #[test]
    fn test_bad_pattern_names_the_pattern() {
        let err = Rules::new(Action::Allow, &["MIT", "(unclosed"], NONE).unwrap_err();
        assert!(matches!(err, RuleError::BadPattern { .. }));
        assert!(err.to_string().contains("(unclosed"));

        let err = Rules::new(Action::Deny, &["MIT"], &["[z-a]"]).unwrap_err();
        assert!(matches!(err, RuleError::BadIgnorePattern { .. }));
        assert!(err.to_string().contains("[z-a]"));
    }

    fn typed(library: &str, license: &str, ty: LicenseType) -> LicenseResult {
        let mut r = result(library, license);
        r.findings[0].license_type = ty;
        r
    }

    #[test]
    fn test_type_rules_reject_forbidden_by_default() {
        let rules = TypeRules::new(DEFAULT_EXCLUDED_TYPES, NONE).unwrap();
        let results = vec![
            typed("ok", "MIT", LicenseType::Notice),
            typed("bad", "AGPL-3.0", LicenseType::Forbidden),
            typed("gpl", "GPL-2.0", LicenseType::Restricted),
        ];
        let eval = rules.evaluate(&results);
        assert!(!eval.passed);
        assert_eq!(libs(&eval.offending), vec!["bad"]);
        assert_eq!(libs(&eval.mismatched), vec!["ok", "gpl"]);
    }

    #[test]
    fn test_type_rules_with_several_types_and_ignore() {
        let rules = TypeRules::new(
            &[LicenseType::Restricted, LicenseType::Reciprocal],
            &["^vendored-"],
        )
        .unwrap();
        let mut multi = typed("multi", "MIT", LicenseType::Notice);
        multi.findings.push(LicenseFinding {
            name: "MPL-2.0".to_string(),
            license_type: LicenseType::Reciprocal,
            confidence: 0.9,
        });
        let results = vec![
            multi,
            typed("vendored-gpl", "GPL-3.0", LicenseType::Restricted),
            typed("plain", "ISC", LicenseType::Notice),
        ];
        let eval = rules.evaluate(&results);
        assert_eq!(libs(&eval.offending), vec!["multi"]);
        assert_eq!(libs(&eval.ignored), vec!["vendored-gpl"]);
    }

    #[test]
    fn test_type_rules_skip_results_without_findings() {
        let mut r = typed("nolicense", "x", LicenseType::Forbidden);
        r.findings.clear();
        let rules = TypeRules::new(DEFAULT_EXCLUDED_TYPES, NONE).unwrap();
        assert!(rules.evaluate(&[r]).passed);
    }

    #[test]
    fn test_policy_display() {
        let names = Policy::Names(Rules::new(Action::Deny, &["GPL.*", "AGPL"], NONE).unwrap());
        assert_eq!(names.to_string(), "Deny [GPL.*, AGPL]");
        let types = Policy::Types(
            TypeRules::new(&[LicenseType::Forbidden, LicenseType::Restricted], NONE).unwrap(),
        );
        assert_eq!(types.to_string(), "Exclude types [forbidden, restricted]");
    }
}
