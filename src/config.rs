use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::license::classifier::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::models::LicenseType;
use crate::rules::{Policy, Rules, TypeRules, DEFAULT_EXCLUDED_TYPES};

/// Root configuration structure, deserialized from `.license-bouncer.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// License patterns that are permitted. Mutually exclusive with `deny`.
    #[serde(default, alias = "permit")]
    pub allow: OneOrMany,
    /// License patterns that are forbidden. Mutually exclusive with `allow`.
    #[serde(default, alias = "forbid")]
    pub deny: OneOrMany,
    /// License types `check` rejects when no name patterns are given.
    /// Defaults to `["forbidden"]`.
    #[serde(default)]
    pub exclude_types: Vec<LicenseType>,
    /// Library name patterns excluded from policy evaluation.
    #[serde(default)]
    pub ignore_packages: OneOrMany,
    /// Minimum classifier confidence for a license to count.
    pub confidence_threshold: Option<f64>,
    /// Explicit upper bound for the license file search.
    pub root: Option<PathBuf>,
    /// Override of the license file name regex. Cargo projects want
    /// [`CARGO_LICENSE_FILE_PATTERN`](crate::locator::CARGO_LICENSE_FILE_PATTERN).
    pub license_file_pattern: Option<String>,
    /// Extra directory regexes the search never enters, on top of the
    /// vendor and Cargo cache defaults.
    #[serde(default)]
    pub stop_at: OneOrMany,
}

/// A TOML value given either as a single string or a list of strings.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(from = "OneOrManyRepr")]
pub struct OneOrMany(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrManyRepr {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrManyRepr> for OneOrMany {
    fn from(repr: OneOrManyRepr) -> Self {
        match repr {
            OneOrManyRepr::One(s) => OneOrMany(vec![s]),
            OneOrManyRepr::Many(v) => OneOrMany(v),
        }
    }
}

impl Config {
    pub fn threshold(&self) -> f64 {
        self.confidence_threshold.unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    /// Check cross-field constraints after loading and CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if !self.allow.0.is_empty() && !self.deny.0.is_empty() {
            bail!("'deny'/'forbid' and 'allow'/'permit' options are mutually exclusive");
        }
        let threshold = self.threshold();
        if !(0.0..=1.0).contains(&threshold) {
            bail!("confidence-threshold must be within [0, 1], got {threshold}");
        }
        if let Some(pattern) = &self.license_file_pattern {
            regex::Regex::new(pattern)
                .with_context(|| format!("bad license-file-pattern ({pattern})"))?;
        }
        for pattern in &self.stop_at.0 {
            regex::Regex::new(pattern).with_context(|| format!("bad stop-at pattern ({pattern})"))?;
        }
        Ok(())
    }

    /// Compile the configured policy. `None` when neither list is set.
    pub fn rules(&self) -> Result<Option<Rules>> {
        let (keyword, patterns) = if !self.allow.0.is_empty() {
            ("allow", &self.allow.0)
        } else if !self.deny.0.is_empty() {
            ("deny", &self.deny.0)
        } else {
            return Ok(None);
        };
        let rules = Rules::from_keyword(keyword, patterns.as_slice(), self.ignore_packages.0.as_slice())
            .context("could not parse rules")?;
        Ok(Some(rules))
    }

    /// The policy `check` enforces. Name patterns win; without them the
    /// excluded license types apply.
    pub fn policy(&self) -> Result<Policy> {
        if let Some(rules) = self.rules()? {
            return Ok(Policy::Names(rules));
        }
        let excluded = if self.exclude_types.is_empty() {
            DEFAULT_EXCLUDED_TYPES
        } else {
            self.exclude_types.as_slice()
        };
        let rules = TypeRules::new(excluded, self.ignore_packages.0.as_slice())
            .context("could not parse rules")?;
        Ok(Policy::Types(rules))
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.license-bouncer.toml`
/// 3. `<project_path>/.license-bouncer/config.toml`
/// 4. `~/.config/license-bouncer/config.toml`
/// 5. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let candidates = [
        Some(project_path.join(".license-bouncer.toml")),
        Some(project_path.join(".license-bouncer").join("config.toml")),
        dirs::home_dir().map(|home| {
            home.join(".config")
                .join("license-bouncer")
                .join("config.toml")
        }),
    ];

    for path in candidates.into_iter().flatten() {
        if path.exists() {
            return read_config(&path);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("unable to parse config: {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Action;
    use tempfile::TempDir;

    #[test]
    fn test_parse_lists_and_aliases() {
        let cfg: Config = toml::from_str(
            r#"
permit = ["MIT", "Apache-2.0"]
ignore-packages = "^internal/"
confidence-threshold = 0.9
"#,
        )
        .unwrap();
        assert_eq!(cfg.allow.0, vec!["MIT", "Apache-2.0"]);
        assert_eq!(cfg.ignore_packages.0, vec!["^internal/"]);
        assert_eq!(cfg.threshold(), 0.9);
        let rules = cfg.rules().unwrap().unwrap();
        assert_eq!(rules.action(), Action::Allow);
    }

    #[test]
    fn test_deny_single_string() {
        let cfg: Config = toml::from_str(r#"forbid = "GPL.*""#).unwrap();
        assert_eq!(cfg.deny.0, vec!["GPL.*"]);
        assert_eq!(cfg.rules().unwrap().unwrap().action(), Action::Deny);
    }

    #[test]
    fn test_allow_and_deny_are_exclusive() {
        let cfg: Config = toml::from_str("allow = [\"MIT\"]\ndeny = [\"GPL\"]").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let cfg: Config = toml::from_str("confidence-threshold = 1.5").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_pattern_surfaces() {
        let cfg: Config = toml::from_str(r#"allow = ["("]"#).unwrap();
        let err = cfg.rules().unwrap_err();
        assert!(format!("{err:#}").contains("bad rule (()"));
    }

    #[test]
    fn test_no_rules_configured() {
        assert!(Config::default().rules().unwrap().is_none());
        assert_eq!(Config::default().threshold(), DEFAULT_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_bad_stop_at_pattern() {
        let cfg: Config = toml::from_str(r#"stop-at = "[""#).unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("bad stop-at pattern"));
    }

    #[test]
    fn test_policy_defaults_to_forbidden_types() {
        let policy = Config::default().policy().unwrap();
        assert!(matches!(policy, Policy::Types(_)));
        assert_eq!(policy.to_string(), "Exclude types [forbidden]");
    }

    #[test]
    fn test_policy_exclude_types_from_file() {
        let cfg: Config = toml::from_str(r#"exclude-types = ["restricted", "reciprocal"]"#).unwrap();
        assert_eq!(
            cfg.exclude_types,
            vec![LicenseType::Restricted, LicenseType::Reciprocal]
        );
        assert_eq!(
            cfg.policy().unwrap().to_string(),
            "Exclude types [restricted, reciprocal]"
        );
        assert!(toml::from_str::<Config>(r#"exclude-types = ["sometimes"]"#).is_err());
    }

    #[test]
    fn test_policy_prefers_name_patterns() {
        let cfg: Config = toml::from_str("allow = \"MIT\"\nexclude-types = [\"notice\"]").unwrap();
        assert!(matches!(cfg.policy().unwrap(), Policy::Names(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("colour = true").is_err());
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".license-bouncer.toml"), "deny = \"AGPL\"").unwrap();
        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.deny.0, vec!["AGPL"]);
    }

    #[test]
    fn test_load_override_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("unable to read config"));
    }
}
