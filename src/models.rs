use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A resolved dependency as reported by a [`ModuleLister`](crate::modules::ModuleLister).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Import path / package name (e.g. `serde`, `github.com/foo/bar`).
    pub name: String,
    /// Directory holding the module's sources on disk.
    pub dir: PathBuf,
    /// Opaque, ecosystem-defined version string. May be empty.
    pub version: String,
    /// Upstream repository URL, when the lister knows it.
    pub repository: Option<String>,
}

/// Coarse category of a license's legal obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Notice,
    Permissive,
    Unencumbered,
    Reciprocal,
    Restricted,
    Unknown,
    /// Anything outside the categories above.
    Forbidden,
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseType::Notice => write!(f, "notice"),
            LicenseType::Permissive => write!(f, "permissive"),
            LicenseType::Unencumbered => write!(f, "unencumbered"),
            LicenseType::Reciprocal => write!(f, "reciprocal"),
            LicenseType::Restricted => write!(f, "restricted"),
            LicenseType::Unknown => write!(f, "unknown"),
            LicenseType::Forbidden => write!(f, "forbidden"),
        }
    }
}

/// One license detected in one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseFinding {
    /// SPDX-style identifier, e.g. `MIT`.
    pub name: String,
    pub license_type: LicenseType,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}

/// The per-dependency output of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseResult {
    /// Module identity as listed.
    pub module: String,
    /// Unvendored display name.
    pub library: String,
    pub version: String,
    /// `None` when no license file was found.
    pub license_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Empty when the classifier found nothing (or was never asked).
    pub findings: Vec<LicenseFinding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ScanError>,
}

impl LicenseResult {
    pub fn new(module: &Module) -> Self {
        LicenseResult {
            module: module.name.clone(),
            library: crate::scan::unvendor(&module.name).to_string(),
            version: module.version.clone(),
            license_path: None,
            url: None,
            findings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// The license identifier string that policy patterns are matched against.
    ///
    /// A single finding yields its name; several are joined with ` AND `
    /// because every detected license applies to the library.
    pub fn license(&self) -> String {
        self.findings
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn license_types(&self) -> Vec<LicenseType> {
        self.findings.iter().map(|f| f.license_type).collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Which step of license discovery failed for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanErrorKind {
    Locate,
    Identify,
    Url,
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanErrorKind::Locate => write!(f, "failed to find license"),
            ScanErrorKind::Identify => write!(f, "failed to identify license"),
            ScanErrorKind::Url => write!(f, "failed to locate license URL"),
        }
    }
}

/// One non-fatal failure attached to a [`LicenseResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{module}: {kind}: {message}")]
pub struct ScanError {
    pub module: String,
    pub kind: ScanErrorKind,
    pub message: String,
}

impl ScanError {
    pub fn new(module: &str, kind: ScanErrorKind, cause: impl std::fmt::Display) -> Self {
        ScanError {
            module: module.to_string(),
            kind,
            message: cause.to_string(),
        }
    }
}
