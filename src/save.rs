//! Copy what each library's license requires to be redistributed.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::license::restrictiveness::{restrictiveness, Restrictiveness};
use crate::models::{LicenseResult, LicenseType};

const NOTICE_PATTERN: &str = r"^NOTICE(\.(txt|md))?$";

/// What [`save`] did for one library.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub library: String,
    pub restrictiveness: Restrictiveness,
    /// Where the files went, under the save path.
    pub dir: PathBuf,
}

/// Save licenses, notices and (for copyleft) full sources under `save_path`.
///
/// Each library gets its own directory named after it; a library listed at
/// several versions gets `<library>-<version>` instead so the copies never
/// mix. `save_path` must not exist yet. Libraries whose obligations cannot be
/// met (unknown, forbidden, or no license at all) are collected and reported
/// together once everything else has been copied.
pub fn save(results: &[LicenseResult], save_path: &Path) -> Result<Vec<Saved>> {
    if save_path.exists() {
        bail!("{} already exists", save_path.display());
    }

    let notice_re = Regex::new(NOTICE_PATTERN)?;
    let mut saved = Vec::new();
    let mut bad: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for result in results {
        *occurrences.entry(result.library.as_str()).or_insert(0) += 1;
    }

    for result in results {
        let level = restrictiveness(&result.license_types());
        let lib_dir = if occurrences[result.library.as_str()] > 1 {
            save_path.join(format!("{}-{}", result.library, result.version))
        } else {
            save_path.join(&result.library)
        };

        match (level, result.license_path.as_deref()) {
            (Restrictiveness::ShareCode, Some(license)) => {
                let src = license.parent().unwrap_or(license);
                copy_tree(src, &lib_dir)
                    .with_context(|| format!("failed to copy sources of {}", result.library))?;
            }
            (Restrictiveness::ShareLicense, Some(license)) => {
                copy_notices(license, &lib_dir, &notice_re)
                    .with_context(|| format!("failed to copy notices of {}", result.library))?;
            }
            _ => {
                if result.findings.is_empty() {
                    bad.entry(LicenseType::Unknown.to_string())
                        .or_default()
                        .push(result.library.clone());
                }
                for finding in &result.findings {
                    if matches!(finding.license_type, LicenseType::Unknown | LicenseType::Forbidden) {
                        bad.entry(finding.license_type.to_string())
                            .or_default()
                            .push(result.library.clone());
                    }
                }
                continue;
            }
        }

        tracing::debug!(library = %result.library, %level, "saved");
        saved.push(Saved {
            library: result.library.clone(),
            restrictiveness: level,
            dir: lib_dir,
        });
    }

    if !bad.is_empty() {
        let summary = bad
            .iter()
            .map(|(ty, libs)| format!("{ty}: [{}]", libs.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        bail!("one or more libraries have an incompatible/unknown license: {summary}");
    }
    Ok(saved)
}

/// Recursively copy `src` into `dest`, leaving out any `.git` directory.
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("copying {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Copy the license file plus any `NOTICE` files next to it.
fn copy_notices(license: &Path, dest: &Path, notice_re: &Regex) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let name = license
        .file_name()
        .context("license path has no file name")?;
    std::fs::copy(license, dest.join(name))?;

    let Some(dir) = license.parent() else {
        return Ok(());
    };
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if entry.file_type()?.is_file() && notice_re.is_match(&file_name.to_string_lossy()) {
            std::fs::copy(entry.path(), dest.join(&file_name))?;
        }
    }
    Ok(())
}
