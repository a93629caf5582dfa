//! Upward search for the license file that governs a directory.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::license::classifier::Classifier;

/// File names that may carry a license: `LICENSE`, `LICENCE`, `COPYING`,
/// `NOTICE` or `README`, any case, optionally with a `.suffix`.
pub const LICENSE_FILE_PATTERN: &str = r"(?i)^(licen[sc]e|copying|notice|readme)(\..+)?$";

/// Like [`LICENSE_FILE_PATTERN`] but also accepting a `-` suffix, which
/// covers the `LICENSE-MIT` / `LICENSE-APACHE` pair most crates ship.
pub const CARGO_LICENSE_FILE_PATTERN: &str = r"(?i)^(licen[sc]e|copying|notice|readme)([.-].+)?$";

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("invalid argument: search directory is empty")]
    EmptyDir,
    #[error(
        "cannot find a known open source license for {} whose name matches regexp {pattern} and locates up until {}",
        start.display(),
        boundary.display()
    )]
    NotFound {
        start: PathBuf,
        pattern: String,
        boundary: PathBuf,
    },
    #[error("root dir {} should contain dir {}", root.display(), start.display())]
    OutsideRoot { start: PathBuf, root: PathBuf },
    #[error("failed to read directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Regexes for directories the search must never enter: any `vendor`
/// directory, plus the Cargo registry and git checkout roots under
/// `$CARGO_HOME` (defaults to `~/.cargo`).
pub fn default_stop_at() -> Vec<Regex> {
    let mut stop_at = Vec::new();
    if let Ok(re) = Regex::new(r".+/vendor/?$") {
        stop_at.push(re);
    }

    let cargo_home = std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".cargo")));
    if let Some(home) = cargo_home {
        let home = regex::escape(&home.to_string_lossy());
        for pattern in [
            format!("^{home}/registry/src/[^/]+/?$"),
            format!("^{home}/git/checkouts/[^/]+/?$"),
        ] {
            if let Ok(re) = Regex::new(&pattern) {
                stop_at.push(re);
            }
        }
    }
    stop_at
}

/// Finds license files by walking from a start directory towards a root.
///
/// A file qualifies when its name matches the pattern *and* the classifier
/// identifies at least one license in it.
pub struct Locator<'a> {
    classifier: &'a dyn Classifier,
    pattern: Regex,
    stop_at: Vec<Regex>,
}

impl<'a> Locator<'a> {
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Self {
            classifier,
            pattern: Regex::new(LICENSE_FILE_PATTERN).expect("static regex is valid"),
            stop_at: default_stop_at(),
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_stop_at(mut self, stop_at: Vec<Regex>) -> Self {
        self.stop_at = stop_at;
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// The closest qualifying license file at or above `start`, searching no
    /// higher than `root` (inclusive).
    pub fn locate(&self, start: &Path, root: &Path) -> Result<PathBuf, LocateError> {
        let mut found = self.search(start, root, true)?;
        Ok(found.remove(0))
    }

    /// Every qualifying license file between `start` and `root`, one per
    /// directory, closest first.
    pub fn locate_all(&self, start: &Path, root: &Path) -> Result<Vec<PathBuf>, LocateError> {
        self.search(start, root, false)
    }

    fn search(&self, start: &Path, root: &Path, first_only: bool) -> Result<Vec<PathBuf>, LocateError> {
        if start.as_os_str().is_empty() {
            return Err(LocateError::EmptyDir);
        }
        let start = canonical(start)?;
        let root = canonical(root).unwrap_or_else(|_| root.to_path_buf());
        if !start.starts_with(&root) {
            return Err(LocateError::OutsideRoot { start, root });
        }

        let mut found = Vec::new();
        let mut dir = start.clone();
        let mut boundary = dir.clone();
        loop {
            if self.is_stop_dir(&dir) {
                tracing::debug!(dir = %dir.display(), "reached stop directory");
                break;
            }
            boundary = dir.clone();

            if let Some(hit) = self.first_in(&dir)? {
                tracing::debug!(path = %hit.display(), "license file found");
                found.push(hit);
                if first_only {
                    break;
                }
            }

            if dir == root {
                break;
            }
            match dir.parent() {
                Some(parent) if parent != dir => dir = parent.to_path_buf(),
                _ => break,
            }
        }

        if found.is_empty() {
            return Err(LocateError::NotFound {
                start,
                pattern: self.pattern.to_string(),
                boundary,
            });
        }
        Ok(found)
    }

    /// First qualifying file in `dir`, by file name order.
    fn first_in(&self, dir: &Path) -> Result<Option<PathBuf>, LocateError> {
        let io_err = |source| LocateError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.pattern.is_match(&name) {
                names.push(name);
            }
        }
        names.sort();

        for name in names {
            let path = dir.join(&name);
            match self.classifier.identify(&path) {
                Ok(findings) if !findings.is_empty() => return Ok(Some(path)),
                Ok(_) => tracing::debug!(path = %path.display(), "no license in candidate"),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping candidate"),
            }
        }
        Ok(None)
    }

    fn is_stop_dir(&self, dir: &Path) -> bool {
        let s = dir.to_string_lossy();
        self.stop_at.iter().any(|re| re.is_match(&s))
    }
}

fn canonical(path: &Path) -> Result<PathBuf, LocateError> {
    std::fs::canonicalize(path).map_err(|source| LocateError::Io {
        path: path.to_path_buf(),
        source,
    })
}
