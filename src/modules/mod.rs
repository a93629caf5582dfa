//! Enumeration of the dependency modules to scan.

use std::path::PathBuf;

use crate::models::Module;

pub mod cargo;

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("unable to list modules: {0}")]
    Command(String),
    #[error("unable to list modules: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse module metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("bad listing output on line {line}: {text:?}")]
    BadListing { line: usize, text: String },
}

/// Produces the modules of one project. Failure is fatal to the run.
pub trait ModuleLister {
    fn list_modules(&self) -> Result<Vec<Module>, ListError>;
}

/// Parse a plain module listing with one `<path> <dir> <version>` entry per line.
///
/// Blank lines and `#` comments are skipped; any other line must have exactly
/// three whitespace-separated fields.
pub fn parse_listing(text: &str) -> Result<Vec<Module>, ListError> {
    let mut modules = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [path, dir, version] = fields.as_slice() else {
            return Err(ListError::BadListing {
                line: idx + 1,
                text: line.to_string(),
            });
        };
        modules.push(Module {
            name: path.to_string(),
            dir: PathBuf::from(dir),
            version: version.to_string(),
            repository: None,
        });
    }
    Ok(modules)
}

/// Reads a listing in the [`parse_listing`] format from a file.
pub struct ListingFile {
    pub path: PathBuf,
}

impl ModuleLister for ListingFile {
    fn list_modules(&self) -> Result<Vec<Module>, ListError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_listing(&content)
    }
}
