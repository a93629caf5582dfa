//! Per-module license discovery over a whole dependency set.

use std::path::PathBuf;

use crate::license::classifier::Classifier;
use crate::link::{LinkError, SourceLinker};
use crate::locator::Locator;
use crate::models::{LicenseResult, Module, ScanError, ScanErrorKind};

/// Receives progress notifications while modules are scanned.
pub trait Progress {
    fn start(&self, total: usize);
    fn advance(&self, module: &Module);
    fn finish(&self);
}

/// Strip everything up to and including the first `/vendor/` segment.
pub fn unvendor(import_path: &str) -> &str {
    match import_path.split_once("/vendor/") {
        Some((_, vendoree)) => vendoree,
        None => import_path,
    }
}

/// Locates and identifies the license of every module, isolating failures
/// per module.
pub struct Aggregator<'a> {
    classifier: &'a dyn Classifier,
    locator: Locator<'a>,
    root: Option<PathBuf>,
    linker: Option<&'a dyn SourceLinker>,
    progress: Option<&'a dyn Progress>,
}

impl<'a> Aggregator<'a> {
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Self {
            classifier,
            locator: Locator::new(classifier),
            root: None,
            linker: None,
            progress: None,
        }
    }

    pub fn with_locator(mut self, locator: Locator<'a>) -> Self {
        self.locator = locator;
        self
    }

    /// Search boundary shared by all modules; defaults to each module's dir.
    pub fn with_root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_linker(mut self, linker: &'a dyn SourceLinker) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// One result per module, in input order. Never fails as a whole.
    pub fn aggregate(&self, modules: &[Module]) -> Vec<LicenseResult> {
        if let Some(p) = self.progress {
            p.start(modules.len());
        }

        let results = modules
            .iter()
            .map(|module| {
                if let Some(p) = self.progress {
                    p.advance(module);
                }
                self.scan_module(module)
            })
            .collect();

        if let Some(p) = self.progress {
            p.finish();
        }
        results
    }

    fn scan_module(&self, module: &Module) -> LicenseResult {
        let mut result = LicenseResult::new(module);
        let root = self.root.as_deref().unwrap_or(&module.dir);

        let license_path = match self.locator.locate(&module.dir, root) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(module = %module.name, error = %e, "license not found");
                result
                    .errors
                    .push(ScanError::new(&module.name, ScanErrorKind::Locate, e));
                return result;
            }
        };

        match self.classifier.identify(&license_path) {
            Ok(findings) => result.findings = findings,
            Err(e) => {
                tracing::warn!(module = %module.name, error = %e, "license not identified");
                result
                    .errors
                    .push(ScanError::new(&module.name, ScanErrorKind::Identify, e));
            }
        }

        if let Some(linker) = self.linker {
            let dir = std::fs::canonicalize(&module.dir).unwrap_or_else(|_| module.dir.clone());
            let url = license_path
                .strip_prefix(&dir)
                .map_err(|_| LinkError::OutsideModule(license_path.clone()))
                .and_then(|relative| linker.file_url(module, relative));
            match url {
                Ok(url) => result.url = Some(url),
                Err(e) => {
                    tracing::debug!(module = %module.name, error = %e, "no license URL");
                    result
                        .errors
                        .push(ScanError::new(&module.name, ScanErrorKind::Url, e));
                }
            }
        }

        tracing::debug!(module = %module.name, license = %result.license(), "scanned");
        result.license_path = Some(license_path);
        result
    }
}
