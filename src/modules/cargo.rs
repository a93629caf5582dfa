use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

use super::{ListError, ModuleLister};
use crate::models::Module;

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(default)]
    packages: Vec<MetadataPackage>,
    #[serde(default)]
    workspace_members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataPackage {
    id: String,
    name: String,
    version: String,
    manifest_path: PathBuf,
    repository: Option<String>,
}

/// Lists the dependencies of a Cargo project via `cargo metadata`.
pub struct CargoMetadataLister {
    project: PathBuf,
}

impl CargoMetadataLister {
    pub fn new(project: &Path) -> Self {
        Self {
            project: project.to_path_buf(),
        }
    }
}

impl ModuleLister for CargoMetadataLister {
    fn list_modules(&self) -> Result<Vec<Module>, ListError> {
        let manifest = self.project.join("Cargo.toml");
        tracing::debug!(manifest = %manifest.display(), "running cargo metadata");

        let output = Command::new("cargo")
            .arg("metadata")
            .arg("--format-version")
            .arg("1")
            .arg("--manifest-path")
            .arg(&manifest)
            .output()?;

        if !output.status.success() {
            return Err(ListError::Command(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_metadata(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Map `cargo metadata` output to modules, skipping workspace members.
pub fn parse_metadata(json: &str) -> Result<Vec<Module>, ListError> {
    let metadata: Metadata = serde_json::from_str(json)?;
    let members: HashSet<&str> = metadata.workspace_members.iter().map(String::as_str).collect();

    let mut modules: Vec<Module> = metadata
        .packages
        .iter()
        .filter(|p| !members.contains(p.id.as_str()))
        .map(|p| Module {
            name: p.name.clone(),
            dir: p
                .manifest_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            version: p.version.clone(),
            repository: p.repository.clone(),
        })
        .collect();

    modules.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let json = r#"{
  "packages": [
    {
      "name": "my-app",
      "version": "0.1.0",
      "id": "path+file:///work/my-app#0.1.0",
      "manifest_path": "/work/my-app/Cargo.toml",
      "repository": null
    },
    {
      "name": "tokio",
      "version": "1.25.0",
      "id": "registry+https://github.com/rust-lang/crates.io-index#tokio@1.25.0",
      "manifest_path": "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/tokio-1.25.0/Cargo.toml",
      "repository": "https://github.com/tokio-rs/tokio"
    },
    {
      "name": "serde",
      "version": "1.0.150",
      "id": "registry+https://github.com/rust-lang/crates.io-index#serde@1.0.150",
      "manifest_path": "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/serde-1.0.150/Cargo.toml"
    }
  ],
  "workspace_members": ["path+file:///work/my-app#0.1.0"],
  "version": 1
}"#;

        let modules = parse_metadata(json).unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "serde");
        assert_eq!(modules[0].repository, None);
        assert_eq!(modules[1].name, "tokio");
        assert_eq!(
            modules[1].dir,
            PathBuf::from("/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/tokio-1.25.0")
        );
        assert_eq!(modules[1].repository.as_deref(), Some("https://github.com/tokio-rs/tokio"));
    }

    #[test]
    fn test_parse_metadata_garbage() {
        assert!(matches!(parse_metadata("not json"), Err(ListError::Metadata(_))));
    }
}
