//! Human-facing links to license files in upstream repositories.

use std::path::Path;

use crate::models::Module;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("module {0} has no repository URL")]
    NoRepository(String),
    #[error("unsupported repository host in {0}")]
    UnsupportedHost(String),
    #[error("license file {} is outside the module directory", .0.display())]
    OutsideModule(std::path::PathBuf),
}

/// Resolves a file inside a module to a browsable URL.
pub trait SourceLinker: Send + Sync {
    fn file_url(&self, module: &Module, relative: &Path) -> Result<String, LinkError>;
}

/// Builds links from the repository URL a module declares, without network
/// access. Files are pinned to the module version, or `HEAD` when unknown.
pub struct RepositoryLinker;

impl SourceLinker for RepositoryLinker {
    fn file_url(&self, module: &Module, relative: &Path) -> Result<String, LinkError> {
        let repo = module
            .repository
            .as_deref()
            .ok_or_else(|| LinkError::NoRepository(module.name.clone()))?;
        let base = repo
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .replacen("http://", "https://", 1);

        let git_ref = if module.version.is_empty() {
            "HEAD"
        } else {
            module.version.as_str()
        };
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let host = base
            .strip_prefix("https://")
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();
        match host {
            "github.com" | "gitlab.com" => Ok(format!("{base}/blob/{git_ref}/{path}")),
            "bitbucket.org" => Ok(format!("{base}/src/{git_ref}/{path}")),
            _ => Err(LinkError::UnsupportedHost(repo.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn module(repository: Option<&str>, version: &str) -> Module {
        Module {
            name: "trillian".to_string(),
            dir: PathBuf::from("/src/trillian"),
            version: version.to_string(),
            repository: repository.map(str::to_string),
        }
    }

    #[test]
    fn test_github() {
        let m = module(Some("https://github.com/google/trillian"), "v1.2.3");
        assert_eq!(
            RepositoryLinker.file_url(&m, Path::new("foo/README.md")).unwrap(),
            "https://github.com/google/trillian/blob/v1.2.3/foo/README.md"
        );
    }

    #[test]
    fn test_bitbucket() {
        let m = module(Some("https://bitbucket.org/user/project"), "v1.2.3");
        assert_eq!(
            RepositoryLinker.file_url(&m, Path::new("foo/README.md")).unwrap(),
            "https://bitbucket.org/user/project/src/v1.2.3/foo/README.md"
        );
    }

    #[test]
    fn test_missing_version_uses_head() {
        let m = module(Some("https://github.com/google/trillian.git/"), "");
        assert_eq!(
            RepositoryLinker.file_url(&m, Path::new("LICENSE")).unwrap(),
            "https://github.com/google/trillian/blob/HEAD/LICENSE"
        );
    }

    #[test]
    fn test_errors() {
        let m = module(None, "1.0.0");
        assert!(matches!(
            RepositoryLinker.file_url(&m, Path::new("LICENSE")),
            Err(LinkError::NoRepository(_))
        ));
        let m = module(Some("https://example.com/user/project"), "1.0.0");
        assert!(matches!(
            RepositoryLinker.file_url(&m, Path::new("LICENSE")),
            Err(LinkError::UnsupportedHost(_))
        ));
    }
}
