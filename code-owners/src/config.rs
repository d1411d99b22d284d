use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::debug;

use crate::error::{Error, Result};

/// Where CODEOWNERS files are looked for, relative to the repository root, in
/// order of preference.
pub const CODEOWNERS_LOCATIONS: &[&str] = &["CODEOWNERS", "docs/CODEOWNERS", ".github/CODEOWNERS"];

/// Which backend decides which rules match which files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// `git check-ignore` over every tracked file.
    #[default]
    Delegated,
    /// The in-process pattern set over the files found on disk.
    Native,
}

/// Everything an ownership run needs to know.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo_root: PathBuf,
    /// Explicit CODEOWNERS path. Discovered under `repo_root` when `None`.
    pub codeowners_file: Option<PathBuf>,
    pub backend: Backend,
    /// Directories (or files) to report on. Relative paths are taken
    /// relative to `repo_root`; empty means the whole repository.
    pub scopes: Vec<PathBuf>,
    /// Gitignore-style files whose matches the native backend skips.
    pub ignore_files: Vec<PathBuf>,
}

impl Config {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            codeowners_file: None,
            backend: Backend::default(),
            scopes: Vec::new(),
            ignore_files: Vec::new(),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_codeowners_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.codeowners_file = Some(path.into());
        self
    }

    /// The CODEOWNERS file this run reads: the explicit one if it exists,
    /// otherwise the first of [`CODEOWNERS_LOCATIONS`] present under the
    /// repository root.
    pub fn codeowners_path(&self) -> Result<PathBuf> {
        match &self.codeowners_file {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(Error::CodeownersNotFound {
                searched: path.clone(),
            }),
            None => find_codeowners_file(&self.repo_root).ok_or_else(|| Error::CodeownersNotFound {
                searched: self.repo_root.clone(),
            }),
        }
    }
}

/// The first of [`CODEOWNERS_LOCATIONS`] that exists under `repo_root`.
pub fn find_codeowners_file(repo_root: &Path) -> Option<PathBuf> {
    CODEOWNERS_LOCATIONS
        .iter()
        .map(|location| repo_root.join(location))
        .find(|path| path.is_file())
}

/// The top level of the git working tree containing `dir`.
pub fn find_repo_root(dir: &Path) -> Result<PathBuf> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .map_err(Error::GitSpawn)?;

    if !output.status.success() {
        return Err(Error::RepoRoot(
            String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        ));
    }

    let root = String::from_utf8_lossy(&output.stdout).trim_end_matches('\n').to_owned();
    if root.is_empty() {
        return Err(Error::RepoRoot(format!(
            "{} is not inside a working tree",
            dir.display()
        )));
    }
    debug!(root = %root, "found repository root");
    Ok(PathBuf::from(root))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        assert_eq!(find_codeowners_file(root), None);

        fs::create_dir_all(root.join(".github")).unwrap();
        fs::write(root.join(".github/CODEOWNERS"), "").unwrap();
        assert_eq!(find_codeowners_file(root), Some(root.join(".github/CODEOWNERS")));

        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/CODEOWNERS"), "").unwrap();
        assert_eq!(find_codeowners_file(root), Some(root.join("docs/CODEOWNERS")));

        fs::write(root.join("CODEOWNERS"), "").unwrap();
        assert_eq!(find_codeowners_file(root), Some(root.join("CODEOWNERS")));
    }

    #[test]
    fn test_codeowners_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        let err = config.codeowners_path().unwrap_err();
        assert!(matches!(err, Error::CodeownersNotFound { .. }));
        assert!(err.to_string().starts_with("CODEOWNERS file does not exist"));

        let explicit = dir.path().join("OWNERS");
        let config = config.with_codeowners_file(&explicit);
        assert!(config.codeowners_path().is_err());
        fs::write(&explicit, "* @a\n").unwrap();
        assert_eq!(config.codeowners_path().unwrap(), explicit);
    }

    #[test]
    fn test_default_backend_is_delegated() {
        assert_eq!(Config::new(".").backend, Backend::Delegated);
        assert_eq!(Config::new(".").with_backend(Backend::Native).backend, Backend::Native);
    }
}
