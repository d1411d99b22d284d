//! File enumeration for the native backend, which has no git index to ask.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    patternset::{Builder, Matcher},
};

/// List every non-directory path under `scopes` (the whole of `root` when
/// empty), as sorted `/`-separated paths relative to `root`. `.git`
/// directories are skipped, as is anything matched by a pattern in one of the
/// `ignore_files`.
///
/// Ignore files use gitignore syntax, evaluated relative to `root`. Negated
/// (`!`) patterns aren't supported and are skipped.
pub fn walk_files(root: &Path, scopes: &[PathBuf], ignore_files: &[PathBuf]) -> Result<Vec<String>> {
    let ignored = load_ignore_files(ignore_files)?;

    let root = &canonical(root);
    let default_scope = [root.clone()];
    let scopes = if scopes.is_empty() {
        &default_scope[..]
    } else {
        scopes
    };

    let mut files = Vec::new();
    for scope in scopes {
        let scope = canonical(&root.join(scope));
        let entries = WalkDir::new(&scope)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                // The scope itself must be readable.
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }

            let Some(path) = relative_path(root, entry.path()) else {
                warn!(path = %entry.path().display(), "skipping path outside the repository root");
                continue;
            };
            if ignored.as_ref().map_or(false, |m| m.is_match(&path)) {
                continue;
            }
            files.push(path);
        }
    }

    files.sort_unstable();
    files.dedup();
    debug!(files = files.len(), "enumerated files");
    Ok(files)
}

/// `path` relative to `root`, with `/` separators. `None` when `path` isn't
/// under `root` or is `root` itself.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// `path` with symlinks resolved, or unchanged when that fails.
pub(crate) fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn load_ignore_files(paths: &[PathBuf]) -> Result<Option<Matcher>> {
    if paths.is_empty() {
        return Ok(None);
    }

    let mut builder = Builder::new();
    for path in paths {
        let source = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        for (idx, line) in source.lines().enumerate() {
            let pattern = line.trim();
            if pattern.is_empty() || pattern.starts_with('#') {
                continue;
            }
            if pattern.starts_with('!') {
                warn!(
                    file = %path.display(),
                    line = idx + 1,
                    "negated ignore patterns are not supported; skipping"
                );
                continue;
            }
            builder.add(pattern);
        }
    }
    Ok(Some(builder.build()))
}
