use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    config::{Backend, Config},
    error::Result,
    files::{canonical, relative_path, walk_files},
    matcher::{DelegatedMatcher, NativeMatcher, PatternMatcher},
    parser::{parse_file, ParseError},
    resolver::{resolve, OwnershipRecord},
};

/// The outcome of an ownership run.
#[derive(Debug, Clone)]
pub struct Ownerships {
    /// The CODEOWNERS file that was read.
    pub codeowners_path: PathBuf,
    /// Lines of that file that were skipped because they failed to parse.
    pub parse_errors: Vec<ParseError>,
    pub records: Vec<OwnershipRecord>,
}

impl Ownerships {
    /// The records keyed by file path.
    pub fn into_map(self) -> BTreeMap<String, OwnershipRecord> {
        self.records
            .into_iter()
            .map(|record| (record.file.clone(), record))
            .collect()
    }
}

/// Resolve the owner of every file in scope, using the backend `config`
/// selects.
pub fn ownerships(config: &Config) -> Result<Ownerships> {
    let codeowners_path = config.codeowners_path()?;
    let parsed = parse_file(&codeowners_path)?;
    debug!(
        path = %codeowners_path.display(),
        rules = parsed.rules.effective_rules().count(),
        backend = ?config.backend,
        "resolving ownership"
    );

    let matcher: Box<dyn PatternMatcher> = match config.backend {
        Backend::Delegated => Box::new(DelegatedMatcher::new(&config.repo_root)),
        Backend::Native => Box::new(NativeMatcher::new(walk_files(
            &config.repo_root,
            &config.scopes,
            &config.ignore_files,
        )?)),
    };
    let mut records = resolve(&parsed.rules, &matcher)?;

    // git reports on the whole index, so scope its results afterwards.
    if config.backend == Backend::Delegated && !config.scopes.is_empty() {
        let prefixes = scope_prefixes(&config.repo_root, &config.scopes);
        records.retain(|record| in_scope(&record.file, &prefixes));
    }

    Ok(Ownerships {
        codeowners_path,
        parse_errors: parsed.errors,
        records,
    })
}

/// Like [`ownerships`], keyed by file path.
pub fn ownership_map(config: &Config) -> Result<BTreeMap<String, OwnershipRecord>> {
    Ok(ownerships(config)?.into_map())
}

// Repository-relative prefixes for each scope. An empty prefix covers the
// whole repository.
fn scope_prefixes(repo_root: &Path, scopes: &[PathBuf]) -> Vec<String> {
    let root = canonical(repo_root);
    scopes
        .iter()
        .filter_map(|scope| {
            let scope = canonical(&repo_root.join(scope));
            if scope == root {
                Some(String::new())
            } else {
                relative_path(&root, &scope)
            }
        })
        .collect()
}

fn in_scope(file: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        prefix.is_empty()
            || file == prefix
            || file
                .strip_prefix(prefix.as_str())
                .map_or(false, |rest| rest.starts_with('/'))
    })
}
