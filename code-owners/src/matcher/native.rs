use std::collections::HashSet;

use tracing::debug;

use super::{FileMatch, PatternMatcher};
use crate::{error::Result, ruleset::RuleSet, ruleset::RuleTable};

/// Matches rules in-process against an explicit list of files. Needs no git
/// and no working tree; the paths don't even have to exist.
#[derive(Debug, Clone)]
pub struct NativeMatcher {
    files: Vec<String>,
}

impl NativeMatcher {
    /// Create a matcher over `files`, which are `/`-separated paths relative
    /// to the directory holding the CODEOWNERS scope. Duplicates are dropped,
    /// keeping the first occurrence.
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let files = files
            .into_iter()
            .map(Into::into)
            .filter(|file: &String| seen.insert(file.clone()))
            .collect();
        Self { files }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }
}

impl PatternMatcher for NativeMatcher {
    fn match_files(&self, rules: &RuleTable) -> Result<Vec<FileMatch>> {
        let ruleset = RuleSet::new(rules.clone());
        let mut matches = ruleset.matching_lines_for_paths(&self.files);
        debug!(
            files = self.files.len(),
            matched = matches.len(),
            "matched files natively"
        );

        Ok(self
            .files
            .iter()
            .map(|file| {
                let mut lines = matches.remove(file).unwrap_or_default();
                lines.sort_unstable();
                lines.dedup();
                FileMatch::new(file.as_str(), lines)
            })
            .collect())
    }
}
