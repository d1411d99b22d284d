//! Backends that decide which CODEOWNERS rules match which files.

mod delegated;
mod native;

pub use self::delegated::{decode_lossy, parse_check_ignore_output, CheckIgnoreRecord, DelegatedMatcher};
pub use self::native::NativeMatcher;

use crate::{error::Result, ruleset::RuleTable};

/// The rules a backend found matching one file, by line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    pub file: String,
    pub lines: Vec<usize>,
}

impl FileMatch {
    pub fn new(file: impl Into<String>, lines: Vec<usize>) -> Self {
        Self {
            file: file.into(),
            lines,
        }
    }

    pub fn unmatched(file: impl Into<String>) -> Self {
        Self::new(file, Vec::new())
    }
}

/// Evaluates the effective rules of a [`RuleTable`] against a file set.
///
/// Implementations return exactly one [`FileMatch`] per file, in file-set
/// order. A backend may report every matching rule, or only the one it
/// already picked as the winner; the resolver takes the last-declared line
/// either way.
pub trait PatternMatcher {
    fn match_files(&self, rules: &RuleTable) -> Result<Vec<FileMatch>>;
}

impl<M: PatternMatcher + ?Sized> PatternMatcher for &M {
    fn match_files(&self, rules: &RuleTable) -> Result<Vec<FileMatch>> {
        (**self).match_files(rules)
    }
}

impl<M: PatternMatcher + ?Sized> PatternMatcher for Box<M> {
    fn match_files(&self, rules: &RuleTable) -> Result<Vec<FileMatch>> {
        (**self).match_files(rules)
    }
}
