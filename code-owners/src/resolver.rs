use std::{borrow::Cow, collections::BTreeMap};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::{
    error::Result,
    matcher::{FileMatch, PatternMatcher},
    ruleset::{Owners, RuleTable},
};

/// The owner label given to files no rule matches.
pub const UNOWNED: &str = "UNOWNED";

/// Who owns a file, and which CODEOWNERS line decided it. `owners`, `line`
/// and `pattern` are all `None` for unowned files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipRecord {
    pub file: String,
    #[serde(rename = "owner", serialize_with = "serialize_owner")]
    pub owners: Option<Owners>,
    pub line: Option<usize>,
    pub pattern: Option<String>,
}

impl OwnershipRecord {
    pub fn unowned(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            owners: None,
            line: None,
            pattern: None,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owners.is_some()
    }

    /// The space-joined owners, or [`UNOWNED`].
    pub fn owner(&self) -> Cow<'_, str> {
        match &self.owners {
            Some(owners) => Cow::Owned(owners.to_string()),
            None => Cow::Borrowed(UNOWNED),
        }
    }
}

fn serialize_owner<S: Serializer>(owners: &Option<Owners>, serializer: S) -> Result<S::Ok, S::Error> {
    match owners {
        Some(owners) => owners.serialize(serializer),
        None => serializer.serialize_str(UNOWNED),
    }
}

/// Resolve the owner of every file `matcher` covers. Records come back in the
/// matcher's file order, one per file.
///
/// Whenever several rules match a file, the one declared last wins.
pub fn resolve(rules: &RuleTable, matcher: &impl PatternMatcher) -> Result<Vec<OwnershipRecord>> {
    let matches = matcher.match_files(rules)?;
    let records = matches
        .into_iter()
        .map(|file_match| resolve_file(rules, file_match))
        .collect::<Vec<_>>();

    debug!(
        files = records.len(),
        unowned = records.iter().filter(|r| !r.is_owned()).count(),
        "resolved ownership"
    );
    Ok(records)
}

/// Like [`resolve`], keyed by file path.
pub fn resolve_map(
    rules: &RuleTable,
    matcher: &impl PatternMatcher,
) -> Result<BTreeMap<String, OwnershipRecord>> {
    Ok(resolve(rules, matcher)?
        .into_iter()
        .map(|record| (record.file.clone(), record))
        .collect())
}

fn resolve_file(rules: &RuleTable, file_match: FileMatch) -> OwnershipRecord {
    let winner = file_match
        .lines
        .iter()
        .filter_map(|&line| rules.effective_rule(line))
        .max_by_key(|rule| rule.line);

    match winner {
        Some(rule) => OwnershipRecord {
            file: file_match.file,
            owners: Some(rule.owners.clone()),
            line: Some(rule.line),
            pattern: Some(rule.pattern.clone()),
        },
        None => OwnershipRecord::unowned(file_match.file),
    }
}
