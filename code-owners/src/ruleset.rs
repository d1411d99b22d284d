use std::{collections::HashMap, fmt, ops::Deref};

use serde::{Serialize, Serializer};

use crate::patternset::{self, Matcher, TreeMatcher};

/// A single owner token from a CODEOWNERS rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    pub value: String,
    pub kind: OwnerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    User,
    Team,
    Email,
}

impl Owner {
    pub fn new(value: String, kind: OwnerKind) -> Self {
        Self { value, kind }
    }

    /// Whether `token` looks like an owner: it has an `@` with at least one
    /// character after it.
    pub fn is_owner_token(token: &str) -> bool {
        match token.find('@') {
            Some(at) => at + 1 < token.len() && !token.contains(char::is_whitespace),
            None => false,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOwner(String);

impl fmt::Display for InvalidOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid owner: {}", self.0)
    }
}

impl std::error::Error for InvalidOwner {}

impl TryFrom<String> for Owner {
    type Error = InvalidOwner;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !Owner::is_owner_token(&value) {
            return Err(InvalidOwner(value));
        }

        let kind = match value.strip_prefix('@') {
            Some(name) if name.contains('/') => OwnerKind::Team,
            Some(_) => OwnerKind::User,
            None => OwnerKind::Email,
        };
        Ok(Owner::new(value, kind))
    }
}

impl TryFrom<&str> for Owner {
    type Error = InvalidOwner;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Owner::try_from(value.to_owned())
    }
}

/// The owners of a rule, in declaration order. Displays and serializes as the
/// space-joined owner tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Owners(Vec<Owner>);

impl Owners {
    pub fn new(owners: Vec<Owner>) -> Self {
        Self(owners)
    }
}

impl Deref for Owners {
    type Target = [Owner];

    fn deref(&self) -> &[Owner] {
        &self.0
    }
}

impl FromIterator<Owner> for Owners {
    fn from_iter<I: IntoIterator<Item = Owner>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Owners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, owner) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&owner.value)?;
        }
        Ok(())
    }
}

impl Serialize for Owners {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// A pattern with at least one owner.
    Rule,
    Blank,
    Comment,
    /// A line that failed to parse. The error is reported in the
    /// [`crate::parser::ParseResult`].
    Invalid,
}

/// One line of a CODEOWNERS file. Lines that aren't effective rules keep an
/// empty pattern and no owners, but still hold their slot so that line
/// numbers stay aligned with the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub line: usize,
    pub pattern: String,
    pub owners: Owners,
    pub kind: RuleKind,
}

impl Rule {
    pub fn new(line: usize, pattern: impl Into<String>, owners: Owners) -> Self {
        Self {
            line,
            pattern: pattern.into(),
            owners,
            kind: RuleKind::Rule,
        }
    }

    pub fn placeholder(line: usize, kind: RuleKind) -> Self {
        Self {
            line,
            pattern: String::new(),
            owners: Owners::default(),
            kind,
        }
    }

    pub fn is_effective(&self) -> bool {
        self.kind == RuleKind::Rule
    }
}

/// Every line of a CODEOWNERS file in source order. `table[i].line == i + 1`
/// always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable(Vec<Rule>);

impl RuleTable {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        debug_assert!(rules.iter().enumerate().all(|(i, r)| r.line == i + 1));
        Self(rules)
    }

    /// Look up a rule by its 1-based line number.
    pub fn line(&self, line: usize) -> Option<&Rule> {
        line.checked_sub(1).and_then(|idx| self.0.get(idx))
    }

    /// The effective rule on `line`, if there is one.
    pub fn effective_rule(&self, line: usize) -> Option<&Rule> {
        self.line(line).filter(|rule| rule.is_effective())
    }

    pub fn effective_rules(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter().filter(|rule| rule.is_effective())
    }
}

impl Deref for RuleTable {
    type Target = [Rule];

    fn deref(&self) -> &[Rule] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The effective rules of a [`RuleTable`] compiled into a pattern set, for
/// matching paths in-process.
#[derive(Clone)]
pub struct RuleSet {
    rules: RuleTable,
    // pattern id -> rule line
    pattern_lines: Vec<usize>,
    matcher: Matcher,
    tree_matcher: TreeMatcher,
}

impl RuleSet {
    pub fn new(rules: RuleTable) -> Self {
        let mut builder = patternset::Builder::new();
        let pattern_lines = rules
            .effective_rules()
            .map(|rule| {
                builder.add(&rule.pattern);
                rule.line
            })
            .collect();

        Self {
            rules,
            pattern_lines,
            matcher: builder.clone().build(),
            tree_matcher: builder.build_tree_matcher(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// All rules matching `path`, in line order.
    pub fn matching_rules(&self, path: &str) -> Vec<&Rule> {
        let mut lines = self.lines_for(self.matcher.matching_patterns(path));
        lines.sort_unstable();
        lines
            .into_iter()
            .filter_map(|line| self.rules.line(line))
            .collect()
    }

    /// The rule deciding ownership of `path`: the matching rule declared
    /// last.
    pub fn owning_rule(&self, path: &str) -> Option<&Rule> {
        self.lines_for(self.matcher.matching_patterns(path))
            .into_iter()
            .max()
            .and_then(|line| self.rules.line(line))
    }

    pub fn owners(&self, path: &str) -> Option<&Owners> {
        self.owning_rule(path).map(|rule| &rule.owners)
    }

    /// Match many paths at once. Returns, for every path with at least one
    /// match, the lines of all matching rules.
    pub fn matching_lines_for_paths(&self, paths: &[impl AsRef<str>]) -> HashMap<String, Vec<usize>> {
        self.tree_matcher
            .matches_for_paths(paths)
            .into_iter()
            .map(|(path, ids)| (path, self.lines_for(ids)))
            .collect()
    }

    fn lines_for(&self, pattern_ids: Vec<usize>) -> Vec<usize> {
        pattern_ids
            .into_iter()
            .filter_map(|id| self.pattern_lines.get(id).copied())
            .collect()
    }
}
