use std::{fmt, fs, path::Path};

use tracing::debug;

use crate::{
    error::{Error, Result},
    ruleset::{Owner, Owners, Rule, RuleKind, RuleTable},
};

/// Parse a CODEOWNERS file from a string, returning a `ParseResult` containing
/// one rule slot per line and any errors encountered.
pub fn parse(source: &str) -> ParseResult {
    Parser::new(source).parse()
}

/// Parse a CODEOWNERS file from a file path.
pub fn parse_file(path: &Path) -> Result<ParseResult> {
    let source = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(parse(&source))
}

/// The result of parsing a CODEOWNERS file. `rules` always has one entry per
/// source line; lines listed in `errors` are kept as
/// [`RuleKind::Invalid`] placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub rules: RuleTable,
    pub errors: Vec<ParseError>,
}

/// A line that could not be parsed. Quotes the line exactly as it appeared in
/// the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub source_line: String,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, source_line: &str, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            source_line: source_line.to_owned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error line {}: \"{}\" ({})",
            self.line, self.source_line, self.message
        )
    }
}

impl std::error::Error for ParseError {}

struct Parser<'a> {
    source: &'a str,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        let source = self.source;
        let rules = source
            .lines()
            .enumerate()
            .map(|(idx, line)| self.parse_line(idx + 1, line))
            .collect::<Vec<_>>();

        debug!(
            lines = rules.len(),
            errors = self.errors.len(),
            "parsed CODEOWNERS source"
        );
        ParseResult {
            rules: RuleTable::new(rules),
            errors: self.errors,
        }
    }

    fn parse_line(&mut self, line_no: usize, line: &str) -> Rule {
        let stripped = line.trim();
        if stripped.is_empty() {
            return Rule::placeholder(line_no, RuleKind::Blank);
        }
        if stripped.starts_with('#') {
            return Rule::placeholder(line_no, RuleKind::Comment);
        }
        if stripped.starts_with('!') {
            return self.invalid(line_no, line, "negation patterns are not supported");
        }

        match split_rule(stripped) {
            Ok((pattern, _)) if pattern.contains('\0') => {
                self.invalid(line_no, line, "patterns cannot contain null bytes")
            }
            Ok((pattern, owners)) => Rule::new(line_no, pattern, owners),
            Err(message) => self.invalid(line_no, line, message),
        }
    }

    fn invalid(&mut self, line_no: usize, line: &str, message: &str) -> Rule {
        debug!(line = line_no, reason = message, "rejected CODEOWNERS line");
        self.errors.push(ParseError::new(line_no, line, message));
        Rule::placeholder(line_no, RuleKind::Invalid)
    }
}

// Split a trimmed, non-comment line into its pattern and owners. Owners are
// recognized by their `@`, so the pattern is everything before the earliest
// point from which every remaining token is an owner. That lets patterns
// contain spaces.
fn split_rule(line: &str) -> Result<(&str, Owners), &'static str> {
    let mut tokens = tokenize(line);

    // Drop a trailing comment, but only one that follows an owner; a `#`
    // inside the pattern is part of the pattern.
    if let Some(pos) = (1..tokens.len())
        .find(|&i| tokens[i].1.starts_with('#') && Owner::is_owner_token(tokens[i - 1].1))
    {
        tokens.truncate(pos);
    }

    let owner_count = tokens
        .iter()
        .rev()
        .take_while(|(_, token)| Owner::is_owner_token(token))
        .count();
    if owner_count == 0 {
        return Err("expected at least one owner");
    }

    let boundary = (tokens.len() - owner_count).max(1);
    if boundary >= tokens.len() {
        return Err("expected a pattern before the owners");
    }

    let (last_start, last_token) = tokens[boundary - 1];
    let pattern = &line[..last_start + last_token.len()];
    let owners = tokens[boundary..]
        .iter()
        .map(|&(_, token)| Owner::try_from(token))
        .collect::<Result<Owners, _>>()
        .map_err(|_| "invalid owner")?;

    Ok((pattern, owners))
}

// Split on whitespace, keeping each token's byte offset.
fn tokenize(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..idx]));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}
