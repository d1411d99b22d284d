//! Gitignore-style pattern matching, compiled into a single NFA shared by
//! every pattern in the set.
//!
//! Patterns follow `.gitignore` rules: a pattern without an interior `/`
//! matches a file or directory name at any depth, anything else is anchored at
//! the root. `*`, `?` and `[...]` never match `/`, a `**` segment matches any
//! number of directories, and a trailing `/` only matches directories. A
//! matching directory matches everything beneath it.

mod builder;
mod matcher;
mod nfa;
mod tree_matcher;

pub use self::builder::Builder;
pub use self::matcher::Matcher;
pub use self::tree_matcher::TreeMatcher;

/// A single compiled pattern.
#[derive(Clone)]
pub struct CompiledPattern {
    pattern: String,
    matcher: Matcher,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Self {
        let mut builder = Builder::new();
        builder.add(pattern);
        Self {
            pattern: pattern.to_owned(),
            matcher: builder.build(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}
