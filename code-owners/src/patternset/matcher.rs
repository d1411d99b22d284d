use std::{cell::RefCell, collections::HashMap};

use super::nfa::{Nfa, StateId};

/// Matches a path against a set of patterns. Keeps a cache of the NFA states
/// reached for each directory prefix, so sibling paths only pay for their last
/// segment. Created using a [`super::Builder`].
#[derive(Clone)]
pub struct Matcher {
    nfa: Nfa,
    transition_cache: RefCell<HashMap<String, Vec<StateId>>>,
}

impl Matcher {
    pub(crate) fn new(nfa: Nfa) -> Matcher {
        Self {
            nfa,
            transition_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Match a `/`-separated relative path against the patterns in the set.
    /// Returns the ids of the matching patterns, in no particular order.
    pub fn matching_patterns(&self, path: &str) -> Vec<usize> {
        let segments = path.split('/').collect::<Vec<_>>();
        let final_states = self.next_states(&segments);

        let mut matches = Vec::new();
        for state_id in final_states {
            matches.extend(self.nfa.state(state_id).terminal_for_patterns.iter().copied());
        }
        matches
    }

    /// Whether any pattern in the set matches `path`.
    pub fn is_match(&self, path: &str) -> bool {
        !self.matching_patterns(path).is_empty()
    }

    fn next_states(&self, path_segments: &[&str]) -> Vec<StateId> {
        // Base case - no more path segments to match
        let Some((segment, subpath_segments)) = path_segments.split_last() else {
            return self.nfa.initial_states();
        };

        // Get the states for the current path's prefix, from the cache if
        // we've been here before
        let subpath = subpath_segments.join("/");
        let cached_states = self.transition_cache.borrow().get(&subpath).cloned();
        let states = match cached_states {
            Some(states) => states,
            None => {
                let states = self.next_states(subpath_segments);
                self.transition_cache
                    .borrow_mut()
                    .insert(subpath, states.clone());
                states
            }
        };

        self.nfa.step(&states, segment)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::patternset::Builder;

    use super::*;

    #[test]
    fn test_literals() {
        let patterns = [
            "/src/parser/mod.rs",
            "/lib/parser/parse.rs",
            "/bin/parser/mod.rs",
            "mod.rs",
        ];
        let matcher = matcher_for_patterns(&patterns);

        assert_matches(&matcher, "src/parser/mod.rs", &patterns, &[0, 3]);
        assert_matches(&matcher, "lib/parser/parse.rs", &patterns, &[1]);
        assert_matches(&matcher, "lib/parser/mod.rs", &patterns, &[3]);
        assert_matches(&matcher, "lib/parser/util.rs", &patterns, &[]);
        assert_matches(&matcher, "src/lexer/mod.rs", &patterns, &[3]);
        assert_matches(&matcher, "src/parser/mod.go", &patterns, &[]);
    }

    #[test]
    fn test_basename_patterns_match_directories() {
        let patterns = ["build", "*.log"];
        let matcher = matcher_for_patterns(&patterns);

        assert_matches(&matcher, "build", &patterns, &[0]);
        assert_matches(&matcher, "build/out.bin", &patterns, &[0]);
        assert_matches(&matcher, "pkg/build/out.bin", &patterns, &[0]);
        assert_matches(&matcher, "logs.d/app.log", &patterns, &[1]);
        assert_matches(&matcher, "app.log/index", &patterns, &[1]);
        assert_matches(&matcher, "builder", &patterns, &[]);
    }

    #[test]
    fn test_directory_only_patterns() {
        let patterns = ["docs/", "/vendor/"];
        let matcher = matcher_for_patterns(&patterns);

        assert_matches(&matcher, "docs", &patterns, &[]);
        assert_matches(&matcher, "docs/index.md", &patterns, &[0]);
        assert_matches(&matcher, "src/docs/api.md", &patterns, &[0]);
        assert_matches(&matcher, "vendor/lib/a.c", &patterns, &[1]);
        assert_matches(&matcher, "src/vendor/a.c", &patterns, &[]);
    }

    #[test]
    fn test_trailing_single_star_is_recursive() {
        let patterns = ["lib/*", "lib/**"];
        let matcher = matcher_for_patterns(&patterns);

        assert_matches(&matcher, "lib", &patterns, &[]);
        assert_matches(&matcher, "lib/a.rb", &patterns, &[0, 1]);
        assert_matches(&matcher, "lib/deep/nested/a.rb", &patterns, &[0, 1]);
        assert_matches(&matcher, "src/lib/a.rb", &patterns, &[]);
    }

    #[test]
    fn test_cache_does_not_leak_between_paths() {
        let patterns = ["/a/b", "c"];
        let matcher = matcher_for_patterns(&patterns);

        assert_matches(&matcher, "a/b", &patterns, &[0]);
        assert_matches(&matcher, "a/c", &patterns, &[1]);
        assert_matches(&matcher, "a/b/c", &patterns, &[0, 1]);
        assert_matches(&matcher, "x/b", &patterns, &[]);
        assert!(matcher.is_match("a/b"));
        assert!(!matcher.is_match("a/d"));
    }

    fn assert_matches(matcher: &Matcher, path: &str, patterns: &[&str], expected: &[usize]) {
        assert_eq!(
            HashSet::<usize>::from_iter(matcher.matching_patterns(path)),
            HashSet::from_iter(expected.iter().copied()),
            "expected {:?} to match {:?}",
            path,
            expected.iter().map(|&i| patterns[i]).collect::<Vec<_>>(),
        );
    }

    fn matcher_for_patterns(patterns: &[&str]) -> Matcher {
        let mut builder = Builder::new();
        for pattern in patterns {
            builder.add(pattern);
        }
        builder.build()
    }
}
