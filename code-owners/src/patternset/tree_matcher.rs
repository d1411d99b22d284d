use std::collections::HashMap;

use crate::path_tree::PathTree;

use super::nfa::{Nfa, StateId};

/// Matches a whole batch of paths against a set of patterns. The paths are
/// arranged into a tree first, so each shared directory prefix is stepped
/// through the NFA once. Created using a [`super::Builder`].
#[derive(Clone)]
pub struct TreeMatcher {
    nfa: Nfa,
}

impl TreeMatcher {
    pub(crate) fn new(nfa: Nfa) -> TreeMatcher {
        Self { nfa }
    }

    /// Match many paths at once. Returns, for each path matched by at least
    /// one pattern, the ids of the matching patterns in no particular order.
    pub fn matches_for_paths(&self, paths: &[impl AsRef<str>]) -> HashMap<String, Vec<usize>> {
        let mut tree = PathTree::new();
        for path in paths {
            tree.insert(path.as_ref());
        }

        let mut matches = HashMap::new();
        let mut pending = vec![(PathTree::root_id(), self.nfa.initial_states())];
        while let Some((node_id, states)) = pending.pop() {
            let node = tree.node(node_id);

            if !node.paths.is_empty() {
                let pattern_ids = self.accepted_patterns(&states);
                if !pattern_ids.is_empty() {
                    for path in &node.paths {
                        matches.insert(path.clone(), pattern_ids.clone());
                    }
                }
            }

            // Once no state is live, nothing below this node can match.
            pending.extend(node.children.iter().filter_map(|(segment, &child_id)| {
                let next = self.nfa.step(&states, segment);
                (!next.is_empty()).then_some((child_id, next))
            }));
        }
        matches
    }

    fn accepted_patterns(&self, states: &[StateId]) -> Vec<usize> {
        states
            .iter()
            .flat_map(|&id| self.nfa.state(id).terminal_for_patterns.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::patternset::Builder;

    use super::*;

    #[test]
    fn test_basenames_and_anchors() {
        assert_matches(
            &["/Makefile", "Makefile", "/build/Makefile", "*.lock"],
            &[
                ("Makefile", vec![0, 1]),
                ("tools/Makefile", vec![1]),
                ("build/Makefile", vec![1, 2]),
                ("Cargo.lock", vec![3]),
                ("crates/foo/Cargo.lock", vec![3]),
                ("Makefile.in", vec![]),
            ],
        );
    }

    #[test]
    fn test_directories_take_their_contents() {
        assert_matches(
            &["vendor", "/docs/", "src/generated", "assets/*"],
            &[
                ("vendor/lib/a.c", vec![0]),
                ("third_party/vendor/b.c", vec![0]),
                ("docs", vec![]),
                ("docs/index.md", vec![1]),
                ("docs/api/v1/index.md", vec![1]),
                ("src/generated/mod.rs", vec![2]),
                ("lib/src/generated/mod.rs", vec![]),
                ("assets/logo.png", vec![3]),
                ("assets/icons/app.svg", vec![3]),
            ],
        );
    }

    #[test]
    fn test_wildcards_stay_within_a_segment() {
        assert_matches(
            &["/src/*.rs", "/src/*/mod.rs", "test_?.py", "/[abc]*/x"],
            &[
                ("src/lib.rs", vec![0]),
                ("src/parser/lib.rs", vec![]),
                ("src/parser/mod.rs", vec![1]),
                ("src/a/b/mod.rs", vec![]),
                ("test_1.py", vec![2]),
                ("pkg/test_a.py", vec![2]),
                ("test_10.py", vec![]),
                ("alpha/x", vec![3]),
                ("delta/x", vec![]),
            ],
        );
    }

    #[test]
    fn test_double_stars() {
        assert_matches(
            &["**/fixtures", "/lib/**/*.rb", "/out/**", "**"],
            &[
                ("fixtures/a.json", vec![0, 3]),
                ("spec/deep/fixtures/a.json", vec![0, 3]),
                ("lib/a.rb", vec![1, 3]),
                ("lib/x/y/z.rb", vec![1, 3]),
                ("lib/x/y/z.py", vec![3]),
                ("out", vec![3]),
                ("out/bin/app", vec![2, 3]),
            ],
        );
    }

    #[test]
    fn test_escapes_and_spaces() {
        assert_matches(
            &["\\#notes", "what\\?", "/my docs/*", "read me.txt"],
            &[
                ("#notes", vec![0]),
                ("what?", vec![1]),
                ("whatx", vec![]),
                ("my docs/guide.md", vec![2]),
                ("my docs/nested/read me.txt", vec![2, 3]),
                ("my/docs/guide.md", vec![]),
            ],
        );
    }

    #[test]
    fn test_unmatched_paths_are_absent() {
        let matcher = matcher_for_patterns(&["/only/this"]);
        let matches = matcher.matches_for_paths(&["only/this", "only/that", "elsewhere"]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches["only/this"], vec![0]);
    }

    fn assert_matches(patterns: &[&str], expected: &[(&str, Vec<usize>)]) {
        let paths = expected.iter().map(|(path, _)| *path).collect::<Vec<_>>();
        let matches = matcher_for_patterns(patterns).matches_for_paths(&paths);
        for (path, ids) in expected {
            let actual = matches
                .get(*path)
                .map(|ids| ids.iter().copied().collect::<BTreeSet<_>>())
                .unwrap_or_default();
            assert_eq!(
                actual,
                ids.iter().copied().collect::<BTreeSet<_>>(),
                "match mismatch for `{}`",
                path
            );
        }
    }

    fn matcher_for_patterns(patterns: &[&str]) -> TreeMatcher {
        let mut builder = Builder::new();
        for pattern in patterns {
            builder.add(pattern);
        }
        builder.build_tree_matcher()
    }
}
