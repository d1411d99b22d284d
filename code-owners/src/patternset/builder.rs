use super::{
    nfa::{Nfa, StateId, Transition},
    Matcher, TreeMatcher,
};

/// Builder for a patternset [`Matcher`] or [`TreeMatcher`]. All patterns share
/// one NFA, so patterns with a common prefix share states.
#[derive(Clone, Default)]
pub struct Builder {
    nfa: Nfa,
    pattern_count: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a [`Matcher`] for matching one path at a time.
    pub fn build(self) -> Matcher {
        Matcher::new(self.nfa)
    }

    /// Build a [`TreeMatcher`], which matches a whole batch of paths in one
    /// pass.
    pub fn build_tree_matcher(self) -> TreeMatcher {
        TreeMatcher::new(self.nfa)
    }

    /// Add a gitignore-style pattern, returning its id. Ids are assigned
    /// sequentially from zero.
    pub fn add(&mut self, pattern: &str) -> usize {
        let pattern_id = self.pattern_count;
        self.pattern_count += 1;

        let shape = PatternShape::parse(pattern);
        let start = if shape.anchored {
            Nfa::START_STATE
        } else {
            self.any_depth(Nfa::START_STATE)
        };

        let mut end = shape.segments.iter().fold(start, |state, &segment| {
            if segment == "**" {
                self.any_depth(state)
            } else {
                self.segment(state, segment)
            }
        });

        // We only ever match files. A trailing `**` must consume at least one
        // segment, and a directory-only pattern needs one more segment below
        // the directory it matched. `foo/**/` needs both.
        let extra_segments =
            usize::from(shape.segments.last() == Some(&"**")) + usize::from(shape.dir_only);
        for _ in 0..extra_segments {
            end = self.segment(end, "*");
        }

        // Whatever a pattern matches, it also matches everything beneath it.
        end = self.any_depth(end);
        self.nfa.state_mut(end).mark_as_terminal(pattern_id);

        pattern_id
    }

    // The state reached from `from` by consuming one segment matching
    // `segment`, reusing an existing transition when there is one.
    fn segment(&mut self, from: StateId, segment: &str) -> StateId {
        let existing = self
            .nfa
            .transitions_from(from)
            .find(|t| t.path_segment == segment && t.target != from)
            .map(|t| t.target);
        if let Some(target) = existing {
            return target;
        }

        let target = self.nfa.add_state();
        self.nfa
            .state_mut(from)
            .add_transition(Transition::new(segment.to_owned(), target));
        target
    }

    // The state reached from `from` by consuming zero or more segments. That's
    // a state looping on `*`, entered by an epsilon transition.
    fn any_depth(&mut self, from: StateId) -> StateId {
        // `a/**/**/b` is the same as `a/**/b`.
        if self
            .nfa
            .transitions_from(from)
            .any(|t| t.path_segment == "*" && t.target == from)
        {
            return from;
        }

        if let Some(target) = self.nfa.epsilon_transitions_from(from) {
            return target;
        }

        let target = self.nfa.add_state();
        self.nfa
            .state_mut(target)
            .add_transition(Transition::new("*".to_owned(), target));
        self.nfa.state_mut(from).epsilon_transition = Some(target);
        target
    }
}

// How a gitignore pattern splits into segments, and where it may match.
#[derive(Debug, PartialEq, Eq)]
struct PatternShape<'a> {
    segments: Vec<&'a str>,
    // Matches only at the root, rather than at any depth.
    anchored: bool,
    // Matches only directories.
    dir_only: bool,
}

impl<'a> PatternShape<'a> {
    fn parse(pattern: &'a str) -> Self {
        let (pattern, leading_slash) = match pattern.strip_prefix('/') {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };
        let (pattern, dir_only) = match pattern.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (pattern, false),
        };

        let segments = pattern.split('/').collect::<Vec<_>>();
        Self {
            anchored: leading_slash || segments.len() > 1,
            dir_only,
            segments,
        }
    }
}
