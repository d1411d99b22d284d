#[derive(Clone)]
pub(crate) struct Nfa {
    states: Vec<State>,
}

impl Nfa {
    pub(crate) const START_STATE: StateId = StateId(0);

    pub(crate) fn new() -> Self {
        Self {
            states: vec![State::new()],
        }
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        let id = self.states.len();
        self.states.push(State::new());
        StateId(id as u32)
    }

    #[inline]
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[usize::from(id)]
    }

    #[inline]
    pub(crate) fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[usize::from(id)]
    }

    #[cfg(test)]
    pub(crate) fn states_iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub(crate) fn initial_states(&self) -> Vec<StateId> {
        let mut states = vec![Self::START_STATE];
        if let Some(epsilon_node_id) = self.state(Self::START_STATE).epsilon_transition {
            states.push(epsilon_node_id);
        }
        states
    }

    pub(crate) fn transitions_from(&self, state_id: StateId) -> impl Iterator<Item = &Transition> {
        self.state(state_id).transitions.iter()
    }

    pub(crate) fn epsilon_transitions_from(&self, state_id: StateId) -> Option<StateId> {
        self.state(state_id).epsilon_transition
    }

    // Follow the matching transitions out of `from_states` for one path
    // segment, then traverse any epsilon edges from the states reached.
    pub(crate) fn step(&self, from_states: &[StateId], segment: &str) -> Vec<StateId> {
        let mut next_states = Vec::new();
        for &state_id in from_states {
            self.transitions_from(state_id)
                .filter(|transition| transition.is_match(segment))
                .for_each(|transition| next_states.push(transition.target));
        }

        let epsilon_nodes = next_states
            .iter()
            .flat_map(|&state_id| self.epsilon_transitions_from(state_id))
            .collect::<Vec<_>>();
        next_states.extend(epsilon_nodes);

        // Several transitions can land on the same state, e.g. a `**` loop and
        // the literal segment that follows it.
        next_states.sort_unstable();
        next_states.dedup();
        next_states
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct StateId(pub(crate) u32);

impl From<StateId> for usize {
    fn from(id: StateId) -> usize {
        id.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct State {
    pub(crate) terminal_for_patterns: Vec<usize>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) epsilon_transition: Option<StateId>,
}

impl State {
    fn new() -> Self {
        Self {
            terminal_for_patterns: Vec::new(),
            transitions: Vec::new(),
            epsilon_transition: None,
        }
    }

    pub(crate) fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub(crate) fn mark_as_terminal(&mut self, pattern_id: usize) {
        self.terminal_for_patterns.push(pattern_id);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) path_segment: String,
    condition: TransitionCondition,
    pub(crate) target: StateId,
}

impl Transition {
    pub(crate) fn new(path_segment: String, target: StateId) -> Transition {
        let condition = TransitionCondition::new(&path_segment);
        Self {
            path_segment,
            condition,
            target,
        }
    }

    pub(crate) fn is_match(&self, candidate: &str) -> bool {
        self.condition.is_match(&self.path_segment, candidate)
    }
}

#[derive(Debug, Clone)]
enum TransitionCondition {
    Unconditional,
    Literal,
    Prefix,
    Suffix,
    Contains,
    Regex(regex::Regex),
    // The segment can't be compiled (e.g. an unterminated character class),
    // so the pattern matches nothing.
    Never,
}

impl TransitionCondition {
    fn new(glob: &str) -> Self {
        if glob == "*" {
            return Self::Unconditional;
        }
        if glob.contains(['\\', '[', '?']) {
            return match segment_to_regex(glob).and_then(|re| regex::Regex::new(&re).ok()) {
                Some(re) => Self::Regex(re),
                None => Self::Never,
            };
        }

        let mut chars = glob.chars();
        let leading_star = chars.next().map(|c| c == '*').unwrap_or(false);
        let trailing_star = chars.next_back().map(|c| c == '*').unwrap_or(false);
        let internal_wildcards = chars.any(|c| c == '*');

        match (leading_star, trailing_star, internal_wildcards) {
            (false, false, false) => Self::Literal,
            (false, true, false) => Self::Prefix,
            (true, false, false) => Self::Suffix,
            (true, true, false) => Self::Contains,
            _ => match segment_to_regex(glob).and_then(|re| regex::Regex::new(&re).ok()) {
                Some(re) => Self::Regex(re),
                None => Self::Never,
            },
        }
    }

    fn is_match(&self, pattern: &str, candidate: &str) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Literal => pattern == candidate,
            Self::Prefix => candidate.starts_with(pattern.trim_end_matches('*')),
            Self::Suffix => candidate.ends_with(pattern.trim_start_matches('*')),
            Self::Contains => {
                memchr::memmem::find(candidate.as_bytes(), pattern.trim_matches('*').as_bytes())
                    .is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
            Self::Never => false,
        }
    }
}

// Translate a single gitignore path segment into an anchored regex. Returns
// `None` for segments git itself would never match: a dangling backslash or
// an unterminated character class.
fn segment_to_regex(segment: &str) -> Option<String> {
    let mut regex = String::with_capacity(segment.len() + 8);
    regex.push_str(r"\A");

    let chars = segment.chars().collect::<Vec<_>>();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => regex.push_str(r"[^/]*"),
            '?' => regex.push_str(r"[^/]"),
            '\\' => {
                i += 1;
                push_literal(&mut regex, *chars.get(i)?);
            }
            '[' => {
                let (class, next) = class_to_regex(&chars, i)?;
                regex.push_str(&class);
                i = next;
                continue;
            }
            c => push_literal(&mut regex, c),
        }
        i += 1;
    }

    regex.push_str(r"\z");
    Some(regex)
}

// Convert the bracket expression starting at `chars[start] == '['`. Returns
// the regex class and the index just past the closing bracket.
fn class_to_regex(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let mut class = String::from("[");

    if matches!(chars.get(i), Some('!' | '^')) {
        class.push_str("^/");
        i += 1;
    }

    // A `]` straight after the opening bracket is a literal.
    let mut first = true;
    loop {
        let c = *chars.get(i)?;
        match c {
            ']' if !first => {
                class.push(']');
                return Some((class, i + 1));
            }
            '[' if chars.get(i + 1) == Some(&':') => {
                let close = (i + 2..chars.len().saturating_sub(1))
                    .find(|&j| chars[j] == ':' && chars[j + 1] == ']')?;
                class.extend(&chars[i..close + 2]);
                i = close + 2;
            }
            _ => {
                let (lo, next) = class_char(chars, i)?;
                if chars.get(next) == Some(&'-') && !matches!(chars.get(next + 1), Some(']') | None) {
                    let (hi, after) = class_char(chars, next + 1)?;
                    push_literal(&mut class, lo);
                    class.push('-');
                    push_literal(&mut class, hi);
                    i = after;
                } else {
                    push_literal(&mut class, lo);
                    i = next;
                }
            }
        }
        first = false;
    }
}

fn class_char(chars: &[char], i: usize) -> Option<(char, usize)> {
    match *chars.get(i)? {
        '\\' => chars.get(i + 1).map(|&c| (c, i + 2)),
        c => Some((c, i + 1)),
    }
}

fn push_literal(regex: &mut String, c: char) {
    if regex_syntax::is_meta_character(c) {
        regex.push('\\');
    }
    regex.push(c);
}
