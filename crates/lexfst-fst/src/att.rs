// Reader for tab-separated automaton text.
//
// Each non-blank line is either a transition `src dst input output [weight]`
// or a final state `state [weight]`. A line starting with `-` closes the
// current automaton and starts another one; all automata of a file are
// joined under a fresh start state.
//
// Every transition is then classified as lying on a word path, a punctuation
// path or both, and the graph splits into one sub-automaton per kind.

use std::collections::{BTreeSet, VecDeque};
use std::ops::{BitOr, BitOrAssign};

use hashbrown::HashMap;
use lexfst_core::character::{CharType, case_variants, get_char_type};
use lexfst_core::{Alphabet, CoreError, Direction, Symbol, SymbolPair};

use crate::automaton::Automaton;

#[derive(Debug, thiserror::Error)]
pub enum AttError {
    #[error("automaton text is empty")]
    Empty,
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Automaton read from text, with the word characters it mentions.
#[derive(Debug, Clone)]
pub struct AttTransducer {
    /// Graph as written: the third column is the input side of `lr`.
    pub automaton: Automaton,
    /// Single-character symbols that are not punctuation or whitespace,
    /// together with their case counterparts.
    pub letters: BTreeSet<char>,
}

impl AttTransducer {
    /// The letters as one string, in code point order.
    pub fn letters_string(&self) -> String {
        self.letters.iter().collect()
    }

    /// Split the graph into its word paths and its punctuation paths, read
    /// on the input side of `direction`.
    ///
    /// Returns `(words, punctuation)`. Either may accept nothing.
    pub fn split(&self, alphabet: &Alphabet, direction: Direction) -> (Automaton, Automaton) {
        let kinds = self.classify(alphabet, direction);
        (
            self.extract(&kinds, PathKind::WORD),
            self.extract(&kinds, PathKind::PUNCT),
        )
    }

    fn symbol_kind(&self, text: &str) -> PathKind {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if self.letters.contains(&c) => PathKind::WORD,
            (Some(c), None) if get_char_type(c) == CharType::Punctuation => PathKind::PUNCT,
            _ => PathKind::UNDECIDED,
        }
    }

    /// Kind of every transition, indexed like the state's transition list.
    ///
    /// A transition takes the kind of its own input symbol and of every
    /// transition before it on some path. Transitions still undecided after
    /// that (epsilon or multi-character inputs leading away from the start)
    /// take the kinds of the transitions that follow them.
    fn classify(&self, alphabet: &Alphabet, direction: Direction) -> Vec<Vec<PathKind>> {
        let states = self.automaton.states();
        let mut kinds: Vec<Vec<PathKind>> = states
            .iter()
            .map(|state| {
                state
                    .transitions
                    .iter()
                    .map(|t| self.symbol_kind(alphabet.text(direction.input_of(t.pair))))
                    .collect()
            })
            .collect();

        let mut incoming = vec![PathKind::UNDECIDED; states.len()];
        let mut queued = vec![true; states.len()];
        let mut queue: VecDeque<usize> = (0..states.len()).collect();
        while let Some(s) = queue.pop_front() {
            queued[s] = false;
            for (i, t) in states[s].transitions.iter().enumerate() {
                kinds[s][i] |= incoming[s];
                let merged = incoming[t.target] | kinds[s][i];
                if merged != incoming[t.target] {
                    incoming[t.target] = merged;
                    if !queued[t.target] {
                        queued[t.target] = true;
                        queue.push_back(t.target);
                    }
                }
            }
        }

        let open: Vec<(usize, usize)> = kinds
            .iter()
            .enumerate()
            .flat_map(|(s, ks)| {
                ks.iter()
                    .enumerate()
                    .filter(|(_, k)| k.is_undecided())
                    .map(move |(i, _)| (s, i))
            })
            .collect();
        let mut changed = !open.is_empty();
        while changed {
            changed = false;
            for &(s, i) in &open {
                let target = states[s].transitions[i].target;
                let following = kinds[target]
                    .iter()
                    .fold(PathKind::UNDECIDED, |acc, &k| acc | k);
                let merged = kinds[s][i] | following;
                if merged != kinds[s][i] {
                    kinds[s][i] = merged;
                    changed = true;
                }
            }
        }
        kinds
    }

    /// Copy the part of the graph reachable from the start through
    /// transitions of `kind`, numbering states breadth-first.
    fn extract(&self, kinds: &[Vec<PathKind>], kind: PathKind) -> Automaton {
        let states = self.automaton.states();
        let mut out = Automaton::new();
        let mut mapped: Vec<Option<usize>> = vec![None; states.len()];
        mapped[Automaton::START] = Some(Automaton::START);
        let mut queue = VecDeque::from([Automaton::START]);

        while let Some(raw) = queue.pop_front() {
            let Some(from) = mapped[raw] else { continue };
            for (t, &k) in states[raw].transitions.iter().zip(&kinds[raw]) {
                if !k.contains(kind) {
                    continue;
                }
                let to = match mapped[t.target] {
                    Some(to) => to,
                    None => {
                        let to = out.add_state();
                        mapped[t.target] = Some(to);
                        queue.push_back(t.target);
                        to
                    }
                };
                out.add_transition(from, t.pair, to, t.weight);
            }
            if let Some(weight) = states[raw].final_weight {
                out.set_final(from, weight);
            }
        }
        out
    }
}

/// Set of path kinds a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathKind(u8);

impl PathKind {
    pub const UNDECIDED: PathKind = PathKind(0);
    pub const WORD: PathKind = PathKind(1);
    pub const PUNCT: PathKind = PathKind(2);

    #[inline]
    pub fn contains(self, other: PathKind) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_undecided(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PathKind {
    type Output = PathKind;

    fn bitor(self, rhs: PathKind) -> PathKind {
        PathKind(self.0 | rhs.0)
    }
}

impl BitOrAssign for PathKind {
    fn bitor_assign(&mut self, rhs: PathKind) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Default)]
struct RawState {
    transitions: Vec<(SymbolPair, usize, f64)>,
    final_weight: Option<f64>,
}

/// State table keyed by `(automaton number, state number)` as written.
#[derive(Debug, Default)]
struct RawGraph {
    states: Vec<RawState>,
    ids: HashMap<(usize, u32), usize>,
    starts: Vec<usize>,
}

impl RawGraph {
    fn node(&mut self, fst: usize, num: u32) -> usize {
        if let Some(&index) = self.ids.get(&(fst, num)) {
            return index;
        }
        self.states.push(RawState::default());
        let index = self.states.len() - 1;
        self.ids.insert((fst, num), index);
        index
    }
}

/// Parse automaton text, interning its symbols into `alphabet`.
///
/// Only the part of the graph reachable from the start state is kept.
pub fn parse_att(text: &str, alphabet: &mut Alphabet) -> Result<AttTransducer, AttError> {
    let mut graph = RawGraph::default();
    let mut letters = BTreeSet::new();
    let mut fst = 0usize;
    let mut first_line_in_fst = true;
    let mut saw_content = false;

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.trim_end_matches('\r');
        if content.trim().is_empty() {
            continue;
        }
        if content.starts_with('-') {
            if saw_content && !first_line_in_fst {
                fst += 1;
            }
            first_line_in_fst = true;
            continue;
        }
        saw_content = true;

        let tokens: Vec<&str> = content.split('\t').collect();
        let parse_error = |message: String| AttError::Parse { line, message };

        if first_line_in_fst && tokens.len() == 1 {
            return Err(parse_error(
                "an automaton must start with a transition or a weighted final state"
                    .to_string(),
            ));
        }

        let from_num = parse_state(tokens[0]).map_err(parse_error)?;
        let from = graph.node(fst, from_num);
        if first_line_in_fst {
            graph.starts.push(from);
            first_line_in_fst = false;
        }

        match tokens.len() {
            1 | 2 => {
                let weight = match tokens.get(1) {
                    Some(w) => parse_weight(w).map_err(parse_error)?,
                    None => 0.0,
                };
                graph.states[from].final_weight = Some(weight);
            }
            4 | 5 => {
                let to_num = parse_state(tokens[1]).map_err(parse_error)?;
                let to = graph.node(fst, to_num);
                let input = symbol(tokens[2], alphabet, &mut letters).map_err(|e| match e {
                    SymbolError::Empty => parse_error("empty input symbol".to_string()),
                    SymbolError::Core(e) => AttError::Core(e),
                })?;
                let output = symbol(tokens[3], alphabet, &mut letters).map_err(|e| match e {
                    SymbolError::Empty => parse_error("empty output symbol".to_string()),
                    SymbolError::Core(e) => AttError::Core(e),
                })?;
                let weight = match tokens.get(4) {
                    Some(w) => parse_weight(w).map_err(parse_error)?,
                    None => 0.0,
                };
                graph.states[from]
                    .transitions
                    .push((SymbolPair::new(input, output), to, weight));
            }
            n => {
                return Err(parse_error(format!(
                    "expected 1, 2, 4 or 5 tab-separated fields, found {n}"
                )));
            }
        }
    }

    if graph.starts.is_empty() {
        return Err(AttError::Empty);
    }
    if graph.starts.len() > 1 {
        tracing::warn!(
            automata = graph.starts.len(),
            "multiple automata in one file will be disjoined"
        );
    }

    let automaton = build(&graph);
    tracing::debug!(
        states = automaton.state_count(),
        transitions = automaton.transition_count(),
        dropped = graph.states.len() + usize::from(graph.starts.len() > 1) - automaton.state_count(),
        "parsed automaton text"
    );
    Ok(AttTransducer { automaton, letters })
}

/// Copy the reachable part of `graph` into an [`Automaton`], numbering states
/// breadth-first from the start.
fn build(graph: &RawGraph) -> Automaton {
    let mut automaton = Automaton::new();
    let mut mapped: Vec<Option<usize>> = vec![None; graph.states.len()];
    let mut queue = VecDeque::new();

    if let [start] = graph.starts.as_slice() {
        mapped[*start] = Some(Automaton::START);
        queue.push_back(*start);
    } else {
        for &start in &graph.starts {
            if mapped[start].is_none() {
                mapped[start] = Some(automaton.add_state());
                queue.push_back(start);
            }
            if let Some(target) = mapped[start] {
                automaton.add_transition(
                    Automaton::START,
                    SymbolPair::new(Symbol::EPSILON, Symbol::EPSILON),
                    target,
                    0.0,
                );
            }
        }
    }

    while let Some(raw) = queue.pop_front() {
        let Some(from) = mapped[raw] else { continue };
        let state = &graph.states[raw];
        for &(pair, to_raw, weight) in &state.transitions {
            let to = match mapped[to_raw] {
                Some(to) => to,
                None => {
                    let to = automaton.add_state();
                    mapped[to_raw] = Some(to);
                    queue.push_back(to_raw);
                    to
                }
            };
            automaton.add_transition(from, pair, to, weight);
        }
        if let Some(weight) = state.final_weight {
            automaton.set_final(from, weight);
        }
    }
    automaton
}

fn parse_state(token: &str) -> Result<u32, String> {
    token
        .trim()
        .parse()
        .map_err(|_| format!("invalid state number {token:?}"))
}

fn parse_weight(token: &str) -> Result<f64, String> {
    token
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight {token:?}"))
}

enum SymbolError {
    Empty,
    Core(CoreError),
}

/// Intern one symbol column, recording word characters in `letters`.
fn symbol(
    token: &str,
    alphabet: &mut Alphabet,
    letters: &mut BTreeSet<char>,
) -> Result<Symbol, SymbolError> {
    let text = match token {
        "@0@" | "ε" => return Ok(Symbol::EPSILON),
        "@_SPACE_@" => " ",
        "@_TAB_@" => "\t",
        "" => return Err(SymbolError::Empty),
        other => other,
    };

    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !matches!(get_char_type(c), CharType::Punctuation | CharType::Whitespace) {
            let (c, other) = case_variants(c);
            letters.insert(c);
            letters.extend(other);
        }
    }
    alphabet.intern(text).map_err(SymbolError::Core)
}
