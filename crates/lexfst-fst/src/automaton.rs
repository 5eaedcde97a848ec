// In-memory transducer graph and the trie builder that fills it.
//
// States live in one flat table and refer to each other by index. The start
// state is always index 0.

use std::collections::VecDeque;

use hashbrown::HashMap;
use lexfst_core::{Direction, SymbolPair};

/// A labelled edge owned by its source state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub pair: SymbolPair,
    pub target: usize,
    pub weight: f64,
}

/// A node of the transducer graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub transitions: Vec<Transition>,
    /// `Some(weight)` when the state is final.
    pub final_weight: Option<f64>,
}

impl State {
    #[inline]
    pub fn is_final(&self) -> bool {
        self.final_weight.is_some()
    }
}

/// Transducer graph with an index-addressed state table.
#[derive(Debug, Clone, PartialEq)]
pub struct Automaton {
    states: Vec<State>,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Index of the start state.
    pub const START: usize = 0;

    /// Create an automaton holding only a non-final start state.
    pub fn new() -> Self {
        Self {
            states: vec![State::default()],
        }
    }

    /// Append a fresh non-final state and return its index.
    pub fn add_state(&mut self) -> usize {
        self.states.push(State::default());
        self.states.len() - 1
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn add_transition(&mut self, from: usize, pair: SymbolPair, to: usize, weight: f64) {
        debug_assert!(to < self.states.len(), "transition target {to} out of range");
        self.states[from].transitions.push(Transition {
            pair,
            target: to,
            weight,
        });
    }

    /// Mark a state final. A later call overwrites the weight.
    pub fn set_final(&mut self, state: usize, weight: f64) {
        self.states[state].final_weight = Some(weight);
    }

    pub fn state(&self, index: usize) -> &State {
        &self.states[index]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    pub fn final_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_final()).count()
    }

    /// Whether the automaton accepts nothing at all.
    pub fn is_empty(&self) -> bool {
        self.final_count() == 0
    }

    /// Whether any transition or final state carries a non-zero weight.
    pub fn has_weights(&self) -> bool {
        self.states.iter().any(|s| {
            s.final_weight.is_some_and(|w| w != 0.0)
                || s.transitions.iter().any(|t| t.weight != 0.0)
        })
    }

    /// Orient every transition so its input is the input of `direction`.
    ///
    /// `Rl` swaps the two sides of each label; the graph shape is untouched.
    pub fn orient(&mut self, direction: Direction) {
        if direction == Direction::Lr {
            return;
        }
        for state in &mut self.states {
            for transition in &mut state.transitions {
                transition.pair = direction.orient(transition.pair);
            }
        }
    }

    /// States reachable from the start, in breadth-first order.
    ///
    /// Outgoing edges are visited in their stored order, so the result is
    /// deterministic for a deterministic build.
    pub fn reachable(&self) -> Vec<usize> {
        let mut seen = vec![false; self.states.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([Self::START]);
        seen[Self::START] = true;
        while let Some(state) = queue.pop_front() {
            order.push(state);
            for t in &self.states[state].transitions {
                if !seen[t.target] {
                    seen[t.target] = true;
                    queue.push_back(t.target);
                }
            }
        }
        order
    }
}

/// Merges symbol-pair sequences into one automaton, sharing common prefixes.
///
/// Each inserted path walks the existing trie as far as its labels match and
/// only allocates states from the point of divergence. The last state of each
/// path becomes final.
#[derive(Debug, Default)]
pub struct TrieBuilder {
    automaton: Automaton,
    children: HashMap<(usize, SymbolPair), usize>,
    paths: usize,
}

impl TrieBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one path and return the index of its final state.
    pub fn insert(&mut self, path: &[SymbolPair]) -> usize {
        let mut state = Automaton::START;
        for &pair in path {
            state = match self.children.get(&(state, pair)) {
                Some(&next) => next,
                None => {
                    let next = self.automaton.add_state();
                    self.automaton.add_transition(state, pair, next, 0.0);
                    self.children.insert((state, pair), next);
                    next
                }
            };
        }
        self.automaton.set_final(state, 0.0);
        self.paths += 1;
        state
    }

    /// Number of paths inserted so far (duplicates included).
    pub fn path_count(&self) -> usize {
        self.paths
    }

    pub fn finish(self) -> Automaton {
        self.automaton
    }
}

/// A named automaton inside a compiled dictionary, e.g. `main@standard`.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub automaton: Automaton,
}

impl Section {
    pub fn new(name: impl Into<String>, automaton: Automaton) -> Self {
        Self {
            name: name.into(),
            automaton,
        }
    }
}
