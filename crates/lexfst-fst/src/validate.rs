// Epsilon checks on a built automaton.
//
// Only edges whose input (for the requested direction) is epsilon are
// followed. Such an edge lets the lookup engine move without consuming input,
// so a cycle of them can spin forever, and a chain of them from the start to a
// final state makes every lookup accept the empty string.

use lexfst_core::Direction;

use crate::automaton::Automaton;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("transducer contains an epsilon loop through state {state}")]
    EpsilonCycle { state: usize },
    #[error("transducer contains an epsilon path from the start state to final state {state}")]
    EpsilonToFinal { state: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Run every epsilon check against `automaton` as read in `direction`.
pub fn validate(automaton: &Automaton, direction: Direction) -> Result<(), ValidationError> {
    check_epsilon_cycles(automaton, direction)?;
    check_epsilon_to_final(automaton, direction)
}

/// Fail if any state lies on a cycle made only of epsilon-input edges.
///
/// Depth-first search from every state with an explicit stack; reaching a
/// state that is still on the current path closes a cycle.
pub fn check_epsilon_cycles(
    automaton: &Automaton,
    direction: Direction,
) -> Result<(), ValidationError> {
    let states = automaton.states();
    let mut marks = vec![Mark::Unvisited; states.len()];
    // (state, index of the next outgoing edge to examine)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..states.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnPath;
        stack.push((root, 0));

        while let Some(&(state, next)) = stack.last() {
            let transitions = &states[state].transitions;
            let found = transitions[next..]
                .iter()
                .position(|t| direction.input_of(t.pair).is_epsilon())
                .map(|offset| next + offset);

            match found {
                Some(edge) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 = edge + 1;
                    }
                    let target = transitions[edge].target;
                    match marks[target] {
                        Mark::OnPath => return Err(ValidationError::EpsilonCycle { state: target }),
                        Mark::Unvisited => {
                            marks[target] = Mark::OnPath;
                            stack.push((target, 0));
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[state] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }
    Ok(())
}

/// Fail if a final state is reachable from the start through epsilon-input
/// edges alone. A final start state counts.
pub fn check_epsilon_to_final(
    automaton: &Automaton,
    direction: Direction,
) -> Result<(), ValidationError> {
    let states = automaton.states();
    let mut seen = vec![false; states.len()];
    let mut stack = vec![Automaton::START];
    seen[Automaton::START] = true;

    while let Some(state) = stack.pop() {
        if states[state].is_final() {
            return Err(ValidationError::EpsilonToFinal { state });
        }
        for t in &states[state].transitions {
            if direction.input_of(t.pair).is_epsilon() && !seen[t.target] {
                seen[t.target] = true;
                stack.push(t.target);
            }
        }
    }
    Ok(())
}
