// Serialization of compiled dictionaries.
//
// Layout: header, letters, symbol table, then each section's name, slot count
// and 8-byte aligned slot table. Every ordering decision below is a function
// of the input alone, so identical builds give identical bytes.

use lexfst_core::{Alphabet, Direction};

use crate::FstError;
use crate::automaton::{Automaton, Section, Transition};
use crate::format::{self, Header};
use crate::symbols::{write_cstr, write_symbol_table};
use crate::transition::{MAX_SLOT_INDEX, OVERFLOW_MARK, Slot, overflow_slot};

/// Serialize a compiled dictionary.
pub fn write_dictionary(
    direction: Direction,
    letters: &str,
    alphabet: &Alphabet,
    sections: &[Section],
) -> Result<Vec<u8>, FstError> {
    let mut out = Vec::new();
    format::write_header(&mut out, &Header { direction });
    write_cstr(&mut out, letters, "letters")?;
    write_symbol_table(&mut out, alphabet.strings())?;

    let section_count = u16::try_from(sections.len())
        .map_err(|_| FstError::InvalidSection(format!("too many sections: {}", sections.len())))?;
    out.extend_from_slice(&section_count.to_le_bytes());

    for section in sections {
        if section.automaton.has_weights() {
            tracing::warn!(
                section = %section.name,
                "transition weights are not stored in the compiled format"
            );
        }
        let slots = encode_slots(&section.automaton)?;
        write_cstr(&mut out, &section.name, "section name")?;
        out.extend_from_slice(&(slots.len() as u32).to_le_bytes());
        let partial = out.len() % 8;
        if partial > 0 {
            out.extend(std::iter::repeat_n(0u8, 8 - partial));
        }
        out.extend_from_slice(bytemuck::cast_slice(&slots));

        tracing::debug!(
            section = %section.name,
            states = section.automaton.state_count(),
            transitions = section.automaton.transition_count(),
            slots = slots.len(),
            "serialized section"
        );
    }

    Ok(out)
}

/// Order a state's transitions for output.
fn sorted_transitions(automaton: &Automaton, state: usize) -> Vec<Transition> {
    let mut transitions = automaton.state(state).transitions.clone();
    transitions.sort_by(|a, b| {
        (a.pair.input, a.pair.output, a.target).cmp(&(b.pair.input, b.pair.output, b.target))
    });
    transitions
}

/// Number of slots a state with `entries` final markers and transitions needs.
fn slot_count(entries: usize) -> usize {
    match entries {
        0 => 1,
        n if n - 1 < OVERFLOW_MARK as usize => n,
        n => n + 1,
    }
}

/// Lay out the reachable part of `automaton` as a slot table.
///
/// States are numbered breadth-first from the start state, following
/// transitions in sorted order; the start state therefore sits at slot 0.
pub fn encode_slots(automaton: &Automaton) -> Result<Vec<Slot>, FstError> {
    let mut order = Vec::new();
    let mut seen = vec![false; automaton.state_count()];
    let mut queue = std::collections::VecDeque::from([Automaton::START]);
    seen[Automaton::START] = true;
    let mut sorted: Vec<Vec<Transition>> = vec![Vec::new(); automaton.state_count()];

    while let Some(state) = queue.pop_front() {
        order.push(state);
        let transitions = sorted_transitions(automaton, state);
        for t in &transitions {
            if !seen[t.target] {
                seen[t.target] = true;
                queue.push_back(t.target);
            }
        }
        sorted[state] = transitions;
    }

    // First pass: slot index of every reachable state.
    let mut base = vec![0usize; automaton.state_count()];
    let mut total = 0usize;
    for &state in &order {
        base[state] = total;
        let entries = sorted[state].len() + usize::from(automaton.state(state).is_final());
        total += slot_count(entries);
    }
    if total > MAX_SLOT_INDEX + 1 {
        return Err(FstError::TooManySlots { count: total });
    }

    // Second pass: emit.
    let mut slots = Vec::with_capacity(total);
    for &state in &order {
        let mut entries = Vec::new();
        if automaton.state(state).is_final() {
            entries.push(Slot::final_marker());
        }
        for t in &sorted[state] {
            entries.push(Slot::new(
                t.pair.input.id(),
                t.pair.output.id(),
                base[t.target] as u32,
                0,
            ));
        }

        match entries.len() {
            0 => slots.push(Slot::dead()),
            n if n - 1 < OVERFLOW_MARK as usize => {
                entries[0].set_more_transitions((n - 1) as u8);
                slots.extend_from_slice(&entries);
            }
            n => {
                entries[0].set_more_transitions(OVERFLOW_MARK);
                slots.push(entries[0]);
                slots.push(overflow_slot((n - 1) as u32));
                slots.extend_from_slice(&entries[1..]);
            }
        }
    }
    debug_assert_eq!(slots.len(), total);

    Ok(slots)
}
