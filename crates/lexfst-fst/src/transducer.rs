// Compiled dictionary loading and lookup.

use std::collections::VecDeque;
use std::fmt::Write as _;

use lexfst_core::Direction;

use crate::config::TraversalConfig;
use crate::format::{self, HEADER_SIZE};
use crate::symbols::{self, SymbolTable, read_cstr};
use crate::transition::{DEAD_SYM, FINAL_SYM, OVERFLOW_MARK, Slot, max_tc};
use crate::{DEFAULT_BUFFER_SIZE, FstError, MAX_LOOP_COUNT};

/// Upper bound on the outputs collected for one lookup.
pub const MAX_RESULTS: usize = 100;

/// One named slot table of a compiled dictionary.
pub struct SectionTransducer {
    name: String,
    slots: Vec<Slot>,
}

impl SectionTransducer {
    /// Section name, e.g. `main@standard`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether a state is the head of an overflowed run of slots.
    #[inline]
    fn has_overflow_cell(&self, state_idx: u32) -> bool {
        self.slots[state_idx as usize].more_transitions() == OVERFLOW_MARK
    }

    /// Slot indices of every state head reachable from the start, ascending.
    fn state_heads(&self) -> Vec<u32> {
        let mut seen = vec![false; self.slots.len()];
        let mut queue = VecDeque::from([0u32]);
        seen[0] = true;
        let mut heads = Vec::new();
        while let Some(head) = queue.pop_front() {
            heads.push(head);
            for slot in self.state_slots(head) {
                if slot.sym_in != FINAL_SYM && slot.sym_in != DEAD_SYM {
                    let target = slot.target_state();
                    if !seen[target as usize] {
                        seen[target as usize] = true;
                        queue.push_back(target);
                    }
                }
            }
        }
        heads.sort_unstable();
        heads
    }

    /// Slots of the state at `head`, overflow cell excluded.
    fn state_slots(&self, head: u32) -> impl Iterator<Item = &Slot> {
        let last = head + max_tc(&self.slots, head);
        let skip = self.has_overflow_cell(head).then_some(head + 1);
        (head..=last)
            .filter(move |&i| Some(i) != skip)
            .map(|i| &self.slots[i as usize])
    }

    /// Check every reachable state before the slot table is trusted.
    fn validate(&self, symbol_count: usize) -> Result<(), FstError> {
        let len = self.slots.len();
        let invalid = |what: String| FstError::InvalidSection(format!("{}: {what}", self.name));

        let mut seen = vec![false; len];
        let mut queue = VecDeque::from([0usize]);
        seen[0] = true;
        while let Some(head) = queue.pop_front() {
            let more = self.slots[head].more_transitions();
            if more == OVERFLOW_MARK && head + 1 >= len {
                return Err(invalid(format!("state {head} has a truncated overflow cell")));
            }
            let last = head as u64 + max_tc(&self.slots, head as u32) as u64;
            if last >= len as u64 {
                return Err(invalid(format!("state {head} runs past the slot table")));
            }
            for i in head..=last as usize {
                if more == OVERFLOW_MARK && i == head + 1 {
                    continue;
                }
                let slot = &self.slots[i];
                match slot.sym_in {
                    FINAL_SYM | DEAD_SYM => {}
                    sym_in => {
                        if sym_in as usize >= symbol_count || slot.sym_out as usize >= symbol_count {
                            return Err(invalid(format!("slot {i} uses an unknown symbol")));
                        }
                        let target = slot.target_state() as usize;
                        if target >= len {
                            return Err(invalid(format!("slot {i} targets {target} out of range")));
                        }
                        if !seen[target] {
                            seen[target] = true;
                            queue.push_back(target);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A compiled dictionary loaded for lookup.
///
/// Every section is tried for each input; an input that no section accepts
/// has no outputs.
pub struct CompiledTransducer {
    direction: Direction,
    letters: String,
    symbols: SymbolTable,
    sections: Vec<SectionTransducer>,
    /// Sentinel symbol index for unknown input characters.
    unknown_symbol_ordinal: u16,
}

impl std::fmt::Debug for CompiledTransducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTransducer")
            .field("direction", &self.direction)
            .field("symbol_count", &self.symbols.len())
            .field("sections", &self.section_names().collect::<Vec<_>>())
            .finish()
    }
}

impl CompiledTransducer {
    /// Load a compiled dictionary from its serialized bytes.
    ///
    /// Slot tables are copied into owned `Vec<Slot>`s; the source slice need
    /// not be 8-byte aligned.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FstError> {
        let header = format::parse_header(data)?;
        let (letters, pos) = read_cstr(data, HEADER_SIZE, "letters")?;
        let (symbols, mut pos) = symbols::parse_symbol_table(data, pos)?;

        let section_count = read_u16(data, pos)?;
        pos += 2;

        let mut sections = Vec::with_capacity(section_count as usize);
        for _ in 0..section_count {
            let (name, next) = read_cstr(data, pos, "section name")?;
            pos = next;
            let slot_count = read_u32(data, pos)? as usize;
            pos += 4;
            let partial = pos % 8;
            if partial > 0 {
                pos += 8 - partial;
            }
            if slot_count == 0 {
                return Err(FstError::InvalidSection(format!("{name}: no slots")));
            }
            let byte_len = slot_count
                .checked_mul(size_of::<Slot>())
                .ok_or_else(|| FstError::InvalidSection(format!("{name}: slot count overflow")))?;
            let end = pos + byte_len;
            if end > data.len() {
                return Err(FstError::TooShort {
                    expected: end,
                    actual: data.len(),
                });
            }

            let mut slots = vec![Slot::dead(); slot_count];
            bytemuck::cast_slice_mut::<Slot, u8>(&mut slots).copy_from_slice(&data[pos..end]);
            pos = end;

            let section = SectionTransducer { name, slots };
            section.validate(symbols.len())?;
            sections.push(section);
        }

        if pos != data.len() {
            return Err(FstError::InvalidSection(format!(
                "{} trailing bytes after the last section",
                data.len() - pos
            )));
        }

        let unknown_symbol_ordinal = symbols.len() as u16;
        tracing::debug!(
            direction = %header.direction,
            symbols = symbols.len(),
            sections = sections.len(),
            "loaded compiled dictionary"
        );

        Ok(Self {
            direction: header.direction,
            letters,
            symbols,
            sections,
            unknown_symbol_ordinal,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Characters the dictionary treats as word characters.
    pub fn letters(&self) -> &str {
        &self.letters
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn sections(&self) -> &[SectionTransducer] {
        &self.sections
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Create a new configuration suitable for this transducer.
    pub fn new_config(&self, buffer_size: usize) -> TraversalConfig {
        TraversalConfig::new(buffer_size)
    }

    /// Prepare the configuration for traversing with the given input.
    ///
    /// Returns `true` if every input symbol is known. Unknown characters are
    /// mapped to `unknown_symbol_ordinal`, which no slot carries, so traversal
    /// can proceed but never matches them.
    pub fn prepare(&self, config: &mut TraversalConfig, input: &str) -> bool {
        config.reset();
        self.symbols
            .map_input(input, self.unknown_symbol_ordinal, &mut config.input_symbols)
    }

    /// Yield the next output of `section` for the prepared input.
    ///
    /// Only matches when the entire input has been consumed. Returns `false`
    /// when no more outputs exist, the stack is full, or the loop limit was
    /// reached.
    pub fn next(
        &self,
        section: &SectionTransducer,
        config: &mut TraversalConfig,
        output: &mut String,
    ) -> bool {
        let slots = &section.slots;
        if config.buffer_size < 2 {
            return false;
        }

        let mut loop_counter: u32 = 0;

        'outer: while loop_counter < MAX_LOOP_COUNT {
            let state_idx = config.state_index_stack[config.stack_depth];
            let current_idx = config.current_transition_stack[config.stack_depth];
            let start_transition_index = current_idx - state_idx;
            let max_tc = max_tc(slots, state_idx);
            let overflowed = section.has_overflow_cell(state_idx);

            let mut tc = start_transition_index;
            let mut trans_idx = current_idx;

            while tc <= max_tc {
                if tc == 1 && overflowed {
                    // Skip overflow cell
                    tc += 1;
                    trans_idx += 1;
                }

                let current_transition = &slots[trans_idx as usize];

                if current_transition.sym_in == FINAL_SYM {
                    if config.input_depth == config.input_length() {
                        output.clear();
                        for &out_sym in &config.output_symbol_stack[..config.stack_depth] {
                            output.push_str(&self.symbols.symbol_strings[out_sym as usize]);
                        }
                        config.current_transition_stack[config.stack_depth] = trans_idx + 1;
                        return true;
                    }
                } else if current_transition.sym_in == 0
                    || (config.input_depth < config.input_length()
                        && config.input_symbols[config.input_depth] == current_transition.sym_in)
                {
                    // Push down
                    if config.stack_depth + 2 >= config.buffer_size {
                        tracing::debug!(
                            section = %section.name,
                            depth = config.stack_depth,
                            "traversal stack full"
                        );
                        return false;
                    }

                    config.output_symbol_stack[config.stack_depth] = current_transition.sym_out;
                    config.current_transition_stack[config.stack_depth] = trans_idx;
                    config.stack_depth += 1;
                    config.state_index_stack[config.stack_depth] =
                        current_transition.target_state();
                    config.current_transition_stack[config.stack_depth] =
                        current_transition.target_state();
                    if current_transition.sym_in != 0 {
                        config.input_depth += 1;
                    }
                    loop_counter += 1;
                    continue 'outer;
                }

                tc += 1;
                trans_idx += 1;
            }

            // All slots exhausted at this depth
            if config.stack_depth == 0 {
                return false;
            }

            // Pop (backtrack up)
            config.stack_depth -= 1;
            let prev_trans_idx = config.current_transition_stack[config.stack_depth];
            if slots[prev_trans_idx as usize].sym_in != 0 {
                config.input_depth -= 1;
            }
            config.current_transition_stack[config.stack_depth] += 1;

            loop_counter += 1;
        }

        tracing::debug!(section = %section.name, "traversal loop limit reached");
        false
    }

    /// All distinct outputs of every section for `input`, in discovery order.
    ///
    /// The traversal stack grows with the input (see [`stack_depth_for`]): a
    /// path is found as long as its non-consuming steps number at most the
    /// input length plus [`DEFAULT_BUFFER_SIZE`].
    pub fn lookup(&self, input: &str) -> Vec<String> {
        let mut config = self.new_config(DEFAULT_BUFFER_SIZE);
        self.lookup_with(&mut config, input)
    }

    /// Like [`lookup`](Self::lookup), reusing a caller-owned configuration.
    /// Its stacks are grown when the input needs more depth.
    pub fn lookup_with(&self, config: &mut TraversalConfig, input: &str) -> Vec<String> {
        let mut results: Vec<String> = Vec::new();
        if !self.prepare(config, input) {
            return results;
        }
        config.reserve_depth(stack_depth_for(config.input_length()));
        let mut output = String::new();
        for section in &self.sections {
            config.rewind();
            while results.len() < MAX_RESULTS && self.next(section, config, &mut output) {
                if !results.contains(&output) {
                    results.push(output.clone());
                }
            }
        }
        results
    }

    /// Render every section as tab-separated automaton text.
    ///
    /// States are numbered by slot order, so the start state is 0. Sections
    /// are separated by a `--` line.
    pub fn to_att(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push_str("--\n");
            }
            let heads = section.state_heads();
            let number = |slot: u32| heads.binary_search(&slot).unwrap_or_default();
            for (state, &head) in heads.iter().enumerate() {
                for slot in section.state_slots(head) {
                    match slot.sym_in {
                        FINAL_SYM => {
                            let _ = writeln!(out, "{state}");
                        }
                        DEAD_SYM => {}
                        _ => {
                            let _ = writeln!(
                                out,
                                "{state}\t{}\t{}\t{}",
                                number(slot.target_state()),
                                self.att_symbol(slot.sym_in),
                                self.att_symbol(slot.sym_out)
                            );
                        }
                    }
                }
            }
        }
        out
    }

    fn att_symbol(&self, id: u16) -> &str {
        match self.symbols.symbol_strings[id as usize].as_str() {
            "" => "ε",
            " " => "@_SPACE_@",
            "\t" => "@_TAB_@",
            text => text,
        }
    }
}

/// Stack depth used by [`CompiledTransducer::lookup`] for an input of
/// `input_length` symbols.
pub fn stack_depth_for(input_length: usize) -> usize {
    DEFAULT_BUFFER_SIZE + 2 * input_length
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16, FstError> {
    data.get(pos..pos + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(FstError::TooShort {
            expected: pos + 2,
            actual: data.len(),
        })
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, FstError> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FstError::TooShort {
            expected: pos + 4,
            actual: data.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, Section};
    use crate::writer::write_dictionary;
    use lexfst_core::{Alphabet, Symbol, SymbolPair};

    /// Build a dictionary from `(input, output)` string pairs, one section,
    /// with one symbol per character and `ε` for an empty side.
    fn build(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut alphabet = Alphabet::new();
        let mut a = Automaton::new();
        for (input, output) in entries {
            let ins: Vec<Symbol> = input.chars().map(|c| alphabet.intern_char(c).unwrap()).collect();
            let outs: Vec<Symbol> = output.chars().map(|c| alphabet.intern_char(c).unwrap()).collect();
            let mut state = Automaton::START;
            for i in 0..ins.len().max(outs.len()) {
                let pair = SymbolPair::new(
                    ins.get(i).copied().unwrap_or(Symbol::EPSILON),
                    outs.get(i).copied().unwrap_or(Symbol::EPSILON),
                );
                let next = a.add_state();
                a.add_transition(state, pair, next, 0.0);
                state = next;
            }
            a.set_final(state, 0.0);
        }
        let sections = vec![Section::new("main@standard", a)];
        write_dictionary(Direction::Lr, "abxy", &alphabet, &sections).unwrap()
    }

    #[test]
    fn load_simple_transducer() {
        let data = build(&[("ab", "xy")]);
        let t = CompiledTransducer::from_bytes(&data).unwrap();
        assert_eq!(t.direction(), Direction::Lr);
        assert_eq!(t.letters(), "abxy");
        assert_eq!(t.section_names().collect::<Vec<_>>(), vec!["main@standard"]);
        assert_eq!(t.symbols().len(), 5);
    }

    #[test]
    fn traverse_simple_ab_to_xy() {
        let t = CompiledTransducer::from_bytes(&build(&[("ab", "xy")])).unwrap();
        assert_eq!(t.lookup("ab"), vec!["xy"]);
    }

    #[test]
    fn traverse_unknown_input() {
        let t = CompiledTransducer::from_bytes(&build(&[("ab", "xy")])).unwrap();
        let mut config = t.new_config(100);
        assert!(!t.prepare(&mut config, "aq"));
        assert!(t.lookup("aq").is_empty());
    }

    #[test]
    fn traverse_partial_input_no_match() {
        let t = CompiledTransducer::from_bytes(&build(&[("ab", "xy")])).unwrap();
        assert!(t.lookup("a").is_empty());
        assert!(t.lookup("abb").is_empty());
        assert!(t.lookup("").is_empty());
    }

    #[test]
    fn traverse_epsilon_input() {
        // "a" -> "xy": second pair is ε:y
        let t = CompiledTransducer::from_bytes(&build(&[("a", "xy")])).unwrap();
        assert_eq!(t.lookup("a"), vec!["xy"]);
    }

    #[test]
    fn multiple_outputs() {
        let t = CompiledTransducer::from_bytes(&build(&[("ab", "xy"), ("ab", "yx"), ("ab", "xy")]))
            .unwrap();
        let mut outputs = t.lookup("ab");
        outputs.sort();
        assert_eq!(outputs, vec!["xy", "yx"]);
    }

    #[test]
    fn dictionary_without_sections() {
        let data = write_dictionary(Direction::Rl, "", &Alphabet::new(), &[]).unwrap();
        let t = CompiledTransducer::from_bytes(&data).unwrap();
        assert_eq!(t.direction(), Direction::Rl);
        assert!(t.sections().is_empty());
        assert!(t.lookup("abc").is_empty());
        assert_eq!(t.to_att(), "");
    }

    #[test]
    fn wide_state_is_traversed() {
        let mut alphabet = Alphabet::new();
        let mut a = Automaton::new();
        let end = a.add_state();
        a.set_final(end, 0.0);
        for c in (0x4E00u32..0x4E00 + 300).filter_map(char::from_u32) {
            let sym = alphabet.intern_char(c).unwrap();
            a.add_transition(0, SymbolPair::identity(sym), end, 0.0);
        }
        let data = write_dictionary(Direction::Lr, "", &alphabet, &[Section::new("s@standard", a)])
            .unwrap();
        let t = CompiledTransducer::from_bytes(&data).unwrap();
        assert_eq!(t.lookup("\u{4E00}"), vec!["\u{4E00}"]);
        assert_eq!(t.lookup("\u{4E01}"), vec!["\u{4E01}"]);
        assert_eq!(t.lookup("\u{4F2B}"), vec!["\u{4F2B}"]);
        assert!(t.lookup("\u{4E00}\u{4E00}").is_empty());
    }

    #[test]
    fn small_buffer_gives_up() {
        let t = CompiledTransducer::from_bytes(&build(&[("abab", "xyxy")])).unwrap();
        let mut config = t.new_config(3);
        assert!(t.lookup_with(&mut config, "abab").is_empty());
        let mut config = t.new_config(16);
        assert_eq!(t.lookup_with(&mut config, "abab"), vec!["xyxy"]);
    }

    #[test]
    fn reject_truncated_data() {
        let data = build(&[("ab", "xy")]);
        let err = CompiledTransducer::from_bytes(&data[..data.len() - 4]).unwrap_err();
        assert!(matches!(err, FstError::TooShort { .. }));
    }

    #[test]
    fn reject_trailing_data() {
        let mut data = build(&[("ab", "xy")]);
        data.push(0);
        let err = CompiledTransducer::from_bytes(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidSection(_)));
    }

    #[test]
    fn reject_out_of_range_target() {
        let mut data = build(&[("ab", "xy")]);
        // First slot of the only section: point its target past the end.
        let first_slot = data.len() - 3 * 8;
        data[first_slot + 4..first_slot + 7].copy_from_slice(&[0xFF, 0xFF, 0x00]);
        let err = CompiledTransducer::from_bytes(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidSection(_)));
    }

    #[test]
    fn reject_unknown_symbol() {
        let mut data = build(&[("ab", "xy")]);
        let first_slot = data.len() - 3 * 8;
        data[first_slot..first_slot + 2].copy_from_slice(&0x0100u16.to_le_bytes());
        let err = CompiledTransducer::from_bytes(&data).unwrap_err();
        assert!(matches!(err, FstError::InvalidSection(_)));
    }

    #[test]
    fn att_dump() {
        let mut alphabet = Alphabet::new();
        let a_sym = alphabet.intern_char('a').unwrap();
        let space = alphabet.intern_char(' ').unwrap();
        let tag = alphabet.intern_tag("n").unwrap();
        let mut a = Automaton::new();
        let s1 = a.add_state();
        let s2 = a.add_state();
        a.add_transition(0, SymbolPair::new(a_sym, space), s1, 0.0);
        a.add_transition(s1, SymbolPair::new(Symbol::EPSILON, tag), s2, 0.0);
        a.set_final(s2, 0.0);
        let sections = vec![
            Section::new("main@standard", a.clone()),
            Section::new("extra@standard", a),
        ];
        let data = write_dictionary(Direction::Lr, "a", &alphabet, &sections).unwrap();
        let t = CompiledTransducer::from_bytes(&data).unwrap();
        let expected = "0\t1\ta\t@_SPACE_@\n1\t2\tε\t<n>\n2\n";
        assert_eq!(t.to_att(), format!("{expected}--\n{expected}"));
    }

    #[test]
    fn long_entry_is_found() {
        let word = "a".repeat(2500);
        let t = CompiledTransducer::from_bytes(&build(&[(&word, "x")])).unwrap();
        assert_eq!(t.lookup(&word), vec!["x"]);

        // A caller-owned small config is grown as needed.
        let mut config = t.new_config(16);
        assert_eq!(t.lookup_with(&mut config, &word), vec!["x"]);
        assert!(config.buffer_size >= stack_depth_for(2500));
    }
}
