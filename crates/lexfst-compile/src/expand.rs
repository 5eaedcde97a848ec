// Paradigm expansion and per-entry side checks.

use std::rc::Rc;

use lexfst_core::{Alphabet, Direction, SymbolPair};

use crate::compiler::CompileOptions;
use crate::dix::{Dictionary, DixSection, Entry, EntryItem, ParadigmId};
use crate::error::CompileError;

type Path = Vec<SymbolPair>;

/// Expands entries into flat symbol-pair sequences.
///
/// Each paradigm is expanded at most once per expander; the result is
/// shared by every entry that references it.
pub struct Expander<'a> {
    dictionary: &'a Dictionary,
    options: &'a CompileOptions,
    memo: Vec<Option<Rc<Vec<Path>>>>,
    /// Paradigms currently being expanded, outermost first.
    on_path: Vec<ParadigmId>,
}

impl<'a> Expander<'a> {
    pub fn new(dictionary: &'a Dictionary, options: &'a CompileOptions) -> Self {
        Self {
            dictionary,
            options,
            memo: vec![None; dictionary.paradigms.len()],
            on_path: Vec::new(),
        }
    }

    /// Whether an entry takes part in this compilation.
    pub fn includes(&self, entry: &Entry) -> bool {
        !entry.ignored
            && entry.restriction.allows(self.options.direction)
            && self
                .options
                .accepts(entry.alt.as_deref(), entry.variant.as_deref())
    }

    /// All sequences an entry stands for: the cross product of its literal
    /// runs with every alternative of each referenced paradigm.
    pub fn expand_entry(&mut self, entry: &Entry) -> Result<Vec<Path>, CompileError> {
        let mut paths: Vec<Path> = vec![Vec::new()];
        for item in &entry.items {
            match item {
                EntryItem::Pairs(pairs) => {
                    for path in &mut paths {
                        path.extend_from_slice(pairs);
                    }
                }
                EntryItem::Paradigm(id) => {
                    let alternatives = self.expand_paradigm(*id)?;
                    let mut next = Vec::with_capacity(paths.len() * alternatives.len());
                    for prefix in &paths {
                        for alternative in alternatives.iter() {
                            let mut path = prefix.clone();
                            path.extend_from_slice(alternative);
                            next.push(path);
                        }
                    }
                    paths = next;
                }
            }
        }
        Ok(paths)
    }

    fn expand_paradigm(&mut self, id: ParadigmId) -> Result<Rc<Vec<Path>>, CompileError> {
        if let Some(done) = &self.memo[id.0] {
            return Ok(Rc::clone(done));
        }
        if let Some(start) = self.on_path.iter().position(|&p| p == id) {
            let mut names: Vec<&str> = self.on_path[start..]
                .iter()
                .map(|&p| self.dictionary.paradigm(p).name.as_str())
                .collect();
            names.push(&self.dictionary.paradigm(id).name);
            return Err(CompileError::CyclicParadigm {
                cycle: names.join(" -> "),
            });
        }

        self.on_path.push(id);
        let dictionary = self.dictionary;
        let mut alternatives = Vec::new();
        for entry in &dictionary.paradigm(id).entries {
            if self.includes(entry) {
                alternatives.extend(self.expand_entry(entry)?);
            }
        }
        self.on_path.pop();

        let alternatives = Rc::new(alternatives);
        self.memo[id.0] = Some(Rc::clone(&alternatives));
        Ok(alternatives)
    }

    /// Expand every included entry of a section and check its input side.
    pub fn expand_section(
        &mut self,
        section: &DixSection,
        alphabet: &Alphabet,
    ) -> Result<Vec<Path>, CompileError> {
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for entry in &section.entries {
            if !self.includes(entry) {
                skipped += 1;
                continue;
            }
            for path in self.expand_entry(entry)? {
                check_sides(&path, self.options.direction, alphabet, entry.line)?;
                out.push(path);
            }
        }
        tracing::debug!(
            section = %section.name(),
            entries = section.entries.len(),
            skipped,
            paths = out.len(),
            "expanded section"
        );
        Ok(out)
    }
}

/// Check the input side of one expanded entry: it must contain a symbol,
/// and its first symbol must not be whitespace.
pub fn check_sides(
    path: &[SymbolPair],
    direction: Direction,
    alphabet: &Alphabet,
    line: usize,
) -> Result<(), CompileError> {
    let side = direction.input_side();
    let first = path
        .iter()
        .map(|&pair| direction.input_of(pair))
        .find(|symbol| !symbol.is_epsilon());
    match first {
        None => Err(CompileError::EmptySide { line, side }),
        Some(symbol) if alphabet.is_whitespace(symbol) => {
            Err(CompileError::LeadingWhitespace { line, side })
        }
        Some(_) => Ok(()),
    }
}
