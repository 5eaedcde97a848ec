// Compilation pipeline: source sections -> validated, oriented automata ->
// compiled bytes.

use std::path::Path;

use lexfst_core::{Alphabet, Direction};
use lexfst_fst::validate::validate;
use lexfst_fst::writer::write_dictionary;
use lexfst_fst::{Section, TrieBuilder};

use crate::error::CompileError;
use crate::source::{SectionInput, Source, SourceFile};

/// Options for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub direction: Direction,
    /// Selects entries carrying a matching `alt` attribute.
    pub alt: Option<String>,
    /// Selects entries carrying a matching `v` attribute.
    pub variant: Option<String>,
}

impl CompileOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn with_alt(mut self, alt: Option<String>) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_variant(mut self, variant: Option<String>) -> Self {
        self.variant = variant;
        self
    }

    /// Entries without `alt`/`v` always match; entries with one match only
    /// the same selection.
    pub fn accepts(&self, alt: Option<&str>, variant: Option<&str>) -> bool {
        let matches = |wanted: &Option<String>, given: Option<&str>| match given {
            None => true,
            Some(given) => wanted.as_deref() == Some(given),
        };
        matches(&self.alt, alt) && matches(&self.variant, variant)
    }
}

/// Result of a successful compilation, ready to serialize.
#[derive(Debug, Clone)]
pub struct CompiledDictionary {
    pub direction: Direction,
    pub letters: String,
    pub alphabet: Alphabet,
    /// Oriented sections in source order. Sections that accept nothing are
    /// left out.
    pub sections: Vec<Section>,
}

impl CompiledDictionary {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CompileError> {
        Ok(write_dictionary(
            self.direction,
            &self.letters,
            &self.alphabet,
            &self.sections,
        )?)
    }
}

/// Run a source through expansion, validation, building and orientation.
pub fn compile<S: Source>(
    source: S,
    options: &CompileOptions,
) -> Result<CompiledDictionary, CompileError> {
    let direction = options.direction;
    let unit = source.into_sections(options)?;

    let mut sections = Vec::with_capacity(unit.sections.len());
    for section in unit.sections {
        let mut automaton = match section.input {
            SectionInput::Paths(paths) => {
                let mut builder = TrieBuilder::new();
                for path in &paths {
                    builder.insert(path);
                }
                tracing::debug!(section = %section.name, paths = builder.path_count(), "built trie");
                builder.finish()
            }
            SectionInput::Graph(automaton) => automaton,
        };

        validate(&automaton, direction).map_err(|source| CompileError::Validation {
            section: section.name.clone(),
            source,
        })?;
        automaton.orient(direction);

        if automaton.is_empty() {
            tracing::warn!(section = %section.name, "section accepts nothing; left out");
            continue;
        }
        tracing::debug!(
            section = %section.name,
            states = automaton.state_count(),
            transitions = automaton.transition_count(),
            "built section"
        );
        sections.push(Section::new(section.name, automaton));
    }

    Ok(CompiledDictionary {
        direction,
        letters: unit.letters,
        alphabet: unit.alphabet,
        sections,
    })
}

/// Compile and serialize in one step.
pub fn compile_to_bytes<S: Source>(
    source: S,
    options: &CompileOptions,
) -> Result<Vec<u8>, CompileError> {
    compile(source, options)?.to_bytes()
}

/// Compile the dictionary at `path`, its format chosen by extension.
pub fn compile_file(
    path: &Path,
    options: &CompileOptions,
) -> Result<CompiledDictionary, CompileError> {
    compile(SourceFile::read(path)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{AttSource, DixSource};
    use lexfst_fst::CompiledTransducer;
    use lexfst_fst::validate::ValidationError;

    const DIX: &str = r#"<dictionary>
  <alphabet>abc</alphabet>
  <sdefs><sdef n="n"/></sdefs>
  <section id="main" type="standard">
    <e><p><l>abc</l><r>ab<s n="n"/></r></p></e>
  </section>
  <section id="empty" type="standard"/>
</dictionary>"#;

    #[test]
    fn options_select_entries() {
        let plain = CompileOptions::default();
        assert!(plain.accepts(None, None));
        assert!(!plain.accepts(Some("x"), None));
        let chosen = CompileOptions::new(Direction::Rl).with_alt(Some("x".to_string()));
        assert_eq!(chosen.direction, Direction::Rl);
        assert!(chosen.accepts(Some("x"), None));
        assert!(!chosen.accepts(Some("y"), None));
        assert!(!chosen.accepts(None, Some("v")));
    }

    #[test]
    fn compiles_both_directions() {
        let lr = compile(DixSource::new(DIX), &CompileOptions::default()).unwrap();
        // The empty section is left out.
        assert_eq!(lr.sections.len(), 1);
        let t = CompiledTransducer::from_bytes(&lr.to_bytes().unwrap()).unwrap();
        assert_eq!(t.lookup("abc"), vec!["ab<n>"]);

        let rl = compile_to_bytes(DixSource::new(DIX), &CompileOptions::new(Direction::Rl)).unwrap();
        let t = CompiledTransducer::from_bytes(&rl).unwrap();
        assert_eq!(t.direction(), Direction::Rl);
        assert_eq!(t.lookup("ab<n>"), vec!["abc"]);
        assert!(t.lookup("abc").is_empty());
    }

    #[test]
    fn identical_input_gives_identical_bytes() {
        let first = compile_to_bytes(DixSource::new(DIX), &CompileOptions::default()).unwrap();
        let second = compile_to_bytes(DixSource::new(DIX), &CompileOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn att_epsilon_checks() {
        let looped = AttSource::new("0\t1\tc\tc\n1\t1\t@0@\ta\n1\t2\tt\tt\n2\n");
        let err = compile(looped, &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Validation { source: ValidationError::EpsilonCycle { .. }, .. }
        ));

        let to_final = AttSource::new("0\t1\t@0@\t@0@\n0\t2\tc\tc\n1\n2\n");
        let err = compile(to_final, &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Validation { source: ValidationError::EpsilonToFinal { .. }, .. }
        ));
    }

    #[test]
    fn att_weighted_final_start_is_rejected() {
        // The start state itself is final, so the empty input is accepted.
        let text = "0\t0.5\n0\t1\tc\tc\n1\n";
        let err = compile(AttSource::new(text), &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Validation { source: ValidationError::EpsilonToFinal { state: 0 }, .. }
        ));
    }

    #[test]
    fn att_punctuation_section_is_written_when_present() {
        let text = "0\t1\tc\tc\n1\t2\ta\ta\n2\t3\tt\tt\n3\n0\t4\t.\t.\n4\n";
        let compiled = compile(AttSource::new(text), &CompileOptions::default()).unwrap();
        let names: Vec<&str> = compiled.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["main@standard", "final@inconditional"]);
        let t = CompiledTransducer::from_bytes(&compiled.to_bytes().unwrap()).unwrap();
        assert_eq!(t.lookup("cat"), vec!["cat"]);
        assert_eq!(t.lookup("."), vec!["."]);

        let words_only = compile(AttSource::new("0\t1\tc\tc\n1\n"), &CompileOptions::default()).unwrap();
        assert_eq!(words_only.sections.len(), 1);
    }

    #[test]
    fn att_output_epsilon_matters_only_in_rl() {
        // a:ε loop on state 1 consumes input in lr but not in rl.
        let text = "0\t1\tc\tc\n1\t1\ta\t@0@\n1\t2\tt\tt\n2\n";
        let lr = compile(AttSource::new(text), &CompileOptions::default()).unwrap();
        let t = CompiledTransducer::from_bytes(&lr.to_bytes().unwrap()).unwrap();
        assert_eq!(t.lookup("caat"), vec!["ct"]);

        let err = compile(AttSource::new(text), &CompileOptions::new(Direction::Rl)).unwrap_err();
        assert!(matches!(err, CompileError::Validation { .. }));
    }

    #[test]
    fn structural_errors_abort() {
        let text = r#"<dictionary><section id="m" type="standard">
            <e><p><l> a</l><r>a</r></p></e>
        </section></dictionary>"#;
        let err = compile(DixSource::new(text), &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::LeadingWhitespace { line: 2, side: "left" }));
        assert!(compile(DixSource::new(text), &CompileOptions::new(Direction::Rl)).is_ok());
    }
}
