// Dictionary sources: the two input formats behind one interface.

use std::path::Path;

use lexfst_core::{Alphabet, SymbolPair};
use lexfst_fst::Automaton;
use lexfst_fst::att::parse_att;
use lexfst_fst::validate::validate;

use crate::compiler::CompileOptions;
use crate::dix::parse_dictionary;
use crate::error::CompileError;
use crate::expand::Expander;

/// What one section of a source contributes to the build.
#[derive(Debug, Clone)]
pub enum SectionInput {
    /// Expanded entries, each a left/right symbol-pair sequence.
    Paths(Vec<Vec<SymbolPair>>),
    /// A finished graph, read as written.
    Graph(Automaton),
}

#[derive(Debug, Clone)]
pub struct SourceSection {
    /// Compiled section name, `id@type`.
    pub name: String,
    pub input: SectionInput,
}

/// Everything a source yields for one compilation.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub alphabet: Alphabet,
    pub letters: String,
    pub sections: Vec<SourceSection>,
}

/// A dictionary source that can be turned into sections.
pub trait Source {
    fn into_sections(self, options: &CompileOptions) -> Result<SourceUnit, CompileError>;
}

/// Dictionary markup (`.dix`).
#[derive(Debug, Clone)]
pub struct DixSource {
    text: String,
}

impl DixSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Source for DixSource {
    fn into_sections(self, options: &CompileOptions) -> Result<SourceUnit, CompileError> {
        let mut alphabet = Alphabet::new();
        let dictionary = parse_dictionary(&self.text, &mut alphabet)?;
        let mut expander = Expander::new(&dictionary, options);

        let mut sections = Vec::with_capacity(dictionary.sections.len());
        for section in &dictionary.sections {
            let paths = expander.expand_section(section, &alphabet)?;
            sections.push(SourceSection {
                name: section.name(),
                input: SectionInput::Paths(paths),
            });
        }

        Ok(SourceUnit {
            alphabet,
            letters: dictionary.letters,
            sections,
        })
    }
}

/// Tab-separated automaton text (`.att`).
#[derive(Debug, Clone)]
pub struct AttSource {
    text: String,
}

impl AttSource {
    /// Section holding the word paths of an automaton text.
    pub const SECTION_NAME: &'static str = "main@standard";
    /// Section holding the punctuation paths, present only when there are any.
    pub const PUNCT_SECTION_NAME: &'static str = "final@inconditional";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Source for AttSource {
    fn into_sections(self, options: &CompileOptions) -> Result<SourceUnit, CompileError> {
        let mut alphabet = Alphabet::new();
        let parsed = parse_att(&self.text, &mut alphabet)?;
        // The whole graph is checked before the split can hide a bad path.
        validate(&parsed.automaton, options.direction).map_err(|source| {
            CompileError::Validation {
                section: Self::SECTION_NAME.to_string(),
                source,
            }
        })?;

        let (words, punct) = parsed.split(&alphabet, options.direction);
        tracing::debug!(
            words = words.transition_count(),
            punct = punct.transition_count(),
            "split automaton text"
        );
        let mut sections = vec![SourceSection {
            name: Self::SECTION_NAME.to_string(),
            input: SectionInput::Graph(words),
        }];
        if punct.transition_count() > 0 {
            sections.push(SourceSection {
                name: Self::PUNCT_SECTION_NAME.to_string(),
                input: SectionInput::Graph(punct),
            });
        }

        Ok(SourceUnit {
            alphabet,
            letters: parsed.letters_string(),
            sections,
        })
    }
}

/// A source read from disk, its format chosen by file extension.
#[derive(Debug, Clone)]
pub enum SourceFile {
    Dix(DixSource),
    Att(AttSource),
}

impl SourceFile {
    /// Read `path`. A `.att` extension selects automaton text; anything else
    /// is read as markup when it starts with `<`, as automaton text otherwise.
    pub fn read(path: &Path) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_att = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("att") => true,
            Some(ext) if ext.eq_ignore_ascii_case("dix") => false,
            _ => !text.trim_start().starts_with('<'),
        };
        tracing::debug!(path = %path.display(), att = is_att, "read source");
        Ok(if is_att {
            SourceFile::Att(AttSource::new(text))
        } else {
            SourceFile::Dix(DixSource::new(text))
        })
    }
}

impl Source for SourceFile {
    fn into_sections(self, options: &CompileOptions) -> Result<SourceUnit, CompileError> {
        match self {
            SourceFile::Dix(source) => source.into_sections(options),
            SourceFile::Att(source) => source.into_sections(options),
        }
    }
}
