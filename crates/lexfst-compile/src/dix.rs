// Dictionary markup: paradigms, sections and entries.
//
// Parsing interns every symbol into the compilation's alphabet, so entries
// come out as symbol-pair runs and paradigm references, ready for expansion.

use std::fmt;
use std::str::FromStr;

use hashbrown::{HashMap, HashSet};
use lexfst_core::{Alphabet, Direction, Symbol, SymbolPair};

use crate::error::CompileError;
use crate::markup::{self, Element, Node};

/// Index of a paradigm in [`Dictionary::paradigms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParadigmId(pub usize);

/// Directions an entry takes part in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Restriction {
    #[default]
    Both,
    /// `r="LR"`: only when compiling left to right.
    LeftToRight,
    /// `r="RL"`: only when compiling right to left.
    RightToLeft,
}

impl Restriction {
    pub fn allows(self, direction: Direction) -> bool {
        match self {
            Restriction::Both => true,
            Restriction::LeftToRight => direction == Direction::Lr,
            Restriction::RightToLeft => direction == Direction::Rl,
        }
    }
}

/// One step of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryItem {
    /// Literal pairs, already aligned.
    Pairs(Vec<SymbolPair>),
    /// Splice in every alternative of a paradigm.
    Paradigm(ParadigmId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub items: Vec<EntryItem>,
    pub restriction: Restriction,
    /// `i="yes"`: kept in the source but never compiled.
    pub ignored: bool,
    pub alt: Option<String>,
    pub variant: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paradigm {
    pub name: String,
    pub entries: Vec<Entry>,
    pub line: usize,
}

/// Section types. Only the name differs in the compiled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Standard,
    Inconditional,
    Postblank,
    Preblank,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Standard => "standard",
            SectionKind::Inconditional => "inconditional",
            SectionKind::Postblank => "postblank",
            SectionKind::Preblank => "preblank",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(SectionKind::Standard),
            "inconditional" => Ok(SectionKind::Inconditional),
            "postblank" => Ok(SectionKind::Postblank),
            "preblank" => Ok(SectionKind::Preblank),
            other => Err(format!("unknown section type {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DixSection {
    pub id: String,
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
}

impl DixSection {
    /// Compiled section name, `id@type`.
    pub fn name(&self) -> String {
        format!("{}@{}", self.id, self.kind)
    }
}

/// A parsed dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    /// Contents of `<alphabet>`, whitespace removed.
    pub letters: String,
    pub paradigms: Vec<Paradigm>,
    pub sections: Vec<DixSection>,
}

impl Dictionary {
    pub fn paradigm(&self, id: ParadigmId) -> &Paradigm {
        &self.paradigms[id.0]
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> CompileError {
    CompileError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse dictionary markup, interning its symbols into `alphabet`.
pub fn parse_dictionary(text: &str, alphabet: &mut Alphabet) -> Result<Dictionary, CompileError> {
    let root = markup::parse_document(text)?;
    if root.name != "dictionary" {
        return Err(parse_error(
            root.line,
            format!("root element must be <dictionary>, found <{}>", root.name),
        ));
    }
    root.reject_text()?;

    // Paradigm names first, so references may point forward.
    let mut paradigm_ids: HashMap<String, ParadigmId> = HashMap::new();
    let mut paradigm_elements = Vec::new();
    for pardefs in root.elements().filter(|e| e.name == "pardefs") {
        pardefs.reject_text()?;
        for pardef in pardefs.elements() {
            if pardef.name != "pardef" {
                return Err(unexpected(pardef, "pardefs"));
            }
            let name = pardef.require_attr("n")?;
            if paradigm_ids.contains_key(name) {
                return Err(parse_error(
                    pardef.line,
                    format!("paradigm {name:?} is defined twice"),
                ));
            }
            paradigm_ids.insert(name.to_string(), ParadigmId(paradigm_elements.len()));
            paradigm_elements.push(pardef);
        }
    }

    let mut parser = EntryParser {
        alphabet,
        sdefs: HashSet::new(),
        paradigm_ids: &paradigm_ids,
    };
    let mut dictionary = Dictionary::default();

    for element in root.elements() {
        match element.name.as_str() {
            "alphabet" => {
                dictionary.letters = element.text().chars().filter(|c| !c.is_whitespace()).collect();
            }
            "sdefs" => {
                element.reject_text()?;
                for sdef in element.elements() {
                    if sdef.name != "sdef" {
                        return Err(unexpected(sdef, "sdefs"));
                    }
                    parser.sdefs.insert(sdef.require_attr("n")?.to_string());
                }
            }
            "pardefs" | "section" => {}
            _ => return Err(unexpected(element, "dictionary")),
        }
    }

    for pardef in &paradigm_elements {
        pardef.reject_text()?;
        let mut entries = Vec::new();
        for e in pardef.elements() {
            if e.name != "e" {
                return Err(unexpected(e, "pardef"));
            }
            entries.push(parser.entry(e)?);
        }
        dictionary.paradigms.push(Paradigm {
            name: pardef.require_attr("n")?.to_string(),
            entries,
            line: pardef.line,
        });
    }

    for element in root.elements().filter(|e| e.name == "section") {
        element.reject_text()?;
        let id = element.require_attr("id")?;
        let kind: SectionKind = element
            .require_attr("type")?
            .parse()
            .map_err(|message: String| parse_error(element.line, message))?;

        let mut entries = Vec::new();
        for e in element.elements() {
            if e.name != "e" {
                return Err(unexpected(e, "section"));
            }
            entries.push(parser.entry(e)?);
        }

        // Repeated sections of the same id and type are merged.
        match dictionary
            .sections
            .iter_mut()
            .find(|s| s.id == id && s.kind == kind)
        {
            Some(section) => section.entries.extend(entries),
            None => dictionary.sections.push(DixSection {
                id: id.to_string(),
                kind,
                entries,
            }),
        }
    }

    tracing::debug!(
        paradigms = dictionary.paradigms.len(),
        sections = dictionary.sections.len(),
        entries = dictionary.entry_count(),
        symbols = parser.alphabet.len(),
        "parsed dictionary"
    );
    Ok(dictionary)
}

fn unexpected(element: &Element, parent: &str) -> CompileError {
    parse_error(
        element.line,
        format!("unexpected <{}> inside <{parent}>", element.name),
    )
}

struct EntryParser<'a> {
    alphabet: &'a mut Alphabet,
    sdefs: HashSet<String>,
    paradigm_ids: &'a HashMap<String, ParadigmId>,
}

impl EntryParser<'_> {
    fn entry(&mut self, e: &Element) -> Result<Entry, CompileError> {
        e.reject_text()?;
        let restriction = match e.attr("r") {
            None => Restriction::Both,
            Some("LR") => Restriction::LeftToRight,
            Some("RL") => Restriction::RightToLeft,
            Some(other) => {
                return Err(parse_error(
                    e.line,
                    format!("invalid restriction r={other:?}: expected \"LR\" or \"RL\""),
                ));
            }
        };

        let mut items: Vec<EntryItem> = Vec::new();
        for child in e.elements() {
            let pairs: Vec<SymbolPair> = match child.name.as_str() {
                "i" => self
                    .side(child)?
                    .into_iter()
                    .map(SymbolPair::identity)
                    .collect(),
                "p" => self.pair(child)?,
                "par" => {
                    let name = child.require_attr("n")?;
                    let id = self.paradigm_ids.get(name).copied().ok_or_else(|| {
                        parse_error(child.line, format!("undefined paradigm {name:?}"))
                    })?;
                    items.push(EntryItem::Paradigm(id));
                    continue;
                }
                other => {
                    return Err(parse_error(
                        child.line,
                        format!("unsupported element <{other}> in entry"),
                    ));
                }
            };
            match items.last_mut() {
                Some(EntryItem::Pairs(run)) => run.extend(pairs),
                _ => items.push(EntryItem::Pairs(pairs)),
            }
        }

        Ok(Entry {
            items,
            restriction,
            ignored: e.attr("i") == Some("yes"),
            alt: e.attr("alt").map(str::to_string),
            variant: e.attr("v").map(str::to_string),
            line: e.line,
        })
    }

    /// `<p><l>…</l><r>…</r></p>`, aligned position by position.
    fn pair(&mut self, p: &Element) -> Result<Vec<SymbolPair>, CompileError> {
        p.reject_text()?;
        let children: Vec<&Element> = p.elements().collect();
        let [l, r] = children.as_slice() else {
            return Err(parse_error(p.line, "<p> must contain exactly <l> and <r>"));
        };
        if l.name != "l" || r.name != "r" {
            return Err(parse_error(p.line, "<p> must contain <l> followed by <r>"));
        }
        let left = self.side(l)?;
        let right = self.side(r)?;
        let len = left.len().max(right.len());
        Ok((0..len)
            .map(|i| {
                SymbolPair::new(
                    left.get(i).copied().unwrap_or(Symbol::EPSILON),
                    right.get(i).copied().unwrap_or(Symbol::EPSILON),
                )
            })
            .collect())
    }

    /// Symbols of an `<i>`, `<l>` or `<r>` element.
    fn side(&mut self, element: &Element) -> Result<Vec<Symbol>, CompileError> {
        let mut out = Vec::new();
        self.side_into(element, &mut out)?;
        Ok(out)
    }

    fn side_into(&mut self, element: &Element, out: &mut Vec<Symbol>) -> Result<(), CompileError> {
        for node in &element.children {
            match node {
                Node::Text { text, .. } => {
                    for c in text.chars() {
                        out.push(self.alphabet.intern_char(c)?);
                    }
                }
                Node::Element(child) => match child.name.as_str() {
                    "s" => {
                        let name = child.require_attr("n")?;
                        if !self.sdefs.contains(name) {
                            return Err(parse_error(
                                child.line,
                                format!("undefined symbol <s n={name:?}/>"),
                            ));
                        }
                        out.push(self.alphabet.intern_tag(name)?);
                    }
                    "b" => out.push(self.alphabet.intern_char(' ')?),
                    "j" => out.push(self.alphabet.intern_char('+')?),
                    "a" => out.push(self.alphabet.intern_char('~')?),
                    "g" => {
                        out.push(self.alphabet.intern_char('#')?);
                        self.side_into(child, out)?;
                    }
                    other => {
                        return Err(parse_error(
                            child.line,
                            format!("unsupported element <{other}> inside <{}>", element.name),
                        ));
                    }
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<(Dictionary, Alphabet), CompileError> {
        let mut alphabet = Alphabet::new();
        parse_dictionary(text, &mut alphabet).map(|d| (d, alphabet))
    }

    fn render(alphabet: &Alphabet, pairs: &[SymbolPair]) -> (String, String) {
        (
            alphabet.render(pairs.iter().map(|p| p.input)),
            alphabet.render(pairs.iter().map(|p| p.output)),
        )
    }

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dictionary>
  <alphabet>ab
    c</alphabet>
  <sdefs>
    <sdef n="n"/>
    <sdef n="pl"/>
  </sdefs>
  <pardefs>
    <pardef n="s__n">
      <e><p><l></l><r><s n="n"/></r></p></e>
      <e><p><l>s</l><r><s n="n"/><s n="pl"/></r></p></e>
    </pardef>
  </pardefs>
  <section id="main" type="standard">
    <e lm="cab"><i>cab</i><par n="s__n"/></e>
    <e r="LR" alt="x"><p><l>a<b/>b</l><r>a<j/><g>b</g></r></p></e>
    <e i="yes"><i>z</i></e>
  </section>
  <section id="main" type="standard">
    <e v="v1"><i>c<a/></i></e>
  </section>
  <section id="final" type="inconditional"/>
</dictionary>
"#;

    #[test]
    fn parses_structure() {
        let (dict, _) = parse(SMALL).unwrap();
        assert_eq!(dict.letters, "abc");
        assert_eq!(dict.paradigms.len(), 1);
        assert_eq!(dict.paradigms[0].name, "s__n");
        assert_eq!(dict.paradigms[0].entries.len(), 2);
        // The two "main" sections are merged.
        assert_eq!(dict.sections.len(), 2);
        assert_eq!(dict.sections[0].name(), "main@standard");
        assert_eq!(dict.sections[0].entries.len(), 4);
        assert_eq!(dict.sections[1].name(), "final@inconditional");
        assert!(dict.sections[1].entries.is_empty());
    }

    #[test]
    fn parses_entry_attributes() {
        let (dict, _) = parse(SMALL).unwrap();
        let entries = &dict.sections[0].entries;
        assert_eq!(entries[0].restriction, Restriction::Both);
        assert_eq!(entries[0].line, 16);
        assert_eq!(entries[1].restriction, Restriction::LeftToRight);
        assert_eq!(entries[1].alt.as_deref(), Some("x"));
        assert!(entries[2].ignored);
        assert_eq!(entries[3].variant.as_deref(), Some("v1"));
        assert!(Restriction::LeftToRight.allows(Direction::Lr));
        assert!(!Restriction::LeftToRight.allows(Direction::Rl));
    }

    #[test]
    fn pairs_are_aligned_and_specials_mapped() {
        let (dict, alphabet) = parse(SMALL).unwrap();
        let EntryItem::Pairs(pairs) = &dict.sections[0].entries[1].items[0] else {
            panic!("expected pairs");
        };
        assert_eq!(render(&alphabet, pairs), ("a b".to_string(), "a+#b".to_string()));
        assert_eq!(pairs.len(), 4);
        assert!(pairs[3].input.is_epsilon());

        let EntryItem::Pairs(pairs) = &dict.sections[0].entries[3].items[0] else {
            panic!("expected pairs");
        };
        assert_eq!(render(&alphabet, pairs), ("c~".to_string(), "c~".to_string()));
    }

    #[test]
    fn paradigm_references_are_resolved() {
        let (dict, alphabet) = parse(SMALL).unwrap();
        let items = &dict.sections[0].entries[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], EntryItem::Paradigm(ParadigmId(0)));
        let EntryItem::Pairs(pairs) = &dict.paradigm(ParadigmId(0)).entries[1].items[0] else {
            panic!("expected pairs");
        };
        assert_eq!(render(&alphabet, pairs), ("s".to_string(), "<n><pl>".to_string()));
    }

    #[test]
    fn forward_paradigm_reference() {
        let text = r#"<dictionary><pardefs>
            <pardef n="a"><e><i>x</i><par n="b"/></e></pardef>
            <pardef n="b"><e><i>y</i></e></pardef>
        </pardefs></dictionary>"#;
        let (dict, _) = parse(text).unwrap();
        assert_eq!(
            dict.paradigms[0].entries[0].items[1],
            EntryItem::Paradigm(ParadigmId(1))
        );
    }

    fn parse_line(text: &str) -> usize {
        match parse(text) {
            Err(CompileError::Parse { line, .. }) => line,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_dictionaries() {
        // undeclared tag
        assert_eq!(
            parse_line("<dictionary>\n<section id=\"m\" type=\"standard\">\n<e><i><s n=\"n\"/></i></e></section></dictionary>"),
            3
        );
        // undefined paradigm
        assert_eq!(
            parse_line("<dictionary><section id=\"m\" type=\"standard\">\n\n<e><par n=\"nope\"/></e></section></dictionary>"),
            3
        );
        // unknown section type
        assert_eq!(
            parse_line("<dictionary>\n<section id=\"m\" type=\"odd\"/></dictionary>"),
            2
        );
        // invalid restriction
        assert_eq!(
            parse_line("<dictionary><section id=\"m\" type=\"standard\"><e r=\"XX\"><i>a</i></e></section></dictionary>"),
            1
        );
        // missing attribute
        assert_eq!(parse_line("<dictionary><section type=\"standard\"/></dictionary>"), 1);
        // wrong root, malformed markup, stray text, unsupported element
        assert_eq!(parse_line("<dix/>"), 1);
        assert_eq!(parse_line("<dictionary>\n<sdefs>\n</dictionary>"), 3);
        assert_eq!(parse_line("<dictionary>\nhello</dictionary>"), 1);
        assert_eq!(
            parse_line("<dictionary><section id=\"m\" type=\"standard\">\n<e><re>[a-z]</re></e></section></dictionary>"),
            2
        );
        // duplicate paradigm
        assert_eq!(
            parse_line("<dictionary><pardefs><pardef n=\"a\"/>\n<pardef n=\"a\"/></pardefs></dictionary>"),
            2
        );
        // <p> without <r>
        assert_eq!(
            parse_line("<dictionary><section id=\"m\" type=\"standard\"><e><p><l>a</l></p></e></section></dictionary>"),
            1
        );
    }

    #[test]
    fn empty_dictionary() {
        let (dict, alphabet) = parse("<dictionary><alphabet/><sdefs/><pardefs/></dictionary>").unwrap();
        assert!(dict.sections.is_empty());
        assert_eq!(dict.letters, "");
        assert_eq!(alphabet.len(), 1);
    }
}
