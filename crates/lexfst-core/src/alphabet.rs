// Symbol interning: characters and multi-character tags share one id space.
//
// Id 0 is always epsilon (the empty string). Ids are handed out in first-seen
// order, so the same input interned in the same order yields the same table.

use hashbrown::HashMap;

use crate::CoreError;
use crate::character::is_whitespace;

/// Largest number of symbols (epsilon included) an alphabet may hold.
///
/// Symbol ids are stored as `u16` in the compiled format, and the two highest
/// values are reserved as slot sentinels.
pub const MAX_SYMBOLS: usize = 0xFFFD;

/// An interned symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Symbol(u16);

impl Symbol {
    /// The empty symbol: consumes or emits nothing.
    pub const EPSILON: Symbol = Symbol(0);

    #[inline]
    pub fn from_id(id: u16) -> Self {
        Symbol(id)
    }

    #[inline]
    pub fn id(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn is_epsilon(self) -> bool {
        self.0 == 0
    }
}

/// Edge label of a transducer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolPair {
    pub input: Symbol,
    pub output: Symbol,
}

impl SymbolPair {
    pub fn new(input: Symbol, output: Symbol) -> Self {
        Self { input, output }
    }

    /// A pair that reads and writes the same symbol.
    pub fn identity(symbol: Symbol) -> Self {
        Self {
            input: symbol,
            output: symbol,
        }
    }

    /// The same pair with input and output exchanged.
    #[inline]
    pub fn swapped(self) -> Self {
        Self {
            input: self.output,
            output: self.input,
        }
    }

    /// Both sides are epsilon.
    #[inline]
    pub fn is_epsilon(self) -> bool {
        self.input.is_epsilon() && self.output.is_epsilon()
    }
}

/// Per-compilation symbol table.
///
/// Maps symbol text to [`Symbol`] ids and back. A fresh alphabet is created
/// for every compilation unit; nothing is shared between units.
#[derive(Debug, Clone)]
pub struct Alphabet {
    strings: Vec<String>,
    index: HashMap<String, Symbol>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new()
    }
}

impl Alphabet {
    /// Create an alphabet containing only epsilon.
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(String::new(), Symbol::EPSILON);
        Self {
            strings: vec![String::new()],
            index,
        }
    }

    /// Intern `text`, returning its id. The empty string is epsilon.
    pub fn intern(&mut self, text: &str) -> Result<Symbol, CoreError> {
        if let Some(&symbol) = self.index.get(text) {
            return Ok(symbol);
        }
        if self.strings.len() >= MAX_SYMBOLS {
            return Err(CoreError::AlphabetFull { limit: MAX_SYMBOLS });
        }
        let symbol = Symbol(self.strings.len() as u16);
        self.strings.push(text.to_string());
        self.index.insert(text.to_string(), symbol);
        Ok(symbol)
    }

    /// Intern a single character.
    pub fn intern_char(&mut self, c: char) -> Result<Symbol, CoreError> {
        let mut buf = [0u8; 4];
        self.intern(c.encode_utf8(&mut buf))
    }

    /// Intern a tag by its bare name: `n` becomes the symbol `<n>`.
    pub fn intern_tag(&mut self, name: &str) -> Result<Symbol, CoreError> {
        self.intern(&format!("<{name}>"))
    }

    /// Look up a symbol without interning it.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.index.get(text).copied()
    }

    /// The text of a symbol. Unknown ids render as the empty string.
    pub fn text(&self, symbol: Symbol) -> &str {
        self.strings
            .get(symbol.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of interned symbols, epsilon included.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false: epsilon is present from construction.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Symbol texts in id order.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Whether the symbol is a multi-character tag.
    pub fn is_tag(&self, symbol: Symbol) -> bool {
        self.text(symbol).chars().nth(1).is_some()
    }

    /// Whether the symbol is a single whitespace character.
    pub fn is_whitespace(&self, symbol: Symbol) -> bool {
        let mut chars = self.text(symbol).chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => is_whitespace(c),
            _ => false,
        }
    }

    /// Concatenate the texts of a symbol sequence.
    pub fn render<I>(&self, symbols: I) -> String
    where
        I: IntoIterator<Item = Symbol>,
    {
        let mut out = String::new();
        for symbol in symbols {
            out.push_str(self.text(symbol));
        }
        out
    }
}
