// Character classification for dictionary symbols.
//
// The parsers use this to decide which single-character symbols belong to the
// `letters` set stored with a compiled dictionary, and the side checks use it
// to spot entries that start with whitespace.

// ---------------------------------------------------------------------------
// Character type classification
// ---------------------------------------------------------------------------

/// Character type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharType {
    Unknown,
    Letter,
    Digit,
    Whitespace,
    Punctuation,
}

/// Returns the character type for a given character.
///
/// Combining marks count as letters: they only ever appear attached to a
/// word character, never as stand-alone punctuation.
pub fn get_char_type(c: char) -> CharType {
    if is_whitespace(c) {
        return CharType::Whitespace;
    }
    if c.is_alphabetic() || is_combining_mark(c) {
        return CharType::Letter;
    }
    if c.is_numeric() {
        return CharType::Digit;
    }
    if is_punctuation_char(c) {
        return CharType::Punctuation;
    }
    CharType::Unknown
}

/// ASCII punctuation plus the general punctuation block.
fn is_punctuation_char(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(c as u32,
            0x00A1..=0x00BF     // Latin-1 punctuation and symbols
            | 0x2010..=0x2027   // dashes, quotes, bullets
            | 0x2030..=0x205E   // per mille, primes, misc
            | 0x3000..=0x303F)  // CJK symbols and punctuation
}

// ---------------------------------------------------------------------------
// Combining marks
// ---------------------------------------------------------------------------

/// Unicode blocks of combining characters.
const COMBINING_RANGES: &[(u32, u32)] = &[
    (0x0300, 0x036F), // Combining Diacritical Marks
    (0x1AB0, 0x1AFF), // ... Extended
    (0x1DC0, 0x1DFF), // ... Supplement
    (0x20D0, 0x20FF), // ... for Symbols
    (0xFE20, 0xFE2F), // Combining Half Marks
];

/// Check whether a character is a combining mark.
pub fn is_combining_mark(c: char) -> bool {
    let cp = c as u32;
    COMBINING_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

// ---------------------------------------------------------------------------
// Simple case conversion
//
// The standard library's to_lowercase / to_uppercase produce iterators because
// some characters map to multiple characters; for a one-to-one mapping we only
// take the first character.
// ---------------------------------------------------------------------------

/// Convert a character to its simple lowercase equivalent.
pub fn simple_lower(c: char) -> char {
    let mut iter = c.to_lowercase();
    iter.next().unwrap_or(c)
}

/// Convert a character to its simple uppercase equivalent.
pub fn simple_upper(c: char) -> char {
    let mut iter = c.to_uppercase();
    iter.next().unwrap_or(c)
}

/// The character together with its simple case counterpart, if it has one.
pub fn case_variants(c: char) -> (char, Option<char>) {
    let lower = simple_lower(c);
    if lower != c {
        return (c, Some(lower));
    }
    let upper = simple_upper(c);
    if upper != c {
        return (c, Some(upper));
    }
    (c, None)
}

/// Check whether a character is a whitespace character.
pub fn is_whitespace(c: char) -> bool {
    let cp = c as u32;
    (0x09..=0x0D).contains(&cp)
        || cp == 0x20
        || cp == 0x85
        || cp == 0xA0
        || cp == 0x1680
        || cp == 0x180E
        || (0x2000..=0x200A).contains(&cp)
        || cp == 0x2028
        || cp == 0x2029
        || cp == 0x202F
        || cp == 0x205F
        || cp == 0x3000
}
