// Symbol table of a compiled dictionary: writing, parsing and input mapping.

use hashbrown::HashMap;
use lexfst_core::alphabet::MAX_SYMBOLS;

use crate::FstError;

/// Parsed symbol table of a compiled dictionary.
///
/// Symbol texts are stored in id order; index 0 is epsilon (the empty
/// string). Single characters and multi-character symbols are indexed
/// separately for mapping lookup input onto ids.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Maps symbol index to its string representation.
    pub symbol_strings: Vec<String>,
    /// Maps a single character to its symbol index.
    pub char_to_symbol: HashMap<char, u16>,
    /// Maps a multi-character symbol such as `<n>` or `+N` to its index.
    pub multichar_to_symbol: HashMap<String, u16>,
    /// Length in characters of the longest multi-character symbol.
    pub longest_multichar: usize,
}

impl SymbolTable {
    pub fn len(&self) -> usize {
        self.symbol_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_strings.is_empty()
    }

    /// Map `input` onto symbol ids, appending them to `out`.
    ///
    /// At each position the longest known multi-character symbol wins;
    /// otherwise the input maps character by character. Unknown characters
    /// map to `unknown`. Returns `true` if every symbol was known.
    pub fn map_input(&self, input: &str, unknown: u16, out: &mut Vec<u16>) -> bool {
        let mut all_known = true;
        let mut rest = input;
        let mut ends: Vec<usize> = Vec::with_capacity(self.longest_multichar);
        while let Some(ch) = rest.chars().next() {
            if let Some((id, len)) = self.longest_match(rest, &mut ends) {
                out.push(id);
                rest = &rest[len..];
                continue;
            }
            match self.char_to_symbol.get(&ch) {
                Some(&id) => out.push(id),
                None => {
                    out.push(unknown);
                    all_known = false;
                }
            }
            rest = &rest[ch.len_utf8()..];
        }
        all_known
    }

    /// Longest multi-character symbol `rest` starts with, and its byte length.
    fn longest_match(&self, rest: &str, ends: &mut Vec<usize>) -> Option<(u16, usize)> {
        if self.longest_multichar < 2 {
            return None;
        }
        ends.clear();
        ends.extend(
            rest.char_indices()
                .skip(1)
                .map(|(i, _)| i)
                .chain(std::iter::once(rest.len()))
                .take(self.longest_multichar),
        );
        // ends[k] is the byte length of the first k + 1 characters.
        ends.iter()
            .skip(1)
            .rev()
            .find_map(|&end| self.multichar_to_symbol.get(&rest[..end]).map(|&id| (id, end)))
    }
}

/// Read a NUL-terminated UTF-8 string starting at `pos`.
///
/// Returns the string and the offset just past the terminator.
pub fn read_cstr(data: &[u8], pos: usize, what: &str) -> Result<(String, usize), FstError> {
    let end = data
        .get(pos..)
        .and_then(|rest| rest.iter().position(|&b| b == 0))
        .map(|len| pos + len)
        .ok_or_else(|| FstError::InvalidSymbolTable(format!("unterminated {what}")))?;
    let text = std::str::from_utf8(&data[pos..end])
        .map_err(|_| FstError::InvalidSymbolTable(format!("invalid UTF-8 in {what}")))?;
    Ok((text.to_string(), end + 1))
}

/// Append `text` followed by a NUL terminator.
pub fn write_cstr(out: &mut Vec<u8>, text: &str, what: &str) -> Result<(), FstError> {
    if text.as_bytes().contains(&0) {
        return Err(FstError::InvalidSymbolTable(format!(
            "{what} {text:?} contains a NUL byte"
        )));
    }
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    Ok(())
}

/// Append a symbol table: `u16` count, then NUL-terminated strings.
pub fn write_symbol_table(out: &mut Vec<u8>, strings: &[String]) -> Result<(), FstError> {
    if strings.len() > MAX_SYMBOLS {
        return Err(FstError::TooManySymbols {
            count: strings.len(),
        });
    }
    out.extend_from_slice(&(strings.len() as u16).to_le_bytes());
    for (i, s) in strings.iter().enumerate() {
        if i == 0 && !s.is_empty() {
            return Err(FstError::InvalidSymbolTable(
                "symbol 0 must be epsilon".to_string(),
            ));
        }
        write_cstr(out, s, "symbol")?;
    }
    Ok(())
}

/// Parse the symbol table starting at `offset`.
///
/// Returns the parsed table and the byte offset immediately after it.
pub fn parse_symbol_table(data: &[u8], offset: usize) -> Result<(SymbolTable, usize), FstError> {
    if offset + 2 > data.len() {
        return Err(FstError::TooShort {
            expected: offset + 2,
            actual: data.len(),
        });
    }

    let symbol_count = u16::from_le_bytes([data[offset], data[offset + 1]]);
    if symbol_count == 0 {
        return Err(FstError::InvalidSymbolTable(
            "missing epsilon symbol".to_string(),
        ));
    }
    if symbol_count as usize > MAX_SYMBOLS {
        return Err(FstError::TooManySymbols {
            count: symbol_count as usize,
        });
    }
    let mut pos = offset + 2;

    let mut symbol_strings = Vec::with_capacity(symbol_count as usize);
    let mut char_to_symbol = HashMap::new();
    let mut multichar_to_symbol = HashMap::new();
    let mut longest_multichar = 0;

    for i in 0..symbol_count {
        let (text, next) = read_cstr(data, pos, "symbol string")?;
        pos = next;

        if i == 0 {
            if !text.is_empty() {
                return Err(FstError::InvalidSymbolTable(
                    "symbol 0 must be epsilon".to_string(),
                ));
            }
        } else {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    char_to_symbol.insert(ch, i);
                }
                (Some(_), Some(_)) => {
                    longest_multichar = longest_multichar.max(text.chars().count());
                    multichar_to_symbol.insert(text.clone(), i);
                }
                (None, _) => {
                    return Err(FstError::InvalidSymbolTable(format!(
                        "symbol {i} is empty"
                    )));
                }
            }
        }
        symbol_strings.push(text);
    }

    Ok((
        SymbolTable {
            symbol_strings,
            char_to_symbol,
            multichar_to_symbol,
            longest_multichar,
        },
        pos,
    ))
}
