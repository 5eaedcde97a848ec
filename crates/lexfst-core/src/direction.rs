// Compilation direction: which side of each symbol pair is the input tape.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;
use crate::alphabet::{Symbol, SymbolPair};

/// Compilation direction.
///
/// `Lr` reads the left side of every entry (e.g. surface forms in a
/// monolingual dictionary) and writes the right side; `Rl` does the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Lr,
    Rl,
}

impl Direction {
    /// The symbol this direction reads from a left/right pair.
    #[inline]
    pub fn input_of(self, pair: SymbolPair) -> Symbol {
        match self {
            Direction::Lr => pair.input,
            Direction::Rl => pair.output,
        }
    }

    /// Re-orient a left/right pair so that its input is this direction's input.
    #[inline]
    pub fn orient(self, pair: SymbolPair) -> SymbolPair {
        match self {
            Direction::Lr => pair,
            Direction::Rl => pair.swapped(),
        }
    }

    /// Name of the side this direction reads, as used in diagnostics.
    pub fn input_side(self) -> &'static str {
        match self {
            Direction::Lr => "left",
            Direction::Rl => "right",
        }
    }

    /// Single-byte encoding used in the compiled header.
    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Lr => 0,
            Direction::Rl => 1,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Direction::Lr),
            1 => Some(Direction::Rl),
            _ => None,
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lr" | "LR" => Ok(Direction::Lr),
            "rl" | "RL" => Ok(Direction::Rl),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Lr => f.write_str("lr"),
            Direction::Rl => f.write_str("rl"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("lr".parse::<Direction>().unwrap(), Direction::Lr);
        assert_eq!("RL".parse::<Direction>().unwrap(), Direction::Rl);
        assert_eq!(Direction::Rl.to_string(), "rl");
        let err = "both".parse::<Direction>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidDirection(s) if s == "both"));
    }

    #[test]
    fn input_side_selection() {
        let pair = SymbolPair::new(Symbol::from_id(1), Symbol::from_id(2));
        assert_eq!(Direction::Lr.input_of(pair), Symbol::from_id(1));
        assert_eq!(Direction::Rl.input_of(pair), Symbol::from_id(2));
        assert_eq!(Direction::Rl.orient(pair).input, Symbol::from_id(2));
        assert_eq!(Direction::Lr.orient(pair), pair);
    }

    #[test]
    fn byte_round_trip_rejects_unknown() {
        assert_eq!(Direction::from_byte(Direction::Rl.to_byte()), Some(Direction::Rl));
        assert_eq!(Direction::from_byte(7), None);
    }
}
