//! Shared types for the lexfst dictionary compiler.
//!
//! - [`alphabet`] -- symbol interning (characters and multi-character tags)
//! - [`character`] -- character classification used by the parsers and checks
//! - [`direction`] -- compilation direction (`lr` / `rl`)

pub mod alphabet;
pub mod character;
pub mod direction;

pub use alphabet::{Alphabet, Symbol, SymbolPair};
pub use direction::Direction;

/// Error type for the shared core types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid direction {0:?}: expected \"lr\" or \"rl\"")]
    InvalidDirection(String),
    #[error("alphabet is full: at most {limit} symbols can be interned")]
    AlphabetFull { limit: usize },
}
