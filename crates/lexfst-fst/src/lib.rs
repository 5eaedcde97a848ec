//! Transducer model and compiled binary format.
//!
//! This crate holds everything between a parsed dictionary and the bytes on
//! disk, plus the loader used to read those bytes back.
//!
//! # Architecture
//!
//! - [`automaton`] -- In-memory graph and trie-style path merging
//! - [`att`] -- Tab-separated automaton text reader
//! - [`validate`] -- Epsilon loop / epsilon-to-final checks
//! - [`format`] -- Binary header parsing and writing
//! - [`transition`] -- 8-byte slot layout
//! - [`symbols`] -- Symbol table (writing, parsing, input mapping)
//! - [`writer`] -- Serialization of compiled dictionaries
//! - [`config`] -- Traversal configuration (explicit DFS stack)
//! - [`transducer`] -- Loading and lookup of compiled dictionaries

pub mod att;
pub mod automaton;
pub mod config;
pub mod format;
pub mod symbols;
pub mod transducer;
pub mod transition;
pub mod validate;
pub mod writer;

pub use automaton::{Automaton, Section, TrieBuilder};
pub use transducer::CompiledTransducer;

/// Error type for reading and writing compiled dictionaries.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("invalid magic number in header")]
    InvalidMagic,
    #[error("file too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("unsupported feature flags {0:#04x}")]
    UnsupportedFeatures(u8),
    #[error("invalid direction byte {0}")]
    InvalidDirection(u8),
    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(String),
    #[error("invalid section: {0}")]
    InvalidSection(String),
    #[error("too many symbols: {count} (limit {limit})", limit = lexfst_core::alphabet::MAX_SYMBOLS)]
    TooManySymbols { count: usize },
    #[error("too many slots: {count} do not fit in 24-bit state addresses")]
    TooManySlots { count: usize },
}

/// Maximum number of outer-loop iterations in one traversal step.
pub const MAX_LOOP_COUNT: u32 = 100_000;

/// Default traversal stack size.
pub const DEFAULT_BUFFER_SIZE: usize = 2000;
