//! Dictionary compiler.
//!
//! Reads dictionary markup or automaton text and produces the compiled
//! binary format of [`lexfst_fst`].
//!
//! # Architecture
//!
//! - [`markup`] -- XML subset reader
//! - [`dix`] -- Dictionary markup: paradigms, sections, entries
//! - [`expand`] -- Paradigm expansion and side checks
//! - [`source`] -- The [`Source`] trait over both input formats
//! - [`compiler`] -- Build, validate, orient, serialize

pub mod compiler;
pub mod dix;
pub mod error;
pub mod expand;
pub mod markup;
pub mod source;

pub use compiler::{CompileOptions, CompiledDictionary, compile, compile_file, compile_to_bytes};
pub use error::CompileError;
pub use source::{AttSource, DixSource, Source, SourceFile};
