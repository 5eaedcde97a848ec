use std::path::PathBuf;

use lexfst_core::CoreError;
use lexfst_fst::FstError;
use lexfst_fst::att::AttError;
use lexfst_fst::validate::ValidationError;

use crate::markup::MarkupError;

/// Error type for compiling a dictionary. Every variant aborts the
/// compilation unit.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: entry has an empty {side} side")]
    EmptySide { line: usize, side: &'static str },
    #[error("line {line}: {side} side of entry starts with whitespace")]
    LeadingWhitespace { line: usize, side: &'static str },
    #[error("cyclic paradigm reference: {cycle}")]
    CyclicParadigm { cycle: String },
    #[error("section {section}: {source}")]
    Validation {
        section: String,
        source: ValidationError,
    },
    #[error(transparent)]
    Att(#[from] AttError),
    #[error(transparent)]
    Fst(#[from] FstError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<MarkupError> for CompileError {
    fn from(e: MarkupError) -> Self {
        CompileError::Parse {
            line: e.line,
            message: e.message,
        }
    }
}
