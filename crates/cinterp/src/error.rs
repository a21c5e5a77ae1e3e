//! The four fatal error kinds produced by the pipeline, plus the non-fatal warning channel.
//!
//! Every stage after the lexer threads line numbers through its nodes so errors can report
//! where in the source they occurred. All four kinds are fatal for the program being
//! interpreted (see spec policy in `run.rs`); warnings are printed to stderr and execution
//! continues.

use std::fmt;

/// One of the four fatal error kinds a C program can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lexical => "LexicalError",
            Self::Syntax => "SyntaxError",
            Self::Semantic => "SemanticError",
            Self::Runtime => "RuntimeError",
        };
        write!(f, "{s}")
    }
}

/// A fatal interpreter error, carrying the kind, a message, and (when known) a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<usize>,
}

impl CError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: Option<usize>) -> Self {
        Self { kind, message: message.into(), line }
    }

    #[must_use]
    pub fn lexical(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Lexical, message, Some(line))
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, Some(line))
    }

    #[must_use]
    pub fn semantic(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Semantic, message, Some(line))
    }

    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message, None)
    }

    #[must_use]
    pub fn runtime_at(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Runtime, message, Some(line))
    }
}

impl fmt::Display for CError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] {} at line {}", self.kind, self.message, line),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for CError {}

pub type CResult<T> = Result<T, CError>;

/// Prints a non-fatal warning to stderr in the shape the analyzer and evaluator share.
///
/// Warnings never abort analysis or evaluation; see spec §4.4/§7 (assignment-across-types,
/// ternary branch mismatch, call argument mismatch).
pub fn warn(message: &str, line: usize) {
    eprintln!("warning: {message} at line {line}");
}
