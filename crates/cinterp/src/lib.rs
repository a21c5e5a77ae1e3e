//! A tree-walking interpreter for a conservative subset of C.
//!
//! The pipeline is `source text -> Lexer -> Parser -> Program (AST) -> Analyzer -> Evaluator`.
//! [`Runner`] wires those four stages together for the common case of running a whole program
//! to completion; callers who need finer control (custom tracers, a seeded RNG, an in-memory
//! stdin) can call [`Parser::parse`], [`Analyzer::analyze`], and [`run_program`] directly.

#![expect(clippy::cast_possible_truncation, reason = "C integer width truncation is intentional")]
#![expect(clippy::cast_possible_wrap, reason = "signed/unsigned reinterpretation mirrors C casts")]
#![expect(clippy::cast_sign_loss, reason = "address/size conversions are range-checked first")]

mod analyzer;
mod ast;
mod builtins;
mod ctype;
mod error;
mod evaluator;
mod io;
mod lexer;
mod memory;
mod number;
mod parser;
mod resource;
mod run;
mod symbol;
mod token;
mod tracer;

pub use crate::{
    analyzer::Analyzer,
    ast::Program,
    ctype::{CType, CTypeError},
    error::{CError, CResult, ErrorKind},
    evaluator::{EvalContext, Evaluator, Value, run_program},
    io::{CollectStringPrint, FixedStdin, NoPrint, NoStdin, PrintWriter, StdPrint, StdinRead, StdinReader},
    memory::{Address, Memory},
    number::Number,
    parser::Parser,
    resource::{DEFAULT_MAX_RECURSION_DEPTH, RecursionGuard},
    run::Runner,
    tracer::{
        CoverageTracer, EvalTracer, NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer,
        TraceEvent,
    },
};
