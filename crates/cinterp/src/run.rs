//! Public, single-shot interface for running a whole C source file to completion.
//!
//! The reference `Runner` pauses at external function calls and futures and resumes across
//! process boundaries via `serde` snapshots; this interpreter has no such collaborators
//! (stdin reads block synchronously, there is no async and nothing to pause for), so `Runner`
//! here is the same facade reduced to the part of that API this system actually needs: parse,
//! analyze, evaluate, return the exit status or the first error.

use rand::{SeedableRng as _, rngs::StdRng};

use crate::{
    analyzer::Analyzer,
    ast::Program,
    error::CResult,
    evaluator::{self, EvalContext},
    io::{PrintWriter, StdinReader},
    memory::Memory,
    tracer::{EvalTracer, NoopTracer},
};

/// Parses and analyzes a C source file once, then runs it as many times as asked.
///
/// Parsing and semantic analysis are pure functions of the source text, so `Runner` does
/// them once up front and caches the resulting [`Program`] — re-running the same program
/// against different stdin or a different seed does not re-parse it.
#[derive(Debug)]
pub struct Runner {
    program: Program,
}

impl Runner {
    /// Parses and semantically analyzes `source`, returning a `Runner` ready to execute it.
    ///
    /// # Errors
    /// Returns the first lexical, syntax, or semantic error encountered.
    pub fn new(source: &str) -> CResult<Self> {
        let program = crate::parser::Parser::parse(source)?;
        Analyzer::analyze(&program)?;
        Ok(Self { program })
    }

    /// Runs the program to completion with a fresh [`Memory`] and the given I/O and RNG seed,
    /// using a [`NoopTracer`].
    ///
    /// # Errors
    /// Returns the first runtime error encountered (division by zero, invalid dereference,
    /// out-of-bounds `free`, exceeded recursion depth, exhausted stdin, ...).
    pub fn run(&self, writer: &mut dyn PrintWriter, stdin: &mut dyn StdinReader, seed: u64) -> CResult<i64> {
        let mut tracer = NoopTracer;
        self.run_with_tracer(writer, stdin, seed, &mut tracer)
    }

    /// Like [`Runner::run`] but observed by a caller-supplied [`EvalTracer`] (for coverage,
    /// profiling, or a live statement trace).
    ///
    /// # Errors
    /// Same as [`Runner::run`].
    pub fn run_with_tracer(
        &self,
        writer: &mut dyn PrintWriter,
        stdin: &mut dyn StdinReader,
        seed: u64,
        tracer: &mut dyn EvalTracer,
    ) -> CResult<i64> {
        let mut memory = Memory::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = EvalContext { memory: &mut memory, writer, stdin, rng: &mut rng };
        evaluator::Evaluator::new(tracer).run(&self.program, &mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CollectStringPrint, NoStdin};

    #[test]
    fn runner_parses_once_and_runs_to_completion() {
        let src = r#"
            #include <stdio.h>
            int main() {
                printf("hi");
                return 0;
            }
        "#;
        let runner = Runner::new(src).expect("program must parse and analyze");
        let mut writer = CollectStringPrint::default();
        let mut stdin = NoStdin;
        let status = runner.run(&mut writer, &mut stdin, 0).expect("program must run");
        assert_eq!(status, 0);
        assert_eq!(writer.into_output(), "hi");
    }

    #[test]
    fn runner_surfaces_semantic_errors_at_construction() {
        let src = "int main() { return undeclared_variable; }";
        assert!(Runner::new(src).is_err());
    }

    #[test]
    fn runner_can_be_run_more_than_once() {
        let src = "int main() { return 7; }";
        let runner = Runner::new(src).expect("program must parse and analyze");
        let mut writer = CollectStringPrint::default();
        let mut stdin = NoStdin;
        assert_eq!(runner.run(&mut writer, &mut stdin, 0).unwrap(), 7);
        assert_eq!(runner.run(&mut writer, &mut stdin, 1).unwrap(), 7);
    }
}
