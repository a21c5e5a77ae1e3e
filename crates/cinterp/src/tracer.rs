//! Evaluator execution tracing infrastructure.
//!
//! A trait-based ensemble (`NoopTracer` for the zero-cost default,
//! `StderrTracer`/`ProfilingTracer`/`CoverageTracer`/`RecordingTracer` for diagnostics and
//! tooling) rather than a single hardcoded logging call, with events keyed on
//! statements/calls/returns instead of bytecode instructions.
//!
//! | Tracer | Purpose |
//! |---|---|
//! | `NoopTracer` | Default; all methods are empty, the compiler should inline them away. |
//! | `StderrTracer` | Prints a live trace of statements and calls to stderr, for debugging. |
//! | `ProfilingTracer` | Counts statement kinds and function calls, tracks max call depth. |
//! | `CoverageTracer` | Records which source lines actually executed. |
//! | `RecordingTracer` | Buffers every event verbatim, for tests that assert on the trace. |

use std::fmt;

use ahash::{AHashMap, AHashSet};

/// One observed evaluator event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Statement { kind: &'static str, line: usize, depth: usize },
    Call { func_name: String, depth: usize },
    Return { func_name: String, depth: usize },
}

/// Hooks the evaluator calls as it walks statements and (user) function calls. Every method
/// has a no-op default so an implementor only needs to override what it cares about.
pub trait EvalTracer {
    fn on_statement(&mut self, kind: &'static str, line: usize, depth: usize) {
        let _ = (kind, line, depth);
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        let _ = (func_name, depth);
    }

    fn on_return(&mut self, func_name: &str, depth: usize) {
        let _ = (func_name, depth);
    }
}

/// Default tracer: every hook is a no-op.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Prints an indented live trace of statements and calls to stderr.
#[derive(Debug, Default)]
pub struct StderrTracer {
    limit: Option<usize>,
    count: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit), count: 0 }
    }

    fn allow(&mut self) -> bool {
        self.count += 1;
        self.limit.is_none_or(|limit| self.count <= limit)
    }
}

impl EvalTracer for StderrTracer {
    fn on_statement(&mut self, kind: &'static str, line: usize, depth: usize) {
        if self.allow() {
            eprintln!("{:indent$}{kind} @ line {line}", "", indent = depth * 2);
        }
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        if self.allow() {
            eprintln!("{:indent$}CALL {func_name}", "", indent = depth * 2);
        }
    }

    fn on_return(&mut self, func_name: &str, depth: usize) {
        if self.allow() {
            eprintln!("{:indent$}RETURN {func_name}", "", indent = depth * 2);
        }
    }
}

/// Aggregates statement-kind counts, per-function call counts, and the maximum observed depth.
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    statement_counts: AHashMap<&'static str, usize>,
    call_counts: AHashMap<String, usize>,
    max_depth: usize,
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        ProfilingReport {
            statement_counts: self.statement_counts.clone(),
            call_counts: self.call_counts.clone(),
            max_depth: self.max_depth,
        }
    }
}

impl EvalTracer for ProfilingTracer {
    fn on_statement(&mut self, kind: &'static str, _line: usize, depth: usize) {
        *self.statement_counts.entry(kind).or_insert(0) += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        *self.call_counts.entry(func_name.to_string()).or_insert(0) += 1;
        self.max_depth = self.max_depth.max(depth);
    }
}

/// A snapshot of everything a [`ProfilingTracer`] has observed so far.
#[derive(Debug, Clone, Default)]
pub struct ProfilingReport {
    pub statement_counts: AHashMap<&'static str, usize>,
    pub call_counts: AHashMap<String, usize>,
    pub max_depth: usize,
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "max call depth: {}", self.max_depth)?;
        let mut statements: Vec<_> = self.statement_counts.iter().collect();
        statements.sort_by_key(|(kind, _)| **kind);
        for (kind, count) in statements {
            writeln!(f, "  {kind}: {count}")?;
        }
        let mut calls: Vec<_> = self.call_counts.iter().collect();
        calls.sort_by(|a, b| a.0.cmp(b.0));
        for (func_name, count) in calls {
            writeln!(f, "  {func_name}(): {count}")?;
        }
        Ok(())
    }
}

/// Records the set of source lines that were actually executed.
#[derive(Debug, Default)]
pub struct CoverageTracer {
    lines_hit: AHashSet<usize>,
}

impl CoverageTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines_hit(&self) -> &AHashSet<usize> {
        &self.lines_hit
    }
}

impl EvalTracer for CoverageTracer {
    fn on_statement(&mut self, _kind: &'static str, line: usize, _depth: usize) {
        self.lines_hit.insert(line);
    }
}

/// Buffers every event verbatim, for tests that assert on the exact trace shape.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { events: Vec::new(), limit: Some(limit) }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    fn push(&mut self, event: TraceEvent) {
        if self.limit.is_none_or(|limit| self.events.len() < limit) {
            self.events.push(event);
        }
    }
}

impl EvalTracer for RecordingTracer {
    fn on_statement(&mut self, kind: &'static str, line: usize, depth: usize) {
        self.push(TraceEvent::Statement { kind, line, depth });
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        self.push(TraceEvent::Call { func_name: func_name.to_string(), depth });
    }

    fn on_return(&mut self, func_name: &str, depth: usize) {
        self.push(TraceEvent::Return { func_name: func_name.to_string(), depth });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiling_tracer_counts_statements_and_calls() {
        let mut tracer = ProfilingTracer::new();
        tracer.on_statement("if", 3, 1);
        tracer.on_statement("if", 4, 1);
        tracer.on_call("fact", 2);
        let report = tracer.report();
        assert_eq!(report.statement_counts.get("if"), Some(&2));
        assert_eq!(report.call_counts.get("fact"), Some(&1));
        assert_eq!(report.max_depth, 2);
    }

    #[test]
    fn coverage_tracer_records_distinct_lines() {
        let mut tracer = CoverageTracer::new();
        tracer.on_statement("expr", 10, 0);
        tracer.on_statement("expr", 10, 0);
        tracer.on_statement("return", 11, 0);
        assert_eq!(tracer.lines_hit().len(), 2);
    }

    #[test]
    fn recording_tracer_respects_its_limit() {
        let mut tracer = RecordingTracer::with_limit(2);
        tracer.on_statement("expr", 1, 0);
        tracer.on_call("f", 1);
        tracer.on_return("f", 1);
        assert_eq!(tracer.events().len(), 2);
    }
}
