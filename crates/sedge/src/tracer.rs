//! Execution tracing hooks.
//!
//! The interpreter reports statement entry and function calls to a
//! [`Tracer`]; embedders plug in their own sink. [`NoopTracer`] compiles to
//! nothing, [`StderrTracer`] prints a line per event, [`RecordingTracer`]
//! accumulates events for tests.

use crate::token::CodeRange;

pub trait Tracer {
    /// A statement is about to be evaluated.
    fn on_statement(&mut self, range: CodeRange) {
        let _ = range;
    }

    /// A function object is about to be invoked. `name` is empty for
    /// anonymous functions.
    fn on_call(&mut self, name: &str) {
        let _ = name;
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Prints events to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTracer;

impl Tracer for StderrTracer {
    fn on_statement(&mut self, range: CodeRange) {
        eprintln!("stmt @ {}..{}", range.start, range.end);
    }

    fn on_call(&mut self, name: &str) {
        eprintln!("call {name}");
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub statements: Vec<CodeRange>,
    pub calls: Vec<String>,
}

impl Tracer for RecordingTracer {
    fn on_statement(&mut self, range: CodeRange) {
        self.statements.push(range);
    }

    fn on_call(&mut self, name: &str) {
        self.calls.push(name.to_owned());
    }
}
