//! minierb: a minimal ERB-style template-to-render compiler.
//!
//! This crate does one job: turn a template string that mixes literal text
//! with `<% statement %>` and `<%= expression %>` directives into a reusable
//! [`CompiledUnit`] that renders against a data [`Context`].
//!
//! Compilation is a three-stage pipeline, each stage a real artifact you can
//! inspect:
//! - [`scanner::scan`] splits the template into literal and directive
//!   segments (a lossless partition of the input),
//! - [`codegen::generate`] emits one statement line per segment against two
//!   fixed names, the accumulator `__out__` and the context `__data__`,
//! - [`CompiledUnit::compile`] parses those lines into an executable program.
//!
//! The generated statement language is a small, deliberately total grammar:
//! `x += expr;`, `let x = expr;`, `if (..) { .. } else { .. }`, and
//! `for (x in xs) { .. }`, with C-style expressions over strings, numbers,
//! booleans, null, arrays, and objects. There is no dynamic code execution
//! anywhere; directives are evaluated by the crate's own interpreter.
//!
//! Escaping:
//! - Literal text is spliced into generated code with the quote character and
//!   backslash escaped; nothing else is transformed, and no escaping artifact
//!   ever reaches rendered output.
//! - No HTML escaping is applied. Output bytes are template bytes plus
//!   whatever directive values display as.
//!
//! Errors come in three kinds, and none invalidate anything else:
//! - [`ScanError`]: the template is malformed (unterminated `<%`),
//! - [`CompileError`]: the generated body is not a valid program (e.g. a
//!   `<% } %>` with no open block),
//! - [`RenderError`]: a directive failed against this particular context
//!   (undefined name, type error); the unit remains reusable.

mod ast;
pub mod codegen;
mod error;
mod eval;
mod lexer;
mod parser;
pub mod scanner;

pub use codegen::{SourceBody, ACCUMULATOR, CONTEXT};
pub use error::{CompileError, RenderError, ScanError};
pub use eval::Context;
pub use scanner::Segment;
pub use serde_json::Value;

use ast::Program;
use log::{debug, trace};

/// A template compiled into an executable render unit.
///
/// Owns the generated source body and the program parsed from it. Immutable
/// after creation; render it any number of times, from any number of threads,
/// each call with its own context.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    body: SourceBody,
    program: Program,
}

impl CompiledUnit {
    /// Compile a generated source body into a render unit.
    ///
    /// Lexes each body line and parses the concatenated stream, binding the
    /// program to the same `__out__`/`__data__` names the code generator
    /// emitted, so generated references resolve at render time. Fails with
    /// [`CompileError::Syntax`] naming the offending line.
    pub fn compile(body: SourceBody) -> Result<Self, CompileError> {
        let mut tokens = Vec::new();
        for (i, line) in body.lines().iter().enumerate() {
            tokens.extend(lexer::tokenize(line, i + 1)?);
        }
        let mut parser = parser::Parser::new(&tokens, body.lines());
        let program = parser.parse()?;
        Ok(Self { body, program })
    }

    /// Render with the supplied context.
    ///
    /// Initializes the accumulator to the empty string, executes the program,
    /// and returns the accumulator's final value. A [`RenderError`] reports
    /// this call's failure only; the unit stays valid for further renders.
    pub fn render(&self, context: &Context) -> Result<String, RenderError> {
        trace!(
            "rendering {} statements against {} context entries",
            self.program.len(),
            context.len()
        );
        eval::Evaluator::new(context).run(&self.program)
    }

    /// The generated source body this unit was compiled from.
    pub fn source(&self) -> &SourceBody {
        &self.body
    }
}

/// Compile a template string into a [`CompiledUnit`].
///
/// Runs scan, generate, and compile in one step. A [`ScanError`] is returned
/// wrapped in [`CompileError::Scan`]; in every failure case no partial unit
/// exists.
pub fn compile(template: &str) -> Result<CompiledUnit, CompileError> {
    let segments = scanner::scan(template)?;
    let body = codegen::generate(&segments);
    debug!(
        "generated {} lines from {} segments",
        body.lines().len(),
        segments.len()
    );
    CompiledUnit::compile(body)
}
