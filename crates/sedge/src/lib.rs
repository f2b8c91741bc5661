//! An embeddable ECMAScript 3 interpreter.
//!
//! Source text is a UTF-16 code-unit sequence; the pipeline is a
//! context-sensitive [`Lexer`], a hand-written recursive-descent [`Parser`]
//! producing a typed tree with source-slice back-references, and a
//! tree-walking [`Interp`] built on references, lexical environments,
//! property descriptors and completions.
//!
//! Most embedders only need [`Runner`]:
//!
//! ```
//! use sedge::{Object, Runner};
//!
//! let runner = Runner::new("a = function(b){ return b * 2 }; a(21)").unwrap();
//! assert_eq!(runner.run().unwrap(), Object::Number(42.0));
//! ```
//!
//! The lower-level entry points mirror the pipeline: `Parser::parse_program`
//! yields the tree (an `Illegal` root on parse failure),
//! `Interp::enter_global_code` + `Interp::eval_program` evaluate it to a
//! [`Completion`], and `Interp::get_value` collapses a completion value
//! through reference resolution.

mod ast;
mod builtins;
mod character;
mod context;
mod convert;
mod environment;
mod error;
mod eval;
mod heap;
mod interp;
mod lexer;
mod object;
mod parse;
mod resource;
mod run;
mod token;
mod tracer;
mod value;

pub use crate::{
    ast::{Ast, AstKind, CaseClause, CatchClause, FuncDef, FuncId, ObjectProperty, Postfix, ProgramBody, PropertyKind},
    convert::{number_to_string, string_to_number, to_boolean},
    environment::EnvId,
    error::{ErrorKind, EvalResult, Exception, JsError},
    heap::{HeapId, HeapStats},
    interp::Interp,
    lexer::Lexer,
    object::{ArgumentsMap, Callable, JsObject, NativeFn, NativeFunction, PropertyDescriptor, PropertyTable, ScriptFunction},
    parse::{ParsedProgram, Parser, MAX_NESTING_DEPTH},
    resource::{ResourceLimits, DEFAULT_MAX_RECURSION_DEPTH},
    run::{Object, Runner},
    token::{CodeRange, Keyword, Punct, Token, TokenKind},
    tracer::{NoopTracer, RecordingTracer, StderrTracer, Tracer},
    value::{same_value, strict_equals, Completion, CompletionKind, Evaluated, JsString, JsValue, RefBase, Reference},
};
