//! The abstract syntax tree.
//!
//! Nodes are a discriminated tree with single-owner children; every node
//! remembers the [`CodeRange`] it was parsed from so literals can be decoded
//! lazily and diagnostics can point at source. Function literals live in a
//! side table ([`FuncDef`], addressed by [`FuncId`]) owned by the parse
//! result, so closures created at runtime can share a definition without
//! aliasing into the tree.

use smallvec::SmallVec;

use crate::token::{CodeRange, Token};

/// Index into the parse result's function-definition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FuncId(u32);

impl FuncId {
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("function table overflow"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A function literal: optional name, formal parameters, and a body whose
/// kind is always [`AstKind::FuncBody`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FuncDef {
    pub name: Option<Token>,
    pub params: SmallVec<[Token; 4]>,
    pub body: Ast,
    pub range: CodeRange,
}

/// Object literal property kinds: plain `key: value`, `get key() {}`,
/// `set key(v) {}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PropertyKind {
    Normal,
    Get,
    Set,
}

/// One property of an object literal. Duplicate keys are parsed permissively;
/// the evaluator applies the last-wins rule per kind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectProperty {
    pub key: Token,
    pub value: Ast,
    pub kind: PropertyKind,
}

/// A postfix step of a left-hand-side chain, in written order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Postfix {
    /// `( Arguments )`; the node is always [`AstKind::Args`].
    Call(Ast),
    /// `[ Expression ]`
    Index(Ast),
    /// `. IdentifierName`
    Prop(Token),
}

/// A `case expr: statements` clause.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CaseClause {
    pub expr: Ast,
    pub stmts: Vec<Ast>,
}

/// A `catch (ident) { ... }` clause.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatchClause {
    pub param: Token,
    pub block: Box<Ast>,
}

/// Shared shape of Program and FunctionBody: the strict flag from a leading
/// `"use strict"` directive, hoisted function declarations, and the
/// statement list in source order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProgramBody {
    pub strict: bool,
    pub func_decls: Vec<FuncId>,
    pub statements: Vec<Ast>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum AstKind {
    // primary expressions
    This,
    Ident,
    Null,
    Bool,
    Number,
    String,
    Regex,
    Array {
        /// Elements in written order; `None` marks an elision.
        elements: Vec<Option<Ast>>,
    },
    Object {
        properties: Vec<ObjectProperty>,
    },
    /// `( Expression )`. The range covers the inner expression only.
    Paren {
        expr: Box<Ast>,
    },
    /// Comma-sequence expression `a, b, c` (only built for two or more
    /// elements; a single assignment expression is returned unwrapped).
    Expr {
        elements: Vec<Ast>,
    },
    Binary {
        lhs: Box<Ast>,
        rhs: Box<Ast>,
        op: Token,
    },
    Unary {
        operand: Box<Ast>,
        op: Token,
        prefix: bool,
    },
    /// `cond ? then : other`
    Triple {
        cond: Box<Ast>,
        then: Box<Ast>,
        other: Box<Ast>,
    },
    Func(FuncId),
    Args {
        args: Vec<Ast>,
    },
    /// A left-hand-side chain: `new`-count, a base, and postfix steps in
    /// exactly the order written (calls, indexes and member accesses can
    /// interleave freely).
    Lhs {
        base: Box<Ast>,
        new_count: usize,
        postfixes: Vec<Postfix>,
    },

    // statements
    Empty,
    Block {
        stmts: Vec<Ast>,
    },
    VarStmt {
        decls: Vec<Ast>,
    },
    VarDecl {
        name: Token,
        init: Option<Box<Ast>>,
    },
    If {
        cond: Box<Ast>,
        then: Box<Ast>,
        other: Option<Box<Ast>>,
    },
    DoWhile {
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    While {
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    For {
        init: Vec<Ast>,
        cond: Option<Box<Ast>>,
        step: Option<Box<Ast>>,
        body: Box<Ast>,
    },
    ForIn {
        left: Box<Ast>,
        right: Box<Ast>,
        body: Box<Ast>,
    },
    Continue {
        label: Option<Token>,
    },
    Break {
        label: Option<Token>,
    },
    Return {
        expr: Option<Box<Ast>>,
    },
    With {
        object: Box<Ast>,
        body: Box<Ast>,
    },
    Switch {
        expr: Box<Ast>,
        before_default: Vec<CaseClause>,
        default_clause: Option<Vec<Ast>>,
        after_default: Vec<CaseClause>,
    },
    Throw {
        expr: Option<Box<Ast>>,
    },
    Try {
        block: Box<Ast>,
        catch: Option<CatchClause>,
        finally: Option<Box<Ast>>,
    },
    Label {
        label: Token,
        stmt: Box<Ast>,
    },
    Debugger,

    FuncBody(ProgramBody),
    Program(ProgramBody),

    /// Parse failure; the range points at the offending region.
    Illegal,
}

/// An AST node: a kind with its exclusive children, plus the source range it
/// covers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Ast {
    pub kind: AstKind,
    pub range: CodeRange,
}

impl Ast {
    pub fn new(kind: AstKind, range: CodeRange) -> Self {
        Self { kind, range }
    }

    pub fn is_illegal(&self) -> bool {
        matches!(self.kind, AstKind::Illegal)
    }

    pub fn source<'a>(&self, units: &'a [u16]) -> &'a [u16] {
        self.range.slice(units)
    }

    pub fn text(&self, units: &[u16]) -> String {
        self.range.text(units)
    }
}
