//! Hand-written recursive-descent parser.
//!
//! Every production records the cursor position on entry and produces either
//! a well-formed node spanning `[start, cursor)` or an `Illegal` node whose
//! range points at the offending region. Lookahead is peek-then-rewind via
//! the lexer checkpoint; the `/`-versus-regex decision is made here, by
//! rewinding and asking the lexer to re-scan (see [`Lexer::scan_regex_literal`]).

use smallvec::SmallVec;

use crate::{
    ast::{Ast, AstKind, CaseClause, CatchClause, FuncDef, FuncId, ObjectProperty, Postfix, ProgramBody, PropertyKind},
    lexer::Lexer,
    token::{CodeRange, Keyword, Punct, Token, TokenKind},
};

/// Maximum expression/statement nesting depth.
///
/// Prevents stack overflow on pathological inputs like `((((((...`; the
/// parser reports an `Illegal` node instead of recursing further.
pub const MAX_NESTING_DEPTH: u16 = 200;

/// The output of parsing: the source buffer, the program tree, and the
/// function-definition table the tree's [`FuncId`]s point into.
///
/// Everything here is plain data; serializing a `ParsedProgram` (see
/// [`crate::Runner::dump`]) snapshots the parse so later runs skip it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParsedProgram {
    pub units: Vec<u16>,
    pub program: Ast,
    pub functions: Vec<FuncDef>,
}

impl ParsedProgram {
    pub fn parse(source: &str) -> Self {
        let units: Vec<u16> = source.encode_utf16().collect();
        let mut parser = Parser::new(&units);
        let program = parser.parse_program();
        let functions = parser.into_functions();
        Self {
            units,
            program,
            functions,
        }
    }

    pub fn func(&self, id: FuncId) -> &FuncDef {
        &self.functions[id.index()]
    }

    pub fn is_illegal(&self) -> bool {
        self.program.is_illegal()
    }
}

pub struct Parser<'a> {
    units: &'a [u16],
    lexer: Lexer<'a>,
    functions: Vec<FuncDef>,
    depth: u16,
}

impl<'a> Parser<'a> {
    pub fn new(units: &'a [u16]) -> Self {
        Self {
            units,
            lexer: Lexer::new(units),
            functions: Vec::new(),
            depth: 0,
        }
    }

    /// The function definitions collected during parsing, addressed by the
    /// [`FuncId`]s embedded in the tree.
    pub fn functions(&self) -> &[FuncDef] {
        &self.functions
    }

    /// Consumes the parser, yielding the function-definition table.
    pub fn into_functions(self) -> Vec<FuncDef> {
        self.functions
    }

    fn span(&self, start: usize) -> CodeRange {
        CodeRange::new(start, self.lexer.pos())
    }

    fn illegal(&self, start: usize) -> Ast {
        Ast::new(AstKind::Illegal, self.span(start))
    }

    fn illegal_at(range: CodeRange) -> Ast {
        Ast::new(AstKind::Illegal, range)
    }

    // ---- programs and function bodies ----

    pub fn parse_program(&mut self) -> Ast {
        self.parse_program_or_function_body(TokenKind::Eos, false)
    }

    pub fn parse_function_body(&mut self, ending: TokenKind) -> Ast {
        self.parse_program_or_function_body(ending, true)
    }

    fn parse_program_or_function_body(&mut self, ending: TokenKind, is_func_body: bool) -> Ast {
        let start = self.lexer.pos();

        // 14.1 directive prologue: exactly "use strict" / 'use strict',
        // terminated by an explicit or inserted semicolon.
        let mut strict = false;
        let checkpoint = self.lexer.checkpoint();
        let token = self.lexer.next_and_rewind();
        if token.kind == TokenKind::String {
            let text = token.text(self.units);
            if text == "\"use strict\"" || text == "'use strict'" {
                self.lexer.next();
                if self.lexer.try_skip_semicolon() {
                    strict = true;
                } else {
                    self.lexer.rewind(checkpoint);
                }
            }
        }

        let mut func_decls = Vec::new();
        let mut statements = Vec::new();
        let mut token = self.lexer.next_and_rewind();
        while token.kind != ending {
            if token.is_keyword(Keyword::Function) {
                let func = self.parse_function(true);
                if func.is_illegal() {
                    return func;
                }
                let AstKind::Func(id) = func.kind else {
                    unreachable!("parse_function returns Func or Illegal");
                };
                func_decls.push(id);
            } else {
                let stmt = self.parse_statement();
                if stmt.is_illegal() {
                    return stmt;
                }
                statements.push(stmt);
            }
            token = self.lexer.next_and_rewind();
        }

        let body = ProgramBody {
            strict,
            func_decls,
            statements,
        };
        let kind = if is_func_body {
            AstKind::FuncBody(body)
        } else {
            AstKind::Program(body)
        };
        Ast::new(kind, self.span(start))
    }

    // ---- expressions ----

    pub fn parse_primary_expression(&mut self) -> Ast {
        let token = self.lexer.next_and_rewind();
        match token.kind {
            TokenKind::Keyword(Keyword::This) => {
                self.lexer.next();
                Ast::new(AstKind::This, token.range)
            }
            TokenKind::Ident => {
                self.lexer.next();
                Ast::new(AstKind::Ident, token.range)
            }
            TokenKind::Null => {
                self.lexer.next();
                Ast::new(AstKind::Null, token.range)
            }
            TokenKind::Bool(_) => {
                self.lexer.next();
                Ast::new(AstKind::Bool, token.range)
            }
            TokenKind::Number => {
                self.lexer.next();
                Ast::new(AstKind::Number, token.range)
            }
            TokenKind::String => {
                self.lexer.next();
                Ast::new(AstKind::String, token.range)
            }
            TokenKind::Punct(Punct::LBrack) => self.parse_array_literal(),
            TokenKind::Punct(Punct::LBrace) => self.parse_object_literal(),
            TokenKind::Punct(Punct::LParen) => {
                self.lexer.next(); // skip (
                let expr = self.parse_expression(false);
                if expr.is_illegal() {
                    return expr;
                }
                if !self.lexer.next().is_punct(Punct::RParen) {
                    return Self::illegal_at(token.range);
                }
                let range = expr.range;
                Ast::new(AstKind::Paren { expr: Box::new(expr) }, range)
            }
            // A slash in primary-expression position starts a regular
            // expression literal, so re-scan from here.
            TokenKind::Punct(Punct::Div | Punct::DivAssign) => {
                let regex = self.lexer.scan_regex_literal();
                if regex.kind == TokenKind::Regex {
                    Ast::new(AstKind::Regex, regex.range)
                } else {
                    Self::illegal_at(regex.range)
                }
            }
            _ => Self::illegal_at(token.range),
        }
    }

    fn parse_array_literal(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_punct(Punct::LBrack));

        let mut elements: Vec<Option<Ast>> = Vec::new();
        let mut element: Option<Ast> = None;
        let mut token = self.lexer.next_and_rewind();
        while !token.is_punct(Punct::RBrack) {
            if token.is_punct(Punct::Comma) {
                self.lexer.next();
                elements.push(element.take());
            } else {
                let parsed = self.parse_assignment_expression(false);
                if parsed.is_illegal() {
                    return parsed;
                }
                element = Some(parsed);
            }
            token = self.lexer.next_and_rewind();
        }
        if element.is_some() {
            elements.push(element);
        }
        self.lexer.next(); // skip ]
        Ast::new(AstKind::Array { elements }, self.span(start))
    }

    fn parse_object_literal(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_punct(Punct::LBrace));

        let mut properties = Vec::new();
        let mut token = self.lexer.next_and_rewind();
        while !token.is_punct(Punct::RBrace) {
            if !token.is_property_name() {
                self.lexer.next();
                return self.illegal(start);
            }
            self.lexer.next(); // consume the property name (or get/set)
            let text = token.text(self.units);
            if (text == "get" || text == "set") && self.lexer.next_and_rewind().is_property_name() {
                let kind = if text == "get" {
                    PropertyKind::Get
                } else {
                    PropertyKind::Set
                };
                let accessor_start = self.lexer.pos();
                let key = self.lexer.next();
                if !key.is_property_name() {
                    return self.illegal(start);
                }
                if !self.lexer.next().is_punct(Punct::LParen) {
                    return self.illegal(start);
                }
                let mut params: SmallVec<[Token; 4]> = SmallVec::new();
                if kind == PropertyKind::Set {
                    let param = self.lexer.next();
                    if !param.is_identifier() {
                        return self.illegal(start);
                    }
                    params.push(param);
                }
                if !self.lexer.next().is_punct(Punct::RParen) {
                    return self.illegal(start);
                }
                if !self.lexer.next().is_punct(Punct::LBrace) {
                    return self.illegal(start);
                }
                let body = self.parse_function_body(TokenKind::Punct(Punct::RBrace));
                if body.is_illegal() {
                    return body;
                }
                if !self.lexer.next().is_punct(Punct::RBrace) {
                    return self.illegal(start);
                }
                let range = self.span(accessor_start);
                let id = self.add_function(FuncDef {
                    name: None,
                    params,
                    body,
                    range,
                });
                properties.push(ObjectProperty {
                    key,
                    value: Ast::new(AstKind::Func(id), range),
                    kind,
                });
            } else {
                if !self.lexer.next().is_punct(Punct::Colon) {
                    return self.illegal(start);
                }
                let value = self.parse_assignment_expression(false);
                if value.is_illegal() {
                    return self.illegal(start);
                }
                properties.push(ObjectProperty {
                    key: token,
                    value,
                    kind: PropertyKind::Normal,
                });
            }
            token = self.lexer.next_and_rewind();
            if token.is_punct(Punct::Comma) {
                self.lexer.next();
                token = self.lexer.next_and_rewind();
            }
        }
        self.lexer.next(); // skip }
        Ast::new(AstKind::Object { properties }, self.span(start))
    }

    /// Expression: an AssignmentExpression, or a comma-separated sequence of
    /// them. A single element is returned unwrapped.
    pub fn parse_expression(&mut self, no_in: bool) -> Ast {
        let start = self.lexer.pos();

        let element = self.parse_assignment_expression(no_in);
        if element.is_illegal() {
            return element;
        }
        let token = self.lexer.next_and_rewind();
        if !token.is_punct(Punct::Comma) {
            return element;
        }

        let mut elements = vec![element];
        let mut token = token;
        while token.is_punct(Punct::Comma) {
            self.lexer.next(); // skip ,
            let element = self.parse_assignment_expression(no_in);
            if element.is_illegal() {
                return element;
            }
            elements.push(element);
            token = self.lexer.next_and_rewind();
        }
        Ast::new(AstKind::Expr { elements }, self.span(start))
    }

    pub fn parse_assignment_expression(&mut self, no_in: bool) -> Ast {
        let start = self.lexer.pos();

        let lhs = self.parse_conditional_expression(no_in);
        if lhs.is_illegal() {
            return lhs;
        }
        // Only a LeftHandSideExpression can be an assignment target.
        if !matches!(lhs.kind, AstKind::Lhs { .. }) {
            return lhs;
        }
        let op = self.lexer.next_and_rewind();
        if !op.is_assignment_operator() {
            return lhs;
        }

        self.lexer.next();
        let rhs = self.parse_assignment_expression(no_in);
        if rhs.is_illegal() {
            return rhs;
        }
        Ast::new(
            AstKind::Binary {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                op,
            },
            self.span(start),
        )
    }

    pub fn parse_conditional_expression(&mut self, no_in: bool) -> Ast {
        let start = self.lexer.pos();
        let cond = self.parse_binary_and_unary_expression(no_in, 0);
        if cond.is_illegal() {
            return cond;
        }
        let token = self.lexer.next_and_rewind();
        if !token.is_punct(Punct::Question) {
            return cond;
        }
        self.lexer.next();
        let then = self.parse_assignment_expression(no_in);
        if then.is_illegal() {
            return then;
        }
        let token = self.lexer.next_and_rewind();
        if !token.is_punct(Punct::Colon) {
            return self.illegal(start);
        }
        self.lexer.next();
        let other = self.parse_assignment_expression(no_in);
        if other.is_illegal() {
            return other;
        }
        Ast::new(
            AstKind::Triple {
                cond: Box::new(cond),
                then: Box::new(then),
                other: Box::new(other),
            },
            self.span(start),
        )
    }

    /// Precedence climbing over binary and unary operators.
    ///
    /// Prefix operators recurse at their own priority (`>=`, so prefixes
    /// nest: `!!a`, `typeof typeof a`). A postfix operator is taken only when
    /// no line terminator precedes it and the operand is not itself a binary
    /// or unary node. The binary loop consumes operators that bind strictly
    /// tighter than `priority`, giving left associativity.
    pub fn parse_binary_and_unary_expression(&mut self, no_in: bool, priority: u8) -> Ast {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.illegal(self.lexer.pos());
        }
        self.depth += 1;
        let result = self.parse_binary_and_unary_inner(no_in, priority);
        self.depth -= 1;
        result
    }

    fn parse_binary_and_unary_inner(&mut self, no_in: bool, priority: u8) -> Ast {
        let start = self.lexer.pos();
        let mut lhs;

        let prefix_op = self.lexer.next_and_rewind();
        let prefix_priority = prefix_op.unary_prefix_priority();
        if prefix_priority != 0 && prefix_priority >= priority {
            self.lexer.next();
            let operand = self.parse_binary_and_unary_expression(no_in, prefix_priority);
            if operand.is_illegal() {
                return operand;
            }
            lhs = Ast::new(
                AstKind::Unary {
                    operand: Box::new(operand),
                    op: prefix_op,
                    prefix: true,
                },
                self.span(start),
            );
        } else {
            lhs = self.parse_left_hand_side_expression();
            if lhs.is_illegal() {
                return lhs;
            }
            // Postfix operators bind tighter than prefix ones, so the two
            // never apply to the same parse.
            let postfix_op = self.lexer.next_and_rewind();
            if !self.lexer.line_term_ahead() && postfix_op.unary_postfix_priority() > priority {
                if matches!(lhs.kind, AstKind::Binary { .. } | AstKind::Unary { .. }) {
                    return self.illegal(start);
                }
                self.lexer.next();
                lhs = Ast::new(
                    AstKind::Unary {
                        operand: Box::new(lhs),
                        op: postfix_op,
                        prefix: false,
                    },
                    self.span(start),
                );
            }
        }

        loop {
            let binary_op = self.lexer.next_and_rewind();
            let binary_priority = binary_op.binary_priority(no_in);
            if binary_priority <= priority {
                break;
            }
            self.lexer.next();
            let rhs = self.parse_binary_and_unary_expression(no_in, binary_priority);
            if rhs.is_illegal() {
                return rhs;
            }
            lhs = Ast::new(
                AstKind::Binary {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    op: binary_op,
                },
                self.span(start),
            );
        }
        lhs.range = self.span(start);
        lhs
    }

    pub fn parse_left_hand_side_expression(&mut self) -> Ast {
        let start = self.lexer.pos();
        let mut token = self.lexer.next_and_rewind();

        let mut new_count = 0;
        while token.is_keyword(Keyword::New) {
            self.lexer.next();
            new_count += 1;
            token = self.lexer.next_and_rewind();
        }

        let base = if token.is_keyword(Keyword::Function) {
            self.parse_function(false)
        } else {
            self.parse_primary_expression()
        };
        if base.is_illegal() {
            return base;
        }

        let mut postfixes = Vec::new();
        loop {
            let token = self.lexer.next_and_rewind();
            match token.kind {
                TokenKind::Punct(Punct::LParen) => {
                    let args = self.parse_arguments();
                    if args.is_illegal() {
                        return args;
                    }
                    postfixes.push(Postfix::Call(args));
                }
                TokenKind::Punct(Punct::LBrack) => {
                    self.lexer.next(); // skip [
                    let index = self.parse_expression(false);
                    if index.is_illegal() {
                        return index;
                    }
                    if !self.lexer.next().is_punct(Punct::RBrack) {
                        return self.illegal(start);
                    }
                    postfixes.push(Postfix::Index(index));
                }
                TokenKind::Punct(Punct::Dot) => {
                    self.lexer.next(); // skip .
                    let prop = self.lexer.next();
                    if !prop.is_identifier_name() {
                        return self.illegal(start);
                    }
                    postfixes.push(Postfix::Prop(prop));
                }
                _ => {
                    return Ast::new(
                        AstKind::Lhs {
                            base: Box::new(base),
                            new_count,
                            postfixes,
                        },
                        self.span(start),
                    );
                }
            }
        }
    }

    pub fn parse_arguments(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_punct(Punct::LParen));

        let mut args = Vec::new();
        let mut token = self.lexer.next_and_rewind();
        if !token.is_punct(Punct::RParen) {
            let arg = self.parse_assignment_expression(false);
            if arg.is_illegal() {
                return arg;
            }
            args.push(arg);
            token = self.lexer.next_and_rewind();
        }
        while !token.is_punct(Punct::RParen) {
            if !token.is_punct(Punct::Comma) {
                return self.illegal(start);
            }
            self.lexer.next(); // skip ,
            let arg = self.parse_assignment_expression(false);
            if arg.is_illegal() {
                return arg;
            }
            args.push(arg);
            token = self.lexer.next_and_rewind();
        }
        self.lexer.next(); // skip )
        Ast::new(AstKind::Args { args }, self.span(start))
    }

    /// FunctionExpression (named or anonymous).
    pub fn parse_function_expression(&mut self) -> Ast {
        self.parse_function(false)
    }

    fn parse_function(&mut self, must_be_named: bool) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Function));

        let mut name = None;
        let mut token = self.lexer.next();
        if token.is_identifier() {
            name = Some(token);
            token = self.lexer.next();
        } else if must_be_named {
            return self.illegal(start);
        }
        if !token.is_punct(Punct::LParen) {
            return self.illegal(start);
        }
        let mut params: SmallVec<[Token; 4]> = SmallVec::new();
        if self.lexer.next_and_rewind().is_identifier() {
            if let Some(parsed) = self.parse_formal_parameter_list() {
                params = parsed;
            }
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            return self.illegal(start);
        }
        if !self.lexer.next().is_punct(Punct::LBrace) {
            return self.illegal(start);
        }
        let body = self.parse_function_body(TokenKind::Punct(Punct::RBrace));
        if body.is_illegal() {
            return body;
        }
        if !self.lexer.next().is_punct(Punct::RBrace) {
            return self.illegal(start);
        }

        let range = self.span(start);
        let id = self.add_function(FuncDef {
            name,
            params,
            body,
            range,
        });
        Ast::new(AstKind::Func(id), range)
    }

    /// Parses `ident (, ident)*`, assuming the first token is an identifier.
    /// `None` signals a malformed list; the caller reports the error with
    /// the cursor wherever the list parse stopped.
    fn parse_formal_parameter_list(&mut self) -> Option<SmallVec<[Token; 4]>> {
        debug_assert!(self.lexer.next_and_rewind().is_identifier());
        let mut params: SmallVec<[Token; 4]> = SmallVec::new();
        params.push(self.lexer.next());
        let mut token = self.lexer.next_and_rewind();
        // EOS also terminates, for Function("a,b,c", "...") sources
        while !token.is_punct(Punct::RParen) && token.kind != TokenKind::Eos {
            if !token.is_punct(Punct::Comma) {
                return None;
            }
            self.lexer.next(); // skip ,
            let param = self.lexer.next();
            if !param.is_identifier() {
                return None;
            }
            params.push(param);
            token = self.lexer.next_and_rewind();
        }
        Some(params)
    }

    fn add_function(&mut self, def: FuncDef) -> FuncId {
        let id = FuncId::new(self.functions.len());
        self.functions.push(def);
        id
    }

    // ---- statements ----

    pub fn parse_statement(&mut self) -> Ast {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.illegal(self.lexer.pos());
        }
        self.depth += 1;
        let result = self.parse_statement_inner();
        self.depth -= 1;
        result
    }

    fn parse_statement_inner(&mut self) -> Ast {
        let token = self.lexer.next_and_rewind();
        match token.kind {
            TokenKind::Punct(Punct::LBrace) => self.parse_block_statement(),
            TokenKind::Punct(Punct::Semicolon) => {
                self.lexer.next();
                Ast::new(AstKind::Empty, token.range)
            }
            TokenKind::Keyword(keyword) => match keyword {
                Keyword::Var => self.parse_variable_statement(false),
                Keyword::If => self.parse_if_statement(),
                Keyword::Do => self.parse_do_while_statement(),
                Keyword::While => self.parse_while_statement(),
                Keyword::For => self.parse_for_statement(),
                Keyword::Continue => self.parse_continue_statement(),
                Keyword::Break => self.parse_break_statement(),
                Keyword::Return => self.parse_return_statement(),
                Keyword::With => self.parse_with_statement(),
                Keyword::Switch => self.parse_switch_statement(),
                Keyword::Throw => self.parse_throw_statement(),
                Keyword::Try => self.parse_try_statement(),
                Keyword::Debugger => {
                    let start = self.lexer.pos();
                    self.lexer.next();
                    if !self.lexer.try_skip_semicolon() {
                        self.lexer.next();
                        return self.illegal(start);
                    }
                    Ast::new(AstKind::Debugger, self.span(start))
                }
                _ => self.parse_expression_statement(),
            },
            TokenKind::Ident => {
                // two-token lookahead for `ident :` labelled statements
                let checkpoint = self.lexer.checkpoint();
                self.lexer.next();
                let colon = self.lexer.next();
                self.lexer.rewind(checkpoint);
                if colon.is_punct(Punct::Colon) {
                    self.parse_labelled_statement()
                } else {
                    self.parse_expression_statement()
                }
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_punct(Punct::LBrace));

        let mut stmts = Vec::new();
        let mut token = self.lexer.next_and_rewind();
        while !token.is_punct(Punct::RBrace) {
            if token.kind == TokenKind::Eos {
                return self.illegal(start);
            }
            let stmt = self.parse_statement();
            if stmt.is_illegal() {
                return stmt;
            }
            stmts.push(stmt);
            token = self.lexer.next_and_rewind();
        }
        self.lexer.next(); // skip }
        Ast::new(AstKind::Block { stmts }, self.span(start))
    }

    fn parse_variable_declaration(&mut self, no_in: bool) -> Ast {
        let start = self.lexer.pos();
        let ident = self.lexer.next();
        debug_assert!(ident.is_identifier());
        if !self.lexer.next_and_rewind().is_punct(Punct::Assign) {
            return Ast::new(AstKind::VarDecl { name: ident, init: None }, self.span(start));
        }
        self.lexer.next(); // skip =
        let init = self.parse_assignment_expression(no_in);
        if init.is_illegal() {
            return init;
        }
        Ast::new(
            AstKind::VarDecl {
                name: ident,
                init: Some(Box::new(init)),
            },
            self.span(start),
        )
    }

    fn parse_variable_statement(&mut self, no_in: bool) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Var));

        let mut decls = Vec::new();
        if !self.lexer.next_and_rewind().is_identifier() {
            self.lexer.next();
            return self.illegal(start);
        }
        let decl = self.parse_variable_declaration(no_in);
        if decl.is_illegal() {
            return decl;
        }
        decls.push(decl);
        let mut token = self.lexer.next_and_rewind();
        while token.is_punct(Punct::Comma) {
            self.lexer.next(); // skip ,
            if !self.lexer.next_and_rewind().is_identifier() {
                self.lexer.next();
                return self.illegal(start);
            }
            let decl = self.parse_variable_declaration(no_in);
            if decl.is_illegal() {
                return decl;
            }
            decls.push(decl);
            token = self.lexer.next_and_rewind();
        }
        if !self.lexer.try_skip_semicolon() {
            self.lexer.next();
            return self.illegal(start);
        }
        Ast::new(AstKind::VarStmt { decls }, self.span(start))
    }

    fn parse_expression_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let token = self.lexer.next_and_rewind();
        // an expression statement may not begin with `{` or `function`
        if token.is_punct(Punct::LBrace) || token.is_keyword(Keyword::Function) {
            return self.illegal(start);
        }
        let expr = self.parse_expression(false);
        if expr.is_illegal() {
            return expr;
        }
        if !self.lexer.try_skip_semicolon() {
            self.lexer.next();
            return self.illegal(start);
        }
        expr
    }

    fn parse_if_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::If));
        if !self.lexer.next().is_punct(Punct::LParen) {
            return self.illegal(start);
        }
        let cond = self.parse_expression(false);
        if cond.is_illegal() {
            return cond;
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            return self.illegal(start);
        }
        let then = self.parse_statement();
        if then.is_illegal() {
            return then;
        }
        let mut other = None;
        if self.lexer.next_and_rewind().is_keyword(Keyword::Else) {
            self.lexer.next(); // skip else
            let else_block = self.parse_statement();
            if else_block.is_illegal() {
                return else_block;
            }
            other = Some(Box::new(else_block));
        }
        Ast::new(
            AstKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                other,
            },
            self.span(start),
        )
    }

    fn parse_do_while_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Do));
        let body = self.parse_statement();
        if body.is_illegal() {
            return body;
        }
        if !self.lexer.next().is_keyword(Keyword::While) {
            return self.illegal(start);
        }
        if !self.lexer.next().is_punct(Punct::LParen) {
            return self.illegal(start);
        }
        let cond = self.parse_expression(false);
        if cond.is_illegal() {
            return cond;
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            return self.illegal(start);
        }
        if !self.lexer.try_skip_semicolon() {
            self.lexer.next();
            return self.illegal(start);
        }
        Ast::new(
            AstKind::DoWhile {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            self.span(start),
        )
    }

    fn parse_while_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::While));
        match self.parse_paren_expr_and_statement(start) {
            Ok((cond, body)) => Ast::new(
                AstKind::While {
                    cond: Box::new(cond),
                    body: Box::new(body),
                },
                self.span(start),
            ),
            Err(illegal) => illegal,
        }
    }

    fn parse_with_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::With));
        match self.parse_paren_expr_and_statement(start) {
            Ok((object, body)) => Ast::new(
                AstKind::With {
                    object: Box::new(object),
                    body: Box::new(body),
                },
                self.span(start),
            ),
            Err(illegal) => illegal,
        }
    }

    /// Shared tail of `while` and `with`: `( Expression ) Statement`.
    fn parse_paren_expr_and_statement(&mut self, start: usize) -> Result<(Ast, Ast), Ast> {
        if !self.lexer.next().is_punct(Punct::LParen) {
            return Err(self.illegal(start));
        }
        let expr = self.parse_expression(false);
        if expr.is_illegal() {
            return Err(expr);
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            return Err(self.illegal(start));
        }
        let stmt = self.parse_statement();
        if stmt.is_illegal() {
            return Err(stmt);
        }
        Ok((expr, stmt))
    }

    fn parse_for_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::For));
        if !self.lexer.next().is_punct(Punct::LParen) {
            return self.illegal(start);
        }

        let token = self.lexer.next_and_rewind();
        if token.is_semicolon() {
            return self.parse_for_rest(Vec::new(), start); // for (;
        }
        if token.is_keyword(Keyword::Var) {
            self.lexer.next(); // skip var
            if !self.lexer.next_and_rewind().is_identifier() {
                return self.illegal(start);
            }
            let decl = self.parse_variable_declaration(true);
            if decl.is_illegal() {
                return decl;
            }

            let token = self.lexer.next_and_rewind();
            if token.is_keyword(Keyword::In) {
                // for ( var VariableDeclarationNoIn in
                return self.parse_for_in_rest(decl, start);
            }

            let mut decls = vec![decl];
            let mut token = token;
            while !token.is_semicolon() {
                if !self.lexer.next().is_punct(Punct::Comma) || !self.lexer.next_and_rewind().is_identifier() {
                    return self.illegal(start);
                }
                let decl = self.parse_variable_declaration(true);
                if decl.is_illegal() {
                    return decl;
                }
                decls.push(decl);
                token = self.lexer.next_and_rewind();
            }
            return self.parse_for_rest(decls, start); // for ( var VariableDeclarationListNoIn ;
        }

        let expr = self.parse_expression(true);
        if expr.is_illegal() {
            return expr;
        }
        let token = self.lexer.next_and_rewind();
        if token.is_semicolon() {
            self.parse_for_rest(vec![expr], start) // for ( ExpressionNoIn ;
        } else if token.is_keyword(Keyword::In) && matches!(expr.kind, AstKind::Lhs { .. }) {
            self.parse_for_in_rest(expr, start) // for ( LeftHandSideExpression in
        } else {
            self.illegal(start)
        }
    }

    fn parse_for_rest(&mut self, init: Vec<Ast>, start: usize) -> Ast {
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_semicolon());
        let mut cond = None;
        if !self.lexer.next_and_rewind().is_semicolon() {
            let expr = self.parse_expression(false);
            if expr.is_illegal() {
                return expr;
            }
            cond = Some(Box::new(expr));
        }
        if !self.lexer.next().is_semicolon() {
            self.lexer.next();
            return self.illegal(start);
        }

        let mut step = None;
        if !self.lexer.next_and_rewind().is_punct(Punct::RParen) {
            let expr = self.parse_expression(false);
            if expr.is_illegal() {
                return expr;
            }
            step = Some(Box::new(expr));
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            self.lexer.next();
            return self.illegal(start);
        }

        let body = self.parse_statement();
        if body.is_illegal() {
            return body;
        }
        Ast::new(
            AstKind::For {
                init,
                cond,
                step,
                body: Box::new(body),
            },
            self.span(start),
        )
    }

    fn parse_for_in_rest(&mut self, left: Ast, start: usize) -> Ast {
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::In));
        let right = self.parse_expression(false);
        if right.is_illegal() {
            return right;
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            self.lexer.next();
            return self.illegal(start);
        }
        let body = self.parse_statement();
        if body.is_illegal() {
            return body;
        }
        Ast::new(
            AstKind::ForIn {
                left: Box::new(left),
                right: Box::new(right),
                body: Box::new(body),
            },
            self.span(start),
        )
    }

    fn parse_continue_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Continue));
        match self.parse_optional_label(start) {
            Ok(label) => Ast::new(AstKind::Continue { label }, self.span(start)),
            Err(illegal) => illegal,
        }
    }

    fn parse_break_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Break));
        match self.parse_optional_label(start) {
            Ok(label) => Ast::new(AstKind::Break { label }, self.span(start)),
            Err(illegal) => illegal,
        }
    }

    /// Optional label with ASI: `continue` / `break`, then an identifier on
    /// the same logical statement, then a (possibly inserted) semicolon.
    fn parse_optional_label(&mut self, start: usize) -> Result<Option<Token>, Ast> {
        if self.lexer.try_skip_semicolon() {
            return Ok(None);
        }
        let ident = self.lexer.next_and_rewind();
        let mut label = None;
        if ident.is_identifier() {
            self.lexer.next();
            label = Some(ident);
        }
        if !self.lexer.try_skip_semicolon() {
            self.lexer.next();
            return Err(self.illegal(start));
        }
        Ok(label)
    }

    fn parse_return_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Return));
        let mut expr = None;
        if !self.lexer.try_skip_semicolon() {
            let parsed = self.parse_expression(false);
            if parsed.is_illegal() {
                return parsed;
            }
            if !self.lexer.try_skip_semicolon() {
                self.lexer.next();
                return self.illegal(start);
            }
            expr = Some(Box::new(parsed));
        }
        Ast::new(AstKind::Return { expr }, self.span(start))
    }

    fn parse_throw_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Throw));
        let mut expr = None;
        if !self.lexer.try_skip_semicolon() {
            let parsed = self.parse_expression(false);
            if parsed.is_illegal() {
                return parsed;
            }
            if !self.lexer.try_skip_semicolon() {
                self.lexer.next();
                return self.illegal(start);
            }
            expr = Some(Box::new(parsed));
        }
        Ast::new(AstKind::Throw { expr }, self.span(start))
    }

    fn parse_switch_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Switch));
        if !self.lexer.next().is_punct(Punct::LParen) {
            return self.illegal(start);
        }
        let expr = self.parse_expression(false);
        if expr.is_illegal() {
            return expr;
        }
        if !self.lexer.next().is_punct(Punct::RParen) {
            return self.illegal(start);
        }
        if !self.lexer.next().is_punct(Punct::LBrace) {
            return self.illegal(start);
        }

        let mut before_default = Vec::new();
        let mut default_clause: Option<Vec<Ast>> = None;
        let mut after_default = Vec::new();

        let mut token = self.lexer.next_and_rewind();
        while !token.is_punct(Punct::RBrace) {
            let mut case_expr = None;
            if token.is_keyword(Keyword::Case) {
                self.lexer.next(); // skip case
                let expr = self.parse_expression(false);
                if expr.is_illegal() {
                    return expr;
                }
                case_expr = Some(expr);
            } else if token.is_keyword(Keyword::Default) {
                self.lexer.next(); // skip default
                // only one default clause is allowed
                if default_clause.is_some() {
                    return self.illegal(start);
                }
            } else {
                self.lexer.next();
                return self.illegal(start);
            }
            if !self.lexer.next().is_punct(Punct::Colon) {
                return self.illegal(start);
            }

            let mut stmts = Vec::new();
            let mut inner = self.lexer.next_and_rewind();
            while !inner.is_keyword(Keyword::Case) && !inner.is_keyword(Keyword::Default) && !inner.is_punct(Punct::RBrace)
            {
                if inner.kind == TokenKind::Eos {
                    return self.illegal(start);
                }
                let stmt = self.parse_statement();
                if stmt.is_illegal() {
                    return stmt;
                }
                stmts.push(stmt);
                inner = self.lexer.next_and_rewind();
            }

            match case_expr {
                Some(expr) => {
                    let clause = CaseClause { expr, stmts };
                    if default_clause.is_some() {
                        after_default.push(clause);
                    } else {
                        before_default.push(clause);
                    }
                }
                None => default_clause = Some(stmts),
            }
            token = self.lexer.next_and_rewind();
        }
        self.lexer.next(); // skip }
        Ast::new(
            AstKind::Switch {
                expr: Box::new(expr),
                before_default,
                default_clause,
                after_default,
            },
            self.span(start),
        )
    }

    fn parse_try_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_keyword(Keyword::Try));

        let block = self.parse_block_statement();
        if block.is_illegal() {
            return block;
        }

        let mut catch = None;
        if self.lexer.next_and_rewind().is_keyword(Keyword::Catch) {
            self.lexer.next(); // skip catch
            if !self.lexer.next().is_punct(Punct::LParen) {
                return self.illegal(start);
            }
            let param = self.lexer.next();
            if !param.is_identifier() {
                return self.illegal(start);
            }
            if !self.lexer.next().is_punct(Punct::RParen) {
                return self.illegal(start);
            }
            let catch_block = self.parse_block_statement();
            if catch_block.is_illegal() {
                return catch_block;
            }
            catch = Some(CatchClause {
                param,
                block: Box::new(catch_block),
            });
        }

        let mut finally = None;
        if self.lexer.next_and_rewind().is_keyword(Keyword::Finally) {
            self.lexer.next(); // skip finally
            let finally_block = self.parse_block_statement();
            if finally_block.is_illegal() {
                return finally_block;
            }
            finally = Some(Box::new(finally_block));
        }

        // at least one of catch/finally is required
        if catch.is_none() && finally.is_none() {
            return self.illegal(start);
        }
        Ast::new(
            AstKind::Try {
                block: Box::new(block),
                catch,
                finally,
            },
            self.span(start),
        )
    }

    fn parse_labelled_statement(&mut self) -> Ast {
        let start = self.lexer.pos();
        let label = self.lexer.next();
        let consumed = self.lexer.next();
        debug_assert!(consumed.is_punct(Punct::Colon));
        let stmt = self.parse_statement();
        if stmt.is_illegal() {
            return stmt;
        }
        Ast::new(
            AstKind::Label {
                label,
                stmt: Box::new(stmt),
            },
            self.span(start),
        )
    }
}
