//! Parser tests: node kinds and source-slice round-trips for every
//! production, plus the precedence and nesting properties.

use pretty_assertions::assert_eq;
use sedge::{Ast, AstKind, Parser, MAX_NESTING_DEPTH};

fn units(source: &str) -> Vec<u16> {
    source.encode_utf16().collect()
}

fn text(ast: &Ast, source: &[u16]) -> String {
    ast.text(source)
}

#[test]
fn primary_this() {
    let source = units("\n \t this");
    let mut parser = Parser::new(&source);
    let ast = parser.parse_primary_expression();
    assert!(matches!(ast.kind, AstKind::This));
    assert_eq!(text(&ast, &source), "this");
}

#[test]
fn primary_identifiers() {
    for case in ["你好", "_abcDEF$", "NULL", "Null", "True", "False"] {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Ident), "{case}");
        assert_eq!(text(&ast, &source), case);
    }
}

#[test]
fn primary_literals() {
    let source = units("null");
    assert!(matches!(Parser::new(&source).parse_primary_expression().kind, AstKind::Null));

    for case in ["true", "false"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Bool));
        assert_eq!(text(&ast, &source), case);
    }

    for case in ["0", "101", "0.01", "12.05", ".8", "0xAbC09"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Number), "{case}");
        assert_eq!(text(&ast, &source), case);
    }

    for case in ["''", "'\\n\\b\\u1234\\x12'", "'😊'"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::String), "{case}");
        assert_eq!(text(&ast, &source), case);
    }
}

#[test]
fn primary_regex() {
    for case in ["/a/", "/[a-z]*?/", "/[012]/g", "/[012]/$", "/你好/"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Regex), "{case}");
        assert_eq!(text(&ast, &source), case);
    }
}

#[test]
fn primary_illegal() {
    let source = units("for");
    let ast = Parser::new(&source).parse_primary_expression();
    assert!(ast.is_illegal());
    assert_eq!(text(&ast, &source), "for");

    // a lone surrogate half cannot start anything
    let source: Vec<u16> = vec![0xD83D, 0xDE0A];
    let ast = Parser::new(&source).parse_primary_expression();
    assert!(ast.is_illegal());
    assert_eq!(ast.source(&source), &[0xD83D]);
}

#[test]
fn array_literals() {
    let cases = [("[]", 0usize), ("[,]", 1), ("[abc, 123,'string', ]", 3), ("[1+2*3, ++a]", 2)];
    for (case, length) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        let AstKind::Array { elements } = &ast.kind else {
            panic!("expected array for {case}");
        };
        assert_eq!(elements.len(), length, "{case}");
        assert_eq!(text(&ast, &source), case);
    }

    for (case, error) in [("[a,", ""), ("[", "")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(ast.is_illegal(), "{case}");
        assert_eq!(text(&ast, &source), error);
    }
}

#[test]
fn object_literals() {
    for case in ["{}", "{a: 1}", "{in: bed}", "{1: 1}", "{\"abc\": 1}"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Object { .. }), "{case}");
        assert_eq!(text(&ast, &source), case);
    }

    for (case, error) in [("{a,}", "{a,"), ("{a 1}", "{a 1")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(ast.is_illegal(), "{case}");
        assert_eq!(text(&ast, &source), error);
    }
}

#[test]
fn object_accessor_properties() {
    let source = units("{get b() {return 1}, set b(x) {}}");
    let ast = Parser::new(&source).parse_primary_expression();
    let AstKind::Object { properties } = &ast.kind else {
        panic!("expected object literal");
    };
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].kind, sedge::PropertyKind::Get);
    assert_eq!(properties[1].kind, sedge::PropertyKind::Set);
}

#[test]
fn parenthesized_expressions() {
    for (case, inner) in [("(a)", "a"), ("(a + b)", "a + b"), ("(a + b, a++)", "a + b, a++")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_primary_expression();
        assert!(matches!(ast.kind, AstKind::Paren { .. }), "{case}");
        assert_eq!(text(&ast, &source), inner);
    }

    let source = units("()");
    let ast = Parser::new(&source).parse_primary_expression();
    assert!(ast.is_illegal());
    assert_eq!(text(&ast, &source), ")");
}

#[test]
fn binary_precedence_splits() {
    let cases = [
        ("a + b * c", "a", " b * c"),
        ("a * b + c", "a * b", " c"),
        ("a * b + + c - d", "a * b + + c", " d"),
        ("a++ == b && ++c != d", "a++ == b", " ++c != d"),
        ("(1 + 3) * 5 - (8 + 16)", "(1 + 3) * 5", " (8 + 16)"),
    ];
    for (case, left, right) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_binary_and_unary_expression(false, 0);
        let AstKind::Binary { lhs, rhs, .. } = &ast.kind else {
            panic!("expected binary for {case}");
        };
        assert_eq!(text(&ast, &source), case);
        assert_eq!(text(lhs, &source), left, "{case}");
        assert_eq!(text(rhs, &source), right, "{case}");
    }
}

/// For operators a, b with prec(a) < prec(b), `x a y b z` roots at a.
#[test]
fn precedence_property() {
    let cases = [("x + y * z", "+"), ("x * y + z", "+"), ("x == y && y != z", "&&"), ("x < y == z", "==")];
    for (case, root_op) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_binary_and_unary_expression(false, 0);
        let AstKind::Binary { op, .. } = &ast.kind else {
            panic!("expected binary for {case}");
        };
        assert_eq!(op.text(&source), root_op, "{case}");
    }
}

#[test]
fn unary_expressions() {
    for (case, operand) in [("a ++", "a"), ("++\na", "\na"), ("++ a", " a"), ("!!a", "!a")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_binary_and_unary_expression(false, 0);
        let AstKind::Unary { operand: node, .. } = &ast.kind else {
            panic!("expected unary for {case}");
        };
        assert_eq!(text(&ast, &source), case);
        assert_eq!(text(node, &source), operand, "{case}");
    }

    // postfix requires the operand on the same line
    let source = units("a\n++");
    let ast = Parser::new(&source).parse_binary_and_unary_expression(false, 0);
    assert!(!matches!(ast.kind, AstKind::Unary { .. }));
    assert_eq!(text(&ast, &source), "a");
}

#[test]
fn conditional_expressions() {
    let cases = [
        ("a ?b:c", "a", "b", "c"),
        ("a ?c ? d : e : c", "a", "c ? d : e", " c"),
    ];
    for (case, c, t, o) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_conditional_expression(false);
        let AstKind::Triple { cond, then, other } = &ast.kind else {
            panic!("expected conditional for {case}");
        };
        assert_eq!(text(&ast, &source), case);
        assert_eq!(text(cond, &source), c);
        assert_eq!(text(then, &source), t);
        assert_eq!(text(other, &source), o);
    }

    for (case, error) in [("a ?b c", "a ?b"), ("a ", "a")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_conditional_expression(false);
        assert!(!matches!(ast.kind, AstKind::Triple { .. }), "{case}");
        assert_eq!(text(&ast, &source), error);
    }
}

#[test]
fn function_expressions() {
    let cases: [(&str, Option<&str>, &[&str]); 3] = [
        ("function () {}", None, &[]),
        ("function name (a, b) {}", Some("name"), &["a", "b"]),
        ("function (a, a, c) {}", None, &["a", "a", "c"]),
    ];
    for (case, name, params) in cases {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_function_expression();
        let AstKind::Func(id) = ast.kind else {
            panic!("expected function for {case}");
        };
        assert_eq!(text(&ast, &source), case);
        let def = &parser.functions()[id.index()];
        assert_eq!(def.name.map(|t| t.text(&source)), name.map(str::to_owned));
        let parsed: Vec<String> = def.params.iter().map(|t| t.text(&source)).collect();
        assert_eq!(parsed, params);
    }

    for (case, error) in [("function (,) {}", "function (,"), ("function (a a) {}", "function (a a")] {
        let source = units(case);
        let ast = Parser::new(&source).parse_function_expression();
        assert!(ast.is_illegal(), "{case}");
        assert_eq!(text(&ast, &source), error);
    }
}

#[test]
fn argument_lists() {
    let cases: [(&str, &[&str]); 3] = [
        ("()", &[]),
        ("(a)", &["a"]),
        ("(a, 1+3, function(){})", &["a", " 1+3", " function(){}"]),
    ];
    for (case, expected) in cases {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_arguments();
        let AstKind::Args { args } = &ast.kind else {
            panic!("expected arguments for {case}");
        };
        assert_eq!(text(&ast, &source), case);
        let parsed: Vec<String> = args.iter().map(|a| a.text(&source)).collect();
        assert_eq!(parsed, expected);
    }
}

#[test]
fn left_hand_side_chains() {
    for case in [
        "new Object()",
        "function(a, b, c){}(c, d)",
        "new new a[123 + xyz].__ABC['您好']()()",
    ] {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_left_hand_side_expression();
        assert!(matches!(ast.kind, AstKind::Lhs { .. }), "{case}");
        assert_eq!(text(&ast, &source), case);
    }
}

#[test]
fn lhs_postfix_order_is_preserved() {
    let source = units("a.b(1)[2].c()");
    let mut parser = Parser::new(&source);
    let ast = parser.parse_left_hand_side_expression();
    let AstKind::Lhs { postfixes, new_count, .. } = &ast.kind else {
        panic!("expected lhs");
    };
    assert_eq!(*new_count, 0);
    let shape: Vec<&str> = postfixes
        .iter()
        .map(|p| match p {
            sedge::Postfix::Prop(_) => "prop",
            sedge::Postfix::Call(_) => "call",
            sedge::Postfix::Index(_) => "index",
        })
        .collect();
    assert_eq!(shape, vec!["prop", "call", "index", "prop", "call"]);
}

#[test]
fn debugger_statements() {
    for (case, expected) in [
        ("\n \t debugger", "\n \t debugger"),
        ("debugger;", "debugger;"),
        ("debugger\na", "debugger"),
    ] {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_statement();
        assert!(matches!(ast.kind, AstKind::Debugger), "{case}");
        assert_eq!(text(&ast, &source), expected);
    }

    let source = units("debugger 1");
    let ast = Parser::new(&source).parse_statement();
    assert!(ast.is_illegal());
    assert_eq!(text(&ast, &source), "debugger 1");
}

#[test]
fn continue_statements() {
    let cases = [
        ("continue ;", "continue ;", false),
        ("continue a ", "continue a", true),
        ("continue a ;", "continue a ;", true),
        ("continue \n a ;", "continue", false),
        ("continue a \n ;", "continue a \n ;", true),
    ];
    for (case, expected, labelled) in cases {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let ast = parser.parse_statement();
        let AstKind::Continue { label } = &ast.kind else {
            panic!("expected continue for {case:?}");
        };
        assert_eq!(label.is_some(), labelled, "{case:?}");
        assert_eq!(text(&ast, &source), expected);
    }

    for case in ["continue 1", "continue a b"] {
        let source = units(case);
        let ast = Parser::new(&source).parse_statement();
        assert!(ast.is_illegal(), "{case}");
    }
}

#[test]
fn break_statements() {
    let cases = [
        ("break ;", "break ;"),
        ("break a ", "break a"),
        ("break a ;", "break a ;"),
        ("break \n a ;", "break"),
    ];
    for (case, expected) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_statement();
        assert!(matches!(ast.kind, AstKind::Break { .. }), "{case:?}");
        assert_eq!(text(&ast, &source), expected);
    }
}

#[test]
fn statement_dispatch() {
    let cases: [(&str, fn(&AstKind) -> bool); 9] = [
        (";", |k| matches!(k, AstKind::Empty)),
        ("{ a; b; }", |k| matches!(k, AstKind::Block { .. })),
        ("var a = 1, b;", |k| matches!(k, AstKind::VarStmt { .. })),
        ("if (a) b; else c;", |k| matches!(k, AstKind::If { .. })),
        ("do a; while (b);", |k| matches!(k, AstKind::DoWhile { .. })),
        ("while (a) b;", |k| matches!(k, AstKind::While { .. })),
        ("with (a) b;", |k| matches!(k, AstKind::With { .. })),
        ("lab: while (a) break lab;", |k| matches!(k, AstKind::Label { .. })),
        ("throw e;", |k| matches!(k, AstKind::Throw { .. })),
    ];
    for (case, check) in cases {
        let source = units(case);
        let ast = Parser::new(&source).parse_statement();
        assert!(check(&ast.kind), "{case}");
        assert_eq!(text(&ast, &source), case);
    }
}

#[test]
fn for_and_for_in_disambiguation() {
    let source = units("for (var i = 0; i < 3; i++) body;");
    let ast = Parser::new(&source).parse_statement();
    assert!(matches!(ast.kind, AstKind::For { .. }));

    let source = units("for (var k in o) body;");
    let ast = Parser::new(&source).parse_statement();
    assert!(matches!(ast.kind, AstKind::ForIn { .. }));

    let source = units("for (k in o) body;");
    let ast = Parser::new(&source).parse_statement();
    assert!(matches!(ast.kind, AstKind::ForIn { .. }));

    let source = units("for (;;) body;");
    let ast = Parser::new(&source).parse_statement();
    let AstKind::For { init, cond, step, .. } = &ast.kind else {
        panic!("expected for");
    };
    assert!(init.is_empty() && cond.is_none() && step.is_none());
}

#[test]
fn switch_clause_split() {
    let source = units("switch (x) { case 1: a; case 2: b; default: c; case 3: d; }");
    let ast = Parser::new(&source).parse_statement();
    let AstKind::Switch {
        before_default,
        default_clause,
        after_default,
        ..
    } = &ast.kind
    else {
        panic!("expected switch");
    };
    assert_eq!(before_default.len(), 2);
    assert!(default_clause.is_some());
    assert_eq!(after_default.len(), 1);

    // only one default clause is allowed
    let source = units("switch (x) { default: a; default: b; }");
    assert!(Parser::new(&source).parse_statement().is_illegal());
}

#[test]
fn try_statements() {
    let source = units("try { a; } catch (e) { b; }");
    let ast = Parser::new(&source).parse_statement();
    let AstKind::Try { catch, finally, .. } = &ast.kind else {
        panic!("expected try");
    };
    assert!(catch.is_some() && finally.is_none());

    let source = units("try { a; } finally { c; }");
    let ast = Parser::new(&source).parse_statement();
    let AstKind::Try { catch, finally, .. } = &ast.kind else {
        panic!("expected try");
    };
    assert!(catch.is_none() && finally.is_some());

    // catch or finally is required
    let source = units("try { a; } b;");
    assert!(Parser::new(&source).parse_statement().is_illegal());
}

#[test]
fn strict_directive_prologue() {
    let source = units("'use strict';\na = 1");
    let ast = Parser::new(&source).parse_program();
    let AstKind::Program(body) = &ast.kind else {
        panic!("expected program");
    };
    assert!(body.strict);

    let source = units("'use sloppy';\na = 1");
    let ast = Parser::new(&source).parse_program();
    let AstKind::Program(body) = &ast.kind else {
        panic!("expected program");
    };
    assert!(!body.strict);

    // nested function bodies carry their own directive
    let source = units("function f() { 'use strict'; return 1 }");
    let mut parser = Parser::new(&source);
    let ast = parser.parse_program();
    let AstKind::Program(body) = &ast.kind else {
        panic!("expected program");
    };
    let def = &parser.functions()[body.func_decls[0].index()];
    let AstKind::FuncBody(func_body) = &def.body.kind else {
        panic!("expected function body");
    };
    assert!(func_body.strict);
}

#[test]
fn function_declarations_are_hoisted_separately() {
    let source = units("a = 1; function f() {} b = 2;");
    let mut parser = Parser::new(&source);
    let ast = parser.parse_program();
    let AstKind::Program(body) = &ast.kind else {
        panic!("expected program");
    };
    assert_eq!(body.func_decls.len(), 1);
    assert_eq!(body.statements.len(), 2);
    // a declaration must be named
    let source = units("function () {}");
    assert!(Parser::new(&source).parse_program().is_illegal());
}

#[test]
fn asi_splits_statements() {
    let source = units("a = 1\nb = 2");
    let ast = Parser::new(&source).parse_program();
    let AstKind::Program(body) = &ast.kind else {
        panic!("expected program");
    };
    assert_eq!(body.statements.len(), 2);

    // no line terminator, no semicolon: illegal
    let source = units("a = 1 b = 2");
    assert!(Parser::new(&source).parse_program().is_illegal());
}

/// Reparsing a node's source reproduces a node of the same shape.
#[test]
fn source_slices_reparse() {
    for case in ["a + b * c", "x ? y : z", "new a.b(c)[d]", "{a: [1, 2, ]}"] {
        let source = units(case);
        let mut parser = Parser::new(&source);
        let first = parser.parse_expression(false);
        assert!(!first.is_illegal(), "{case}");
        let reparse_source = units(&first.text(&source));
        let mut reparser = Parser::new(&reparse_source);
        let second = reparser.parse_expression(false);
        assert_eq!(
            std::mem::discriminant(&first.kind),
            std::mem::discriminant(&second.kind),
            "{case}"
        );
    }
}

#[test]
fn nesting_depth_is_bounded() {
    let deep = "(".repeat(usize::from(MAX_NESTING_DEPTH) + 50) + "a";
    let source = units(&deep);
    let ast = Parser::new(&source).parse_expression(false);
    assert!(ast.is_illegal());
}
