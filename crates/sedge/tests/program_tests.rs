//! End-to-end program evaluation: parse, enter global code, evaluate, and
//! collapse the completion value through GetValue.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use sedge::{CompletionKind, ErrorKind, Interp, JsValue, ParsedProgram, Runner};

fn eval(source: &str) -> JsValue {
    let program = Rc::new(ParsedProgram::parse(source));
    assert!(!program.is_illegal(), "parse failed: {source}");
    let mut interp = Interp::new();
    interp.enter_global_code(&program).expect("enter global code");
    let completion = interp.eval_program(&program).expect("evaluation failed");
    assert_eq!(completion.kind, CompletionKind::Normal, "abrupt completion for: {source}");
    let value = completion.value.expect("program produced no value");
    interp.get_value(value).expect("GetValue failed")
}

fn eval_number(source: &str) -> f64 {
    match eval(source) {
        JsValue::Number(n) => n,
        other => panic!("expected number for {source:?}, got {other:?}"),
    }
}

fn eval_string(source: &str) -> String {
    match eval(source) {
        JsValue::String(s) => s.to_string(),
        other => panic!("expected string for {source:?}, got {other:?}"),
    }
}

fn eval_bool(source: &str) -> bool {
    match eval(source) {
        JsValue::Bool(b) => b,
        other => panic!("expected boolean for {source:?}, got {other:?}"),
    }
}

fn run_error(source: &str) -> ErrorKind {
    Runner::new(source)
        .expect("parse failed")
        .run()
        .expect_err("expected a runtime error")
        .kind()
}

// ---- assignment and references ----

#[test]
fn simple_assignment() {
    assert_eq!(eval_number("a = 1;a"), 1.0);
    assert_eq!(eval_number("a = 1;a=2;a"), 2.0);
}

#[test]
fn compound_assignment() {
    assert_eq!(eval_number("a = 1; a+=1; a"), 2.0);
    assert_eq!(eval_number("a = 12; a %= 5; a"), 2.0);
    assert_eq!(eval_number("a = 1; a <<= 4; a"), 16.0);
}

#[test]
fn var_statements() {
    assert_eq!(eval_number("var a = 147; a"), 147.0);
    assert_eq!(eval_number("var a = 1, b = 2; a + b"), 3.0);
}

// ---- functions and closures ----

#[test]
fn function_expression_call() {
    assert_eq!(eval_number("a = function(b){return b;}; a(3)"), 3.0);
}

#[test]
fn function_declaration_call() {
    assert_eq!(eval_number("function a(b){return b;}; a(3)"), 3.0);
}

#[test]
fn closure_reads_global() {
    assert_eq!(eval_number("a = 1; function b(){return a;}; b()"), 1.0);
}

#[test]
fn returned_function_is_callable() {
    assert_eq!(eval_number("function c(){return function(){return 10};}; c()()"), 10.0);
}

#[test]
fn closure_captures_local() {
    assert_eq!(
        eval_number("function mk(n){ return function(){ return n } }; var f = mk(42); f()"),
        42.0
    );
}

#[test]
fn named_function_expression_recurses() {
    assert_eq!(
        eval_number("var f = function fact(n){ return n < 2 ? 1 : n * fact(n - 1) }; f(5)"),
        120.0
    );
}

#[test]
fn function_constructor_compiles_source() {
    assert_eq!(eval_number("a = Function('return 5'); a()"), 5.0);
    assert_eq!(eval_number("a = Function('x', 'y', 'return x + y'); a(2, 3)"), 5.0);
}

#[test]
fn hoisted_var_is_undefined_before_assignment() {
    assert_eq!(
        eval_string("function f(){ var r = typeof x; var x = 1; return r }; f()"),
        "undefined"
    );
}

#[test]
fn arguments_object() {
    assert_eq!(eval_number("function f(){ return arguments.length }; f(1, 2, 3)"), 3.0);
    assert_eq!(eval_number("function f(a){ arguments[0] = 7; return a }; f(1)"), 7.0);
    assert_eq!(eval_number("function f(a){ a = 9; return arguments[0] }; f(1)"), 9.0);
}

#[test]
fn call_and_apply() {
    assert_eq!(
        eval_number("function f(a, b){ return this.x + a + b }; f.call({x: 1}, 2, 3)"),
        6.0
    );
    assert_eq!(
        eval_number("function f(a, b){ return this.x + a + b }; f.apply({x: 1}, [2, 3])"),
        6.0
    );
}

// ---- objects and properties ----

#[test]
fn object_literal_access() {
    assert_eq!(eval_number("a = {a: 1}; a.a"), 1.0);
    assert_eq!(eval_number("a = {a: {0: 10}}; a.a[0]"), 10.0);
}

#[test]
fn property_assignment() {
    assert_eq!(eval_number("a = {a: 136}; a.a = 5; a.a"), 5.0);
}

#[test]
fn accessor_properties() {
    assert_eq!(
        eval_number("a = {get b() {return this.c}, set b(x) {this.c = x}}; a.b = 5; a.b"),
        5.0
    );
}

#[test]
fn duplicate_keys_last_wins() {
    assert_eq!(eval_number("a = {x: 1, x: 2}; a.x"), 2.0);
}

#[test]
fn has_own_property_and_in() {
    assert!(eval_bool("var o = {a: 1}; o.hasOwnProperty('a')"));
    assert!(!eval_bool("var o = {a: 1}; o.hasOwnProperty('b')"));
    assert!(eval_bool("var o = {a: 1}; 'a' in o"));
}

#[test]
fn delete_removes_properties() {
    assert!(eval_bool("var o = {a: 1}; delete o.a"));
    assert_eq!(eval_string("var o = {a: 1}; delete o.a; typeof o.a"), "undefined");
}

#[test]
fn prototype_chain_lookup() {
    assert_eq!(
        eval_number("function F(){}; F.prototype.x = 3; var o = new F(); o.x"),
        3.0
    );
}

#[test]
fn instanceof_walks_prototypes() {
    assert!(eval_bool("function F(){}; var x = new F(); x instanceof F"));
    assert!(eval_bool("function F(){}; var x = new F(); x instanceof Object"));
    assert!(!eval_bool("function F(){}; function G(){}; new F() instanceof G"));
}

// ---- construction ----

#[test]
fn double_construct_uses_returned_function() {
    let source = "a = new new function() {\n  this.a = 12345;\n  return function () {this.b=23456}\n}\na.b\n";
    assert_eq!(eval_number(source), 23456.0);
}

#[test]
fn construct_returns_object_result() {
    assert_eq!(
        eval_number("function F(){ this.a = 1; return {a: 2} }; new F().a"),
        2.0
    );
    assert_eq!(
        eval_number("function F(){ this.a = 1; return 99 }; new F().a"),
        1.0
    );
}

// ---- control flow ----

#[test]
fn if_else() {
    let source = "a = 1\nif (false)\n  a = 4\nelse {a = 2}\na";
    assert_eq!(eval_number(source), 2.0);
}

#[test]
fn while_loop() {
    let source = "'use strict';\nvar a = 1, n = 5\nwhile (a < n) {\n a *= 2\n}\na";
    assert_eq!(eval_number(source), 8.0);
}

#[test]
fn while_with_break() {
    let source = "'use strict';\nvar a = 1, n = 5\nwhile (a < n) {\n if (a % 2 == 0) break\n a *= 2\n}\na";
    assert_eq!(eval_number(source), 2.0);
}

#[test]
fn while_with_continue() {
    let source = "'use strict';\nvar a = 0, n = 4, sum = 0\nwhile (a < n) {\n a += 1\n if (a == 2) continue\n sum += a\n}\nsum";
    assert_eq!(eval_number(source), 8.0);
}

#[test]
fn do_while_loops() {
    let source = "'use strict';\nvar a = 10, n = 5\ndo {\n a *= 2\n} while (a < n)\na";
    assert_eq!(eval_number(source), 20.0);

    let source = "'use strict';\nvar a = 1, n = 5\ndo {\n if (a % 2 == 0) break\n a *= 2\n} while (a < n);\na";
    assert_eq!(eval_number(source), 2.0);

    let source = "'use strict';\nvar a = 0, n = 4, sum = 0\ndo { a += 1\n if (a == 2) continue\n sum += a\n} while (a < n)\nsum";
    assert_eq!(eval_number(source), 8.0);
}

#[test]
fn for_loop() {
    assert_eq!(eval_number("var s = 0; for (var i = 1; i <= 4; i++) { s += i } s"), 10.0);
}

#[test]
fn for_in_enumerates_in_insertion_order() {
    assert_eq!(eval_string("var o = {b: 1, a: 2}, s = ''; for (var k in o) s += k; s"), "ba");
}

#[test]
fn for_in_skips_shadowed_and_deleted() {
    // the own property shadows the inherited one
    assert_eq!(
        eval_string(
            "function F(){ this.x = 1 }; F.prototype.x = 2; F.prototype.y = 3;\nvar s = ''; for (var k in new F()) s += k; s"
        ),
        "xy"
    );
    assert_eq!(
        eval_string("var o = {a: 1, b: 2, c: 3}, s = ''; for (var k in o) { delete o.c; s += k } s"),
        "ab"
    );
}

#[test]
fn labelled_continue_and_break() {
    let source = "var s = ''; outer: for (var i = 0; i < 3; i++) { for (var j = 0; j < 3; j++) { if (j == 1) continue outer; s += '' + i + j } } s";
    assert_eq!(eval_string(source), "001020");

    let source = "var n = 0; outer: while (true) { while (true) { n += 1; break outer } } n";
    assert_eq!(eval_number(source), 1.0);
}

#[test]
fn switch_falls_through() {
    let source = "var r = 0; switch (2) { case 1: r = 1; case 2: r = 2; case 3: r += 10; break; default: r = 99 } r";
    assert_eq!(eval_number(source), 12.0);
}

#[test]
fn switch_default_then_following_clauses() {
    let source = "var r = ''; switch (9) { case 1: r += 'a'; default: r += 'd'; case 2: r += 'b' } r";
    assert_eq!(eval_string(source), "db");
}

#[test]
fn with_scopes_the_object() {
    assert_eq!(eval_number("var o = {x: 5}; var r; with (o) { r = x } r"), 5.0);
    assert_eq!(
        eval_number("var o = {f: function(){ return this.x }, x: 7}; var r; with (o) { r = f() } r"),
        7.0
    );
}

// ---- exceptions ----

#[test]
fn throw_and_catch_value() {
    assert_eq!(eval_number("var r; try { throw 42 } catch (e) { r = e } r"), 42.0);
}

#[test]
fn catch_engine_type_error() {
    assert!(eval_bool("var r; try { null.x } catch (e) { r = e instanceof TypeError } r"));
}

#[test]
fn finally_overrides_completion() {
    assert_eq!(
        eval_number("function f(){ try { return 1 } finally { return 2 } }; f()"),
        2.0
    );
}

#[test]
fn finally_runs_after_catch() {
    assert_eq!(
        eval_string("var s = ''; try { throw 'x' } catch (e) { s += 'c' } finally { s += 'f' } s"),
        "cf"
    );
}

#[test]
fn uncaught_throw_surfaces_with_kind() {
    assert_eq!(run_error("throw new TypeError('nope')"), ErrorKind::TypeError);
    assert_eq!(run_error("throw 42"), ErrorKind::Error);
    assert_eq!(run_error("undefinedName()"), ErrorKind::ReferenceError);
    assert_eq!(run_error("null.x"), ErrorKind::TypeError);
    assert_eq!(run_error("var o = {}; o()"), ErrorKind::TypeError);
}

#[test]
fn error_objects_format() {
    assert_eq!(eval_string("var e = new TypeError('bad'); e.name"), "TypeError");
    assert_eq!(eval_string("var e = new TypeError('bad'); e.message"), "bad");
    assert_eq!(eval_string("'' + new TypeError('bad')"), "TypeError: bad");
}

// ---- strict mode ----

#[test]
fn strict_implicit_global_is_reference_error() {
    assert_eq!(run_error("'use strict';\na = 1"), ErrorKind::ReferenceError);
}

#[test]
fn strict_declared_var_assignment_is_fine() {
    assert_eq!(eval_number("'use strict';\na = 235\nvar a; a"), 235.0);
}

#[test]
fn strict_arguments_assignment_is_syntax_error() {
    assert_eq!(
        run_error("'use strict'; (function(){ arguments = 1 })()"),
        ErrorKind::SyntaxError
    );
}

#[test]
fn strict_arguments_callee_is_poisoned() {
    assert!(eval_bool(
        "'use strict'; var r; try { (function(){ return arguments.callee })() } catch (e) { r = e instanceof TypeError } r"
    ));
}

#[test]
fn nested_function_directive() {
    // the inner body is strict even though the program is not
    assert_eq!(
        run_error("function f() { 'use strict'; zzz = 1 }; f()"),
        ErrorKind::ReferenceError
    );
}

// ---- operators and conversions ----

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(eval_number("1 + 2 * 3"), 7.0);
    assert_eq!(eval_number("(1 + 2) * 3"), 9.0);
    assert_eq!(eval_number("7 % 4"), 3.0);
    assert_eq!(eval_number("2 - -3"), 5.0);
}

#[test]
fn string_concatenation() {
    assert_eq!(eval_string("'a' + 'b'"), "ab");
    assert_eq!(eval_string("1 + '2'"), "12");
    assert_eq!(eval_string("'' + 1.5"), "1.5");
    assert_eq!(eval_string("({}) + ''"), "[object Object]");
}

#[test]
fn bitwise_and_shifts() {
    assert_eq!(eval_number("5 & 3"), 1.0);
    assert_eq!(eval_number("5 | 3"), 7.0);
    assert_eq!(eval_number("5 ^ 3"), 6.0);
    assert_eq!(eval_number("~0"), -1.0);
    assert_eq!(eval_number("1 << 4"), 16.0);
    assert_eq!(eval_number("-8 >> 1"), -4.0);
    assert_eq!(eval_number("-1 >>> 28"), 15.0);
}

#[test]
fn equality_operators() {
    assert!(eval_bool("1 == '1'"));
    assert!(eval_bool("null == undefined"));
    assert!(!eval_bool("null == 0"));
    assert!(!eval_bool("1 === '1'"));
    assert!(eval_bool("0 === -0"));
    assert!(!eval_bool("0/0 === 0/0"));
}

#[test]
fn relational_operators() {
    assert!(eval_bool("1 < 2"));
    assert!(eval_bool("'a' < 'b'"));
    assert!(eval_bool("'10' < '9'"));
    assert!(!eval_bool("10 < 9"));
    assert!(eval_bool("2 >= 2"));
}

#[test]
fn logical_short_circuit() {
    assert_eq!(
        eval_number("var c = 0; function f(){ c = 1; return true }; false && f(); c"),
        0.0
    );
    assert_eq!(eval_number("var a = 0 || 5; a"), 5.0);
    assert_eq!(eval_number("var a = 3 && 4; a"), 4.0);
}

#[test]
fn increment_and_decrement() {
    assert_eq!(eval_number("var i = 5; i++ + ++i"), 12.0);
    assert_eq!(eval_number("var i = 5; i--; --i; i"), 3.0);
}

#[test]
fn conditional_and_comma() {
    assert_eq!(eval_number("true ? 1 : 2"), 1.0);
    assert_eq!(eval_number("a = (1, 2); a"), 2.0);
}

#[test]
fn typeof_operator() {
    assert_eq!(eval_string("typeof 1"), "number");
    assert_eq!(eval_string("typeof 'x'"), "string");
    assert_eq!(eval_string("typeof true"), "boolean");
    assert_eq!(eval_string("typeof {}"), "object");
    assert_eq!(eval_string("typeof null"), "object");
    assert_eq!(eval_string("typeof function(){}"), "function");
    // tolerates unresolvable names
    assert_eq!(eval_string("typeof neverDeclared"), "undefined");
}

#[test]
fn void_operator() {
    assert_eq!(eval_string("typeof void 0"), "undefined");
}

// ---- built-ins ----

#[test]
fn string_methods() {
    assert_eq!(eval_string("'abc'.charAt(1)"), "b");
    assert_eq!(eval_string("'abc'.charAt(9)"), "");
    assert_eq!(eval_number("'abc'.charCodeAt(0)"), 97.0);
    assert_eq!(eval_string("'ab'.concat('cd', 'e')"), "abcde");
    assert_eq!(eval_number("'hello'.indexOf('ll')"), 2.0);
    assert_eq!(eval_number("'hello'.indexOf('z')"), -1.0);
    assert_eq!(eval_string("'hello'.substring(1, 3)"), "el");
    assert_eq!(eval_string("'hello'.substring(3, 1)"), "el");
    assert_eq!(eval_string("'AbC'.toLowerCase()"), "abc");
    assert_eq!(eval_string("'AbC'.toUpperCase()"), "ABC");
    assert_eq!(eval_number("'abc'.length"), 3.0);
    assert_eq!(eval_string("'abc'[1]"), "b");
}

#[test]
fn string_wrapper_objects() {
    assert_eq!(eval_number("var s = new String('hi'); s.length"), 2.0);
    assert_eq!(eval_string("var s = new String('hi'); s.valueOf()"), "hi");
    assert_eq!(eval_string("String(12)"), "12");
}

#[test]
fn number_methods() {
    assert_eq!(eval_string("(255).toString(16)"), "ff");
    assert_eq!(eval_string("(1.5).toString()"), "1.5");
    assert_eq!(eval_number("Number('0x10')"), 16.0);
    assert!(eval_bool("Number('abc') != Number('abc')"));
    assert_eq!(run_error("(1).toString(99)"), ErrorKind::RangeError);
}

#[test]
fn boolean_conversion() {
    assert!(eval_bool("Boolean(1)"));
    assert!(!eval_bool("Boolean('')"));
    assert_eq!(eval_string("true.toString()"), "true");
}

#[test]
fn array_literals_and_methods() {
    assert_eq!(eval_number("[1, 2, 3].length"), 3.0);
    assert_eq!(eval_number("[,,].length"), 2.0);
    assert_eq!(eval_string("[1, 2, 3].join('-')"), "1-2-3");
    assert_eq!(eval_number("var a = []; a.push(7, 8); a.length"), 2.0);
    assert_eq!(eval_number("var a = [1]; a[5] = 9; a.length"), 6.0);
    assert_eq!(eval_number("new Array(4).length"), 4.0);
}

#[test]
fn object_builtin() {
    assert_eq!(eval_string("({}).toString()"), "[object Object]");
    assert_eq!(eval_number("Object({a: 3}).a"), 3.0);
}

#[test]
fn regex_literals_parse_to_stubs() {
    assert_eq!(eval_string("/ab+c/gi.source"), "ab+c");
    assert!(eval_bool("/x/g.global"));
    assert!(!eval_bool("/x/.ignoreCase"));
}

#[test]
fn global_number_properties() {
    assert!(eval_bool("Infinity > 1e308"));
    assert!(eval_bool("NaN != NaN"));
    assert_eq!(eval_string("typeof undefined"), "undefined");
}

// ---- resource limits ----

#[test]
fn runaway_recursion_is_a_range_error() {
    assert_eq!(run_error("function f(){ return f() }; f()"), ErrorKind::RangeError);
}
