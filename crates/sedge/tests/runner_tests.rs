//! Runner-level behavior: host values, snapshots, limits and tracing.

use pretty_assertions::assert_eq;
use sedge::{ErrorKind, Object, RecordingTracer, ResourceLimits, Runner, Tracer};

#[test]
fn run_produces_host_values() {
    assert_eq!(Runner::new("1 + 1").unwrap().run().unwrap(), Object::Number(2.0));
    assert_eq!(
        Runner::new("'a' + 'b'").unwrap().run().unwrap(),
        Object::String("ab".to_owned())
    );
    assert_eq!(Runner::new("1 === 2").unwrap().run().unwrap(), Object::Bool(false));
    assert_eq!(Runner::new("null").unwrap().run().unwrap(), Object::Null);
    assert_eq!(Runner::new(";").unwrap().run().unwrap(), Object::Undefined);
}

#[test]
fn objects_convert_shallowly() {
    let result = Runner::new("({a: 1, b: 'x'})").unwrap().run().unwrap();
    assert_eq!(
        result,
        Object::Object(vec![
            ("a".to_owned(), Object::Number(1.0)),
            ("b".to_owned(), Object::String("x".to_owned())),
        ])
    );
}

#[test]
fn functions_convert_to_their_name() {
    assert_eq!(
        Runner::new("function watch() {}; watch").unwrap().run().unwrap(),
        Object::Function("watch".to_owned())
    );
}

#[test]
fn parse_errors_are_syntax_exceptions() {
    let err = Runner::new("var = 1").expect_err("expected parse error");
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    // the Display form carries the kind
    assert!(err.to_string().starts_with("SyntaxError"));
}

#[test]
fn thrown_errors_carry_kind_and_message() {
    let err = Runner::new("throw new RangeError('too big')")
        .unwrap()
        .run()
        .expect_err("expected throw");
    assert_eq!(err.kind(), ErrorKind::RangeError);
    assert_eq!(err.message(), Some("too big"));
}

#[test]
fn dump_and_load_round_trip() {
    let runner = Runner::new("var a = 6; a * 7").unwrap();
    let bytes = runner.dump().unwrap();
    let restored = Runner::load(&bytes).unwrap();
    assert_eq!(restored.run().unwrap(), Object::Number(42.0));
    assert_eq!(restored.source(), runner.source());
}

#[test]
fn each_run_is_independent() {
    let runner = Runner::new("a = (typeof a == 'undefined') ? 1 : a + 1; a").unwrap();
    assert_eq!(runner.run().unwrap(), Object::Number(1.0));
    // no state leaks between runs
    assert_eq!(runner.run().unwrap(), Object::Number(1.0));
}

#[test]
fn recursion_limit_is_configurable() {
    let limits = ResourceLimits {
        max_recursion_depth: Some(16),
        max_heap_objects: None,
    };
    let err = Runner::new("function f(n){ return n == 0 ? 0 : f(n - 1) }; f(1000)")
        .unwrap()
        .run_with(limits, Box::new(sedge::NoopTracer))
        .expect_err("expected recursion failure");
    assert_eq!(err.kind(), ErrorKind::RangeError);

    // shallow recursion fits
    let ok = Runner::new("function f(n){ return n == 0 ? 0 : f(n - 1) }; f(5)")
        .unwrap()
        .run_with(limits, Box::new(sedge::NoopTracer))
        .unwrap();
    assert_eq!(ok, Object::Number(0.0));
}

#[test]
fn heap_limit_bounds_program_allocations() {
    let limits = ResourceLimits {
        max_recursion_depth: None,
        max_heap_objects: Some(8),
    };
    let err = Runner::new("var a = []; for (var i = 0; i < 100; i++) { a[i] = {} }")
        .unwrap()
        .run_with(limits, Box::new(sedge::NoopTracer))
        .expect_err("expected heap limit failure");
    assert_eq!(err.kind(), ErrorKind::RangeError);
}

/// The recording tracer observes statements and calls.
#[test]
fn tracer_sees_statements_and_calls() {
    struct Probe {
        inner: std::rc::Rc<std::cell::RefCell<RecordingTracer>>,
    }
    impl Tracer for Probe {
        fn on_statement(&mut self, range: sedge::CodeRange) {
            self.inner.borrow_mut().on_statement(range);
        }
        fn on_call(&mut self, name: &str) {
            self.inner.borrow_mut().on_call(name);
        }
    }

    let recording = std::rc::Rc::new(std::cell::RefCell::new(RecordingTracer::default()));
    let probe = Probe {
        inner: recording.clone(),
    };
    Runner::new("function f(){ return 1 }; f(); f()")
        .unwrap()
        .run_with(ResourceLimits::default(), Box::new(probe))
        .unwrap();

    let recording = recording.borrow();
    assert!(recording.statements.len() >= 3);
    assert_eq!(recording.calls, vec!["f", "f"]);
}
