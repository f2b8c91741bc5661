//! SameValue and strict-equality laws.

use sedge::{same_value, strict_equals, JsString, JsValue};

#[test]
fn same_value_numbers() {
    let pairs = [(0.0, 0.0), (f64::NAN, f64::NAN), (1.23, 1.23)];
    for (a, b) in pairs {
        assert!(same_value(&JsValue::Number(a), &JsValue::Number(b)), "{a} {b}");
    }
    assert!(!same_value(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
}

#[test]
fn same_value_is_reflexive_and_symmetric() {
    let values = [
        JsValue::Undefined,
        JsValue::Null,
        JsValue::Bool(true),
        JsValue::Number(2.5),
        JsValue::Number(f64::NAN),
        JsValue::String(JsString::from_str("x")),
    ];
    for a in &values {
        assert!(same_value(a, a), "{a:?} should equal itself");
        for b in &values {
            assert_eq!(same_value(a, b), same_value(b, a), "{a:?} {b:?}");
        }
    }
}

#[test]
fn same_value_distinguishes_types() {
    assert!(!same_value(&JsValue::Number(0.0), &JsValue::String(JsString::from_str("0"))));
    assert!(!same_value(&JsValue::Undefined, &JsValue::Null));
    assert!(!same_value(&JsValue::Bool(false), &JsValue::Number(0.0)));
}

#[test]
fn strict_equality_never_coerces() {
    assert!(!strict_equals(&JsValue::Number(1.0), &JsValue::String(JsString::from_str("1"))));
    assert!(!strict_equals(&JsValue::Bool(true), &JsValue::Number(1.0)));
}

#[test]
fn strict_equality_on_numbers() {
    // reflexive except for NaN
    assert!(!strict_equals(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
    // the zeroes collapse
    assert!(strict_equals(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
}
