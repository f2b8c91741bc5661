//! The String constructor and String.prototype.

use crate::{
    error::{EvalResult, JsError},
    interp::Interp,
    value::{JsString, JsValue},
};

/// 15.5.1 `String(value)`: conversion.
pub(super) fn call(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    match args.first() {
        None => Ok(JsValue::String(JsString::empty())),
        Some(value) => Ok(JsValue::String(interp.to_string(value)?)),
    }
}

/// 15.5.2 `new String(value)`: a wrapper object.
pub(super) fn construct(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let primitive = match args.first() {
        None => JsString::empty(),
        Some(value) => interp.to_string(value)?,
    };
    let id = interp.create_string_object(primitive)?;
    Ok(JsValue::Object(id))
}

/// `this` for toString/valueOf must be a string primitive or wrapper.
fn this_string_value(interp: &Interp, this: &JsValue) -> EvalResult<JsString> {
    match this {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Object(id) => {
            let object = interp.heap.get(*id);
            if object.class == "String" {
                if let Some(JsValue::String(s)) = &object.primitive_value {
                    return Ok(s.clone());
                }
            }
            Err(JsError::type_error("String.prototype method called on a non-string"))
        }
        _ => Err(JsError::type_error("String.prototype method called on a non-string")),
    }
}

/// Generic methods accept any coercible `this`.
fn coerced_this(interp: &mut Interp, this: &JsValue) -> EvalResult<JsString> {
    interp.check_object_coercible(this)?;
    interp.to_string(this)
}

pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::String(this_string_value(interp, this)?))
}

pub(super) fn proto_value_of(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::String(this_string_value(interp, this)?))
}

/// 15.5.4.4 charAt.
pub(super) fn proto_char_at(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let position = interp.to_integer(args.first().unwrap_or(&JsValue::Undefined))?;
    if position < 0.0 || position >= s.len() as f64 {
        return Ok(JsValue::String(JsString::empty()));
    }
    let unit = s.units()[position as usize];
    Ok(JsValue::String(JsString::from_units(vec![unit])))
}

/// 15.5.4.5 charCodeAt.
pub(super) fn proto_char_code_at(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let position = interp.to_integer(args.first().unwrap_or(&JsValue::Undefined))?;
    if position < 0.0 || position >= s.len() as f64 {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(f64::from(s.units()[position as usize])))
}

/// 15.5.4.6 concat.
pub(super) fn proto_concat(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let mut result = coerced_this(interp, this)?;
    for arg in args {
        let next = interp.to_string(arg)?;
        result = result.concat(&next);
    }
    Ok(JsValue::String(result))
}

/// 15.5.4.7 indexOf.
pub(super) fn proto_index_of(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let search = interp.to_string(args.first().unwrap_or(&JsValue::Undefined))?;
    let position = match args.get(1) {
        None | Some(JsValue::Undefined) => 0.0,
        Some(value) => interp.to_integer(value)?,
    };
    let start = position.clamp(0.0, s.len() as f64) as usize;
    let haystack = s.units();
    let needle = search.units();
    if needle.is_empty() {
        return Ok(JsValue::Number(start.min(haystack.len()) as f64));
    }
    let found = (start..=haystack.len().saturating_sub(needle.len()))
        .find(|&i| haystack[i..].starts_with(needle));
    Ok(JsValue::Number(found.map_or(-1.0, |i| i as f64)))
}

/// 15.5.4.15 substring.
pub(super) fn proto_substring(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let len = s.len() as f64;
    let start = interp.to_integer(args.first().unwrap_or(&JsValue::Undefined))?;
    let end = match args.get(1) {
        None | Some(JsValue::Undefined) => len,
        Some(value) => interp.to_integer(value)?,
    };
    let start = start.clamp(0.0, len) as usize;
    let end = end.clamp(0.0, len) as usize;
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(JsValue::String(JsString::from_units(s.units()[from..to].to_vec())))
}

/// 15.5.4.16 toLowerCase (Unicode default case conversion).
pub(super) fn proto_to_lower_case(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let lowered = s.to_string().to_lowercase();
    Ok(JsValue::String(JsString::from_str(&lowered)))
}

/// 15.5.4.18 toUpperCase.
pub(super) fn proto_to_upper_case(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let s = coerced_this(interp, this)?;
    let raised = s.to_string().to_uppercase();
    Ok(JsValue::String(JsString::from_str(&raised)))
}
