//! The Array constructor and Array.prototype.
//!
//! Arrays are ordinary objects with the `"Array"` class tag; the live
//! `length` maintenance lives in the interpreter's `[[Put]]`.

use crate::{
    error::{EvalResult, JsError},
    interp::Interp,
    object::JsObject,
    value::{JsString, JsValue},
};

/// 15.4.1 / 15.4.2: `Array(...)` and `new Array(...)` coincide. A single
/// numeric argument is a length, anything else is an element list.
pub(super) fn constructor(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let mut object = JsObject::new("Array", Some(interp.realm.array_proto));

    if args.len() == 1 {
        if let JsValue::Number(n) = &args[0] {
            let length = interp.to_uint32(&args[0])?;
            if f64::from(length) != *n {
                return Err(JsError::range_error("invalid array length"));
            }
            object.set_data_property(JsString::from_str("length"), JsValue::Number(f64::from(length)), true, false, false);
            let id = interp.heap.allocate(object)?;
            return Ok(JsValue::Object(id));
        }
    }

    object.set_data_property(
        JsString::from_str("length"),
        JsValue::Number(args.len() as f64),
        true,
        false,
        false,
    );
    for (index, value) in args.iter().enumerate() {
        object.set_data_property(JsString::from_str(&index.to_string()), value.clone(), true, true, true);
    }
    let id = interp.heap.allocate(object)?;
    Ok(JsValue::Object(id))
}

fn this_array_length(interp: &mut Interp, this: &JsValue) -> EvalResult<(crate::heap::HeapId, u32)> {
    let id = interp.to_object(this)?;
    let length_value = interp.object_get(id, &JsString::from_str("length"))?;
    let length = interp.to_uint32(&length_value)?;
    Ok((id, length))
}

/// 15.4.4.5 join.
pub(super) fn proto_join(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let (id, length) = this_array_length(interp, this)?;
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => JsString::from_str(","),
        Some(value) => interp.to_string(value)?,
    };
    let mut out = JsString::empty();
    for index in 0..length {
        if index > 0 {
            out = out.concat(&separator);
        }
        let element = interp.object_get(id, &JsString::from_str(&index.to_string()))?;
        if !matches!(element, JsValue::Undefined | JsValue::Null) {
            let rendered = interp.to_string(&element)?;
            out = out.concat(&rendered);
        }
    }
    Ok(JsValue::String(out))
}

/// 15.4.4.7 push.
pub(super) fn proto_push(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let (id, mut length) = this_array_length(interp, this)?;
    for value in args {
        interp.object_put(id, &JsString::from_str(&length.to_string()), value.clone(), true)?;
        length += 1;
    }
    let new_length = JsValue::Number(f64::from(length));
    interp.object_put(id, &JsString::from_str("length"), new_length.clone(), true)?;
    Ok(new_length)
}
