//! The Boolean constructor and Boolean.prototype.

use crate::{
    convert::to_boolean,
    error::{EvalResult, JsError},
    interp::Interp,
    object::JsObject,
    value::{JsString, JsValue},
};

/// 15.6.1 `Boolean(value)`: conversion.
pub(super) fn call(_interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::Bool(to_boolean(args.first().unwrap_or(&JsValue::Undefined))))
}

/// 15.6.2 `new Boolean(value)`: a wrapper object.
pub(super) fn construct(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let primitive = to_boolean(args.first().unwrap_or(&JsValue::Undefined));
    let mut object = JsObject::new("Boolean", Some(interp.realm.boolean_proto));
    object.primitive_value = Some(JsValue::Bool(primitive));
    let id = interp.heap.allocate(object)?;
    Ok(JsValue::Object(id))
}

fn this_boolean_value(interp: &Interp, this: &JsValue) -> EvalResult<bool> {
    match this {
        JsValue::Bool(b) => Ok(*b),
        JsValue::Object(id) => {
            let object = interp.heap.get(*id);
            if object.class == "Boolean" {
                if let Some(JsValue::Bool(b)) = &object.primitive_value {
                    return Ok(*b);
                }
            }
            Err(JsError::type_error("Boolean.prototype method called on a non-boolean"))
        }
        _ => Err(JsError::type_error("Boolean.prototype method called on a non-boolean")),
    }
}

pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let value = this_boolean_value(interp, this)?;
    Ok(JsValue::String(JsString::from_str(if value { "true" } else { "false" })))
}

pub(super) fn proto_value_of(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::Bool(this_boolean_value(interp, this)?))
}
