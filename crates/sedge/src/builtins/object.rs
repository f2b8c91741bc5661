//! The Object constructor and Object.prototype.

use crate::{
    error::EvalResult,
    interp::Interp,
    object::JsObject,
    value::{JsString, JsValue},
};

/// 15.2.1 / 15.2.2: `Object(value)` and `new Object(value)` coincide;
/// undefined and null produce a fresh object, everything else converts.
pub(super) fn constructor(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    match args.first() {
        None | Some(JsValue::Undefined | JsValue::Null) => {
            let id = interp
                .heap
                .allocate(JsObject::new("Object", Some(interp.realm.object_proto)))?;
            Ok(JsValue::Object(id))
        }
        Some(value) => {
            let id = interp.to_object(value)?;
            Ok(JsValue::Object(id))
        }
    }
}

/// 15.2.4.2 Object.prototype.toString.
pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let id = interp.to_object(this)?;
    let class = interp.heap.get(id).class;
    Ok(JsValue::String(JsString::from_str(&format!("[object {class}]"))))
}

/// 15.2.4.4 Object.prototype.valueOf.
pub(super) fn proto_value_of(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let id = interp.to_object(this)?;
    Ok(JsValue::Object(id))
}

/// 15.2.4.5 Object.prototype.hasOwnProperty.
pub(super) fn proto_has_own_property(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let name = interp.to_string(args.first().unwrap_or(&JsValue::Undefined))?;
    let id = interp.to_object(this)?;
    Ok(JsValue::Bool(interp.heap.get(id).get_own_property(&name).is_some()))
}
