//! The Error constructors (plus every native error) and Error.prototype.

use crate::{
    error::{ErrorKind, EvalResult, JsError},
    interp::Interp,
    value::{JsString, JsValue},
};

/// 15.11.1 / 15.11.2: calling an Error constructor behaves like
/// constructing it.
fn construct_error(interp: &mut Interp, kind: ErrorKind, args: &[JsValue]) -> EvalResult<JsValue> {
    let message = match args.first() {
        None | Some(JsValue::Undefined) => String::new(),
        Some(value) => interp.to_string(value)?.to_string(),
    };
    let id = interp.create_error_object(kind, &message)?;
    Ok(JsValue::Object(id))
}

pub(super) fn error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::Error, args)
}

pub(super) fn eval_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::EvalError, args)
}

pub(super) fn range_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::RangeError, args)
}

pub(super) fn reference_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::ReferenceError, args)
}

pub(super) fn syntax_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::SyntaxError, args)
}

pub(super) fn type_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::TypeError, args)
}

pub(super) fn uri_error(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    construct_error(interp, ErrorKind::UriError, args)
}

/// 15.11.4.4 Error.prototype.toString.
pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let JsValue::Object(id) = this else {
        return Err(JsError::type_error("Error.prototype.toString called on a non-object"));
    };
    let name_value = interp.object_get(*id, &JsString::from_str("name"))?;
    let name = match name_value {
        JsValue::Undefined => JsString::from_str("Error"),
        other => interp.to_string(&other)?,
    };
    let message_value = interp.object_get(*id, &JsString::from_str("message"))?;
    let message = match message_value {
        JsValue::Undefined => JsString::empty(),
        other => interp.to_string(&other)?,
    };
    if message.is_empty() {
        Ok(JsValue::String(name))
    } else {
        Ok(JsValue::String(name.concat(&JsString::from_str(": ")).concat(&message)))
    }
}

/// The shared poison accessor installed for `caller`/`callee` on strict
/// arguments objects.
pub(super) fn restricted_access(_interp: &mut Interp, _this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Err(JsError::type_error(
        "'caller' and 'callee' may not be accessed in strict mode",
    ))
}
