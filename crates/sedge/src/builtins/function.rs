//! The Function constructor and Function.prototype.

use std::rc::Rc;

use crate::{
    ast::AstKind,
    environment::GLOBAL_ENV,
    error::{EvalResult, JsError},
    interp::Interp,
    object::Callable,
    parse::{ParsedProgram, Parser},
    value::{JsString, JsValue},
};

/// Function.prototype is itself callable and returns undefined.
pub(super) fn function_proto_self(_interp: &mut Interp, _this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::Undefined)
}

/// 15.3.2.1: `Function(p1, ..., pn, body)` compiles a function from strings
/// at runtime. The resulting function closes over the global environment
/// only.
pub(super) fn constructor(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let mut params: Vec<String> = Vec::new();
    let mut body = String::new();
    if let Some((last, rest)) = args.split_last() {
        body = interp.to_string(last)?.to_string();
        for arg in rest {
            params.push(interp.to_string(arg)?.to_string());
        }
    }

    let source = format!("function ({}) {{ {} }}", params.join(","), body);
    let units: Vec<u16> = source.encode_utf16().collect();
    let mut parser = Parser::new(&units);
    let func_ast = parser.parse_function_expression();
    if func_ast.is_illegal() {
        return Err(JsError::syntax_error("invalid function source"));
    }
    let AstKind::Func(func_id) = &func_ast.kind else {
        return Err(JsError::syntax_error("invalid function source"));
    };
    let func_id = *func_id;
    let functions = parser.into_functions();
    let program = Rc::new(ParsedProgram {
        units,
        program: func_ast,
        functions,
    });

    let object = interp.create_function_object(&program, func_id, GLOBAL_ENV, false)?;
    Ok(JsValue::Object(object))
}

fn this_function(interp: &Interp, this: &JsValue) -> EvalResult<crate::heap::HeapId> {
    if let JsValue::Object(id) = this {
        if interp.heap.get(*id).is_callable() {
            return Ok(*id);
        }
    }
    Err(JsError::type_error("Function.prototype method called on a non-function"))
}

/// 15.3.4.4 Function.prototype.call.
pub(super) fn proto_call(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let func = this_function(interp, this)?;
    let call_this = args.first().cloned().unwrap_or(JsValue::Undefined);
    let rest = args.get(1..).unwrap_or(&[]);
    interp.call(func, call_this, rest)
}

/// 15.3.4.3 Function.prototype.apply.
pub(super) fn proto_apply(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let func = this_function(interp, this)?;
    let call_this = args.first().cloned().unwrap_or(JsValue::Undefined);
    let arg_list: Vec<JsValue> = match args.get(1) {
        None | Some(JsValue::Undefined | JsValue::Null) => Vec::new(),
        Some(JsValue::Object(array)) => {
            let length_value = interp.object_get(*array, &JsString::from_str("length"))?;
            let length = interp.to_uint32(&length_value)?;
            let mut list = Vec::with_capacity(length as usize);
            for index in 0..length {
                list.push(interp.object_get(*array, &JsString::from_str(&index.to_string()))?);
            }
            list
        }
        Some(_) => return Err(JsError::type_error("second argument to apply must be an array")),
    };
    interp.call(func, call_this, &arg_list)
}

/// 15.3.4.2 Function.prototype.toString: the source text for script
/// functions, a placeholder for native ones.
pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    let func = this_function(interp, this)?;
    let rendered = match interp.heap.get(func).callable.as_ref() {
        Some(Callable::Script(script)) => {
            let def = script.program.func(script.func);
            def.range.text(&script.program.units)
        }
        Some(Callable::Native(native)) => format!("function {}() {{ [native code] }}", native.name),
        None => unreachable!("this_function checked callability"),
    };
    Ok(JsValue::String(JsString::from_str(&rendered)))
}
