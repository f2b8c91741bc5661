//! The Number constructor and Number.prototype.

use crate::{
    convert::number_to_string,
    error::{EvalResult, JsError},
    interp::Interp,
    object::JsObject,
    value::{JsString, JsValue},
};

/// 15.7.1 `Number(value)`: conversion.
pub(super) fn call(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    match args.first() {
        None => Ok(JsValue::Number(0.0)),
        Some(value) => Ok(JsValue::Number(interp.to_number(value)?)),
    }
}

/// 15.7.2 `new Number(value)`: a wrapper object.
pub(super) fn construct(interp: &mut Interp, _this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let primitive = match args.first() {
        None => 0.0,
        Some(value) => interp.to_number(value)?,
    };
    let mut object = JsObject::new("Number", Some(interp.realm.number_proto));
    object.primitive_value = Some(JsValue::Number(primitive));
    let id = interp.heap.allocate(object)?;
    Ok(JsValue::Object(id))
}

fn this_number_value(interp: &Interp, this: &JsValue) -> EvalResult<f64> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(id) => {
            let object = interp.heap.get(*id);
            if object.class == "Number" {
                if let Some(JsValue::Number(n)) = &object.primitive_value {
                    return Ok(*n);
                }
            }
            Err(JsError::type_error("Number.prototype method called on a non-number"))
        }
        _ => Err(JsError::type_error("Number.prototype method called on a non-number")),
    }
}

/// 15.7.4.2 toString with an optional radix.
pub(super) fn proto_to_string(interp: &mut Interp, this: &JsValue, args: &[JsValue]) -> EvalResult<JsValue> {
    let value = this_number_value(interp, this)?;
    let radix = match args.first() {
        None | Some(JsValue::Undefined) => 10,
        Some(arg) => {
            let r = interp.to_integer(arg)?;
            if !(2.0..=36.0).contains(&r) {
                return Err(JsError::range_error("toString() radix must be between 2 and 36"));
            }
            r as u32
        }
    };
    if radix == 10 {
        return Ok(JsValue::String(JsString::from_str(&number_to_string(value))));
    }
    Ok(JsValue::String(JsString::from_str(&radix_string(value, radix))))
}

pub(super) fn proto_value_of(interp: &mut Interp, this: &JsValue, _args: &[JsValue]) -> EvalResult<JsValue> {
    Ok(JsValue::Number(this_number_value(interp, this)?))
}

/// Non-decimal rendering: exact for integers, fixed-precision for the
/// fractional part.
fn radix_string(value: f64, radix: u32) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let negative = value < 0.0;
    let mut int_part = value.abs().trunc();
    let mut frac_part = value.abs().fract();

    let digit = |d: u32| char::from_digit(d, radix).expect("digit below radix");
    let mut integer_digits = Vec::new();
    if int_part == 0.0 {
        integer_digits.push('0');
    }
    while int_part >= 1.0 {
        let rem = (int_part % f64::from(radix)) as u32;
        integer_digits.push(digit(rem));
        int_part = (int_part / f64::from(radix)).trunc();
    }
    integer_digits.reverse();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(integer_digits);
    if frac_part > 0.0 {
        out.push('.');
        for _ in 0..20 {
            frac_part *= f64::from(radix);
            let d = frac_part.trunc() as u32;
            out.push(digit(d.min(radix - 1)));
            frac_part -= frac_part.trunc();
            if frac_part == 0.0 {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::radix_string;

    #[test]
    fn radix_rendering() {
        assert_eq!(radix_string(255.0, 16), "ff");
        assert_eq!(radix_string(-8.0, 2), "-1000");
        assert_eq!(radix_string(0.5, 2), "0.1");
    }
}
