//! Abstract conversions (ECMA-262 3rd ed. §9) and the lazy literal decoders.
//!
//! Number and string literals are decoded here from the source slices the
//! lexer preserved, not at scan time. Number-to-string goes through `ryu`
//! for the shortest round-trip digits, then reassembles them with the
//! 9.8.1 formatting rules (integer form below 1e21, fixed form down to
//! 1e-6, exponent form beyond).

use crate::{
    character,
    error::{EvalResult, JsError},
    heap::HeapId,
    interp::Interp,
    object::JsObject,
    value::{strict_equals, JsString, JsValue},
};

/// Hint for [`Interp::to_primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Number,
    String,
}

/// 9.2 ToBoolean. Pure over the value, no heap access needed.
pub fn to_boolean(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Bool(b) => *b,
        JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

impl Interp {
    /// 9.1 ToPrimitive.
    pub(crate) fn to_primitive(&mut self, value: &JsValue, hint: Option<PreferredType>) -> EvalResult<JsValue> {
        match value {
            JsValue::Object(id) => self.default_value(*id, hint),
            primitive => Ok(primitive.clone()),
        }
    }

    /// 8.12.8 `[[DefaultValue]]`: try `valueOf`/`toString` (order per hint)
    /// and take the first primitive result.
    fn default_value(&mut self, id: HeapId, hint: Option<PreferredType>) -> EvalResult<JsValue> {
        let order: [&str; 2] = match hint {
            Some(PreferredType::String) => ["toString", "valueOf"],
            // the default hint is Number
            _ => ["valueOf", "toString"],
        };
        for method_name in order {
            let method = self.object_get(id, &JsString::from_str(method_name))?;
            if let JsValue::Object(method_id) = method {
                if self.heap.get(method_id).is_callable() {
                    let result = self.call(method_id, JsValue::Object(id), &[])?;
                    if result.is_primitive() {
                        return Ok(result);
                    }
                }
            }
        }
        Err(JsError::type_error("cannot convert object to primitive value"))
    }

    /// 9.3 ToNumber.
    pub(crate) fn to_number(&mut self, value: &JsValue) -> EvalResult<f64> {
        match value {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s.units())),
            JsValue::Object(_) => {
                let primitive = self.to_primitive(value, Some(PreferredType::Number))?;
                self.to_number(&primitive)
            }
        }
    }

    /// 9.4 ToInteger.
    pub(crate) fn to_integer(&mut self, value: &JsValue) -> EvalResult<f64> {
        let number = self.to_number(value)?;
        if number.is_nan() {
            return Ok(0.0);
        }
        Ok(number.trunc())
    }

    /// 9.5 ToInt32.
    pub(crate) fn to_int32(&mut self, value: &JsValue) -> EvalResult<i32> {
        Ok(self.to_uint32(value)? as i32)
    }

    /// 9.6 ToUint32.
    pub(crate) fn to_uint32(&mut self, value: &JsValue) -> EvalResult<u32> {
        let number = self.to_number(value)?;
        Ok(double_to_uint32(number))
    }

    /// 9.7 ToUint16.
    pub(crate) fn to_uint16(&mut self, value: &JsValue) -> EvalResult<u16> {
        Ok(double_to_uint32(self.to_number(value)?) as u16)
    }

    /// 9.8 ToString.
    pub(crate) fn to_string(&mut self, value: &JsValue) -> EvalResult<JsString> {
        match value {
            JsValue::Undefined => Ok(JsString::from_str("undefined")),
            JsValue::Null => Ok(JsString::from_str("null")),
            JsValue::Bool(b) => Ok(JsString::from_str(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from_str(&number_to_string(*n))),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Object(_) => {
                let primitive = self.to_primitive(value, Some(PreferredType::String))?;
                self.to_string(&primitive)
            }
        }
    }

    /// 9.9 ToObject: box primitives, reject null and undefined.
    pub(crate) fn to_object(&mut self, value: &JsValue) -> EvalResult<HeapId> {
        match value {
            JsValue::Undefined | JsValue::Null => {
                Err(JsError::type_error("cannot convert undefined or null to object"))
            }
            JsValue::Bool(b) => {
                let mut object = JsObject::new("Boolean", Some(self.realm.boolean_proto));
                object.primitive_value = Some(JsValue::Bool(*b));
                self.heap.allocate(object)
            }
            JsValue::Number(n) => {
                let mut object = JsObject::new("Number", Some(self.realm.number_proto));
                object.primitive_value = Some(JsValue::Number(*n));
                self.heap.allocate(object)
            }
            JsValue::String(s) => self.create_string_object(s.clone()),
            JsValue::Object(id) => Ok(*id),
        }
    }

    /// String wrapper objects carry their primitive plus a `length`
    /// property; index properties are served lazily by `[[Get]]`.
    pub(crate) fn create_string_object(&mut self, value: JsString) -> EvalResult<HeapId> {
        let mut object = JsObject::new("String", Some(self.realm.string_proto));
        object.set_data_property(
            JsString::from_str("length"),
            JsValue::Number(value.len() as f64),
            false,
            false,
            false,
        );
        object.primitive_value = Some(JsValue::String(value));
        self.heap.allocate(object)
    }

    /// 9.10 CheckObjectCoercible.
    pub(crate) fn check_object_coercible(&self, value: &JsValue) -> EvalResult<()> {
        match value {
            JsValue::Undefined | JsValue::Null => {
                Err(JsError::type_error("cannot read properties of undefined or null"))
            }
            _ => Ok(()),
        }
    }

    /// 11.9.3 abstract equality.
    pub(crate) fn abstract_equals(&mut self, x: &JsValue, y: &JsValue) -> EvalResult<bool> {
        match (x, y) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => Ok(true),
            (JsValue::Number(_), JsValue::Number(_))
            | (JsValue::String(_), JsValue::String(_))
            | (JsValue::Bool(_), JsValue::Bool(_))
            | (JsValue::Object(_), JsValue::Object(_)) => Ok(strict_equals(x, y)),
            (JsValue::Number(_), JsValue::String(_)) => {
                let converted = self.to_number(y)?;
                self.abstract_equals(x, &JsValue::Number(converted))
            }
            (JsValue::String(_), JsValue::Number(_)) => {
                let converted = self.to_number(x)?;
                self.abstract_equals(&JsValue::Number(converted), y)
            }
            (JsValue::Bool(_), _) => {
                let converted = self.to_number(x)?;
                self.abstract_equals(&JsValue::Number(converted), y)
            }
            (_, JsValue::Bool(_)) => {
                let converted = self.to_number(y)?;
                self.abstract_equals(x, &JsValue::Number(converted))
            }
            (JsValue::Number(_) | JsValue::String(_), JsValue::Object(_)) => {
                let converted = self.to_primitive(y, None)?;
                self.abstract_equals(x, &converted)
            }
            (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_)) => {
                let converted = self.to_primitive(x, None)?;
                self.abstract_equals(&converted, y)
            }
            _ => Ok(false),
        }
    }

    /// 11.8.5 abstract relational comparison. `None` stands for the
    /// algorithm's "undefined" result (a NaN operand).
    pub(crate) fn abstract_relational(&mut self, x: &JsValue, y: &JsValue, left_first: bool) -> EvalResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Some(PreferredType::Number))?;
            let py = self.to_primitive(y, Some(PreferredType::Number))?;
            (px, py)
        } else {
            let py = self.to_primitive(y, Some(PreferredType::Number))?;
            let px = self.to_primitive(x, Some(PreferredType::Number))?;
            (px, py)
        };
        if let (JsValue::String(a), JsValue::String(b)) = (&px, &py) {
            // code-unit-wise comparison
            return Ok(Some(a.units() < b.units()));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }
}

/// 9.5/9.6 shared modular conversion of a double.
fn double_to_uint32(number: f64) -> u32 {
    if number.is_nan() || number.is_infinite() || number == 0.0 {
        return 0;
    }
    let number = number.trunc();
    // modulo 2^32 with the sign folded in
    let modulus = 4_294_967_296.0;
    let remainder = number % modulus;
    let remainder = if remainder < 0.0 { remainder + modulus } else { remainder };
    remainder as u32
}

/// 9.3.1 ToNumber applied to a string: the numeric-literal grammar plus
/// optional surrounding whitespace. Whitespace-only input is +0, anything
/// unparseable is NaN.
pub fn string_to_number(units: &[u16]) -> f64 {
    let is_space = |c: u16| character::is_whitespace(c) || character::is_line_terminator(c);
    let mut start = 0;
    let mut end = units.len();
    while start < end && is_space(units[start]) {
        start += 1;
    }
    while end > start && is_space(units[end - 1]) {
        end -= 1;
    }
    let trimmed = &units[start..end];
    if trimmed.is_empty() {
        return 0.0;
    }

    let text = String::from_utf16_lossy(trimmed);
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(&text)),
    };
    if body == "Infinity" {
        return sign * f64::INFINITY;
    }
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        // hex literals may not carry a sign
        if sign < 0.0 || text.starts_with('+') || hex.is_empty() {
            return f64::NAN;
        }
        let mut value = 0.0f64;
        for c in hex.chars() {
            let Some(digit) = c.to_digit(16) else {
                return f64::NAN;
            };
            value = value * 16.0 + f64::from(digit);
        }
        return value;
    }
    if !is_decimal_literal(body) {
        return f64::NAN;
    }
    body.parse::<f64>().map_or(f64::NAN, |v| sign * v)
}

/// Full-match check against `Digits [. Digits?] | . Digits`, with an
/// optional exponent. Keeps `parse::<f64>` from accepting Rust-isms like
/// `inf` or `NaN` that the language grammar rejects.
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut int_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        int_digits += 1;
    }
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            frac_digits += 1;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let mut exp_digits = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            exp_digits += 1;
        }
        if exp_digits == 0 {
            return false;
        }
    }
    i == bytes.len()
}

/// Decodes a numeric literal from its source slice (the lexer already
/// validated the shape).
pub fn decode_number_literal(units: &[u16]) -> f64 {
    let text = String::from_utf16_lossy(units);
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        let mut value = 0.0f64;
        for c in hex.chars() {
            value = value * 16.0 + f64::from(c.to_digit(16).unwrap_or(0));
        }
        return value;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// Decodes a string literal (including its quotes) from its source slice,
/// applying escape sequences and line continuations.
pub fn decode_string_literal(units: &[u16]) -> JsString {
    debug_assert!(units.len() >= 2);
    let body = &units[1..units.len() - 1];
    let mut out: Vec<u16> = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        if c != u16::from(b'\\') {
            out.push(c);
            i += 1;
            continue;
        }
        i += 1;
        if i >= body.len() {
            break;
        }
        let escape = body[i];
        match escape {
            b if b == u16::from(b'b') => {
                out.push(0x0008);
                i += 1;
            }
            t if t == u16::from(b't') => {
                out.push(0x0009);
                i += 1;
            }
            n if n == u16::from(b'n') => {
                out.push(0x000A);
                i += 1;
            }
            v if v == u16::from(b'v') => {
                out.push(0x000B);
                i += 1;
            }
            f if f == u16::from(b'f') => {
                out.push(0x000C);
                i += 1;
            }
            r if r == u16::from(b'r') => {
                out.push(0x000D);
                i += 1;
            }
            x if x == u16::from(b'x') => {
                i += 1;
                let mut value: u16 = 0;
                for _ in 0..2 {
                    value = value * 16 + character::digit_value(body[i]) as u16;
                    i += 1;
                }
                out.push(value);
            }
            u if u == u16::from(b'u') => {
                i += 1;
                let mut value: u16 = 0;
                for _ in 0..4 {
                    value = value * 16 + character::digit_value(body[i]) as u16;
                    i += 1;
                }
                out.push(value);
            }
            term if character::is_line_terminator(term) => {
                // line continuation produces nothing; CRLF is one terminator
                i += 1;
                if term == 0x000D && i < body.len() && body[i] == 0x000A {
                    i += 1;
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    JsString::from_units(out)
}

/// 9.8.1 ToString applied to a number.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    if value < 0.0 {
        return format!("-{}", number_to_string(-value));
    }
    if value.is_infinite() {
        return "Infinity".to_owned();
    }

    // shortest round-trip digits from ryu, reassembled per 9.8.1
    let mut buffer = ryu::Buffer::new();
    let repr = buffer.format(value);
    let (digits, n) = decompose(repr);
    let k = digits.len() as i32;

    if k <= n && n <= 21 {
        // integer with trailing zeros
        let mut out = digits;
        out.extend(std::iter::repeat('0').take((n - k) as usize));
        out
    } else if 0 < n && n <= 21 {
        let mut out = String::with_capacity(digits.len() + 1);
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
        out
    } else if -6 < n && n <= 0 {
        let mut out = String::from("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
        out
    } else {
        let exponent = n - 1;
        let mantissa = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        format!("{}e{}{}", mantissa, if exponent >= 0 { "+" } else { "-" }, exponent.abs())
    }
}

/// Splits a ryu rendering into its significant digits and the position `n`
/// of the decimal point (value = 0.digits * 10^n).
fn decompose(repr: &str) -> (String, i32) {
    let (mantissa, exponent) = match repr.find(['e', 'E']) {
        Some(pos) => (&repr[..pos], repr[pos + 1..].parse::<i32>().unwrap_or(0)),
        None => (repr, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
        None => (mantissa, ""),
    };
    let mut digits: String = format!("{int_part}{frac_part}");
    let mut point = int_part.len() as i32 + exponent;

    // normalize: strip leading zeros (adjusting the point), then trailing
    let leading = digits.len() - digits.trim_start_matches('0').len();
    digits = digits[leading..].to_owned();
    point -= leading as i32;
    let trimmed = digits.trim_end_matches('0').len();
    digits.truncate(trimmed.max(1));
    if digits.is_empty() {
        digits.push('0');
    }
    (digits, point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(0.001), "0.001");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(123.456), "123.456");
    }

    #[test]
    fn string_parsing() {
        let parse = |s: &str| string_to_number(&s.encode_utf16().collect::<Vec<u16>>());
        assert_eq!(parse("  12  "), 12.0);
        assert_eq!(parse(""), 0.0);
        assert_eq!(parse("   "), 0.0);
        assert_eq!(parse("0x10"), 16.0);
        assert_eq!(parse("-3.5"), -3.5);
        assert_eq!(parse(".5e1"), 5.0);
        assert_eq!(parse("Infinity"), f64::INFINITY);
        assert!(parse("12abc").is_nan());
        assert!(parse("inf").is_nan());
        assert!(parse("+0x10").is_nan());
    }

    #[test]
    fn uint32_wrapping() {
        assert_eq!(double_to_uint32(-1.0), u32::MAX);
        assert_eq!(double_to_uint32(4_294_967_296.0), 0);
        assert_eq!(double_to_uint32(f64::NAN), 0);
    }

    #[test]
    fn string_literal_escapes() {
        let decode = |s: &str| decode_string_literal(&s.encode_utf16().collect::<Vec<u16>>()).to_string();
        assert_eq!(decode("'abc'"), "abc");
        assert_eq!(decode("'a\\nb'"), "a\nb");
        assert_eq!(decode("'\\x41'"), "A");
        assert_eq!(decode("'\\u0041'"), "A");
        assert_eq!(decode("'a\\\nb'"), "ab");
        assert_eq!(decode("'\\q'"), "q");
    }
}
