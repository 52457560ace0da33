//! Literal coercion of raw metric values.
//!
//! Archiver metric values arrive as JSON strings more often than as JSON
//! numbers, and some of them are locale-formatted (`"160,732"`). Coercion
//! is total: anything that fails to parse degrades to the `Str` variant
//! rather than erroring outward.

use archstats_core::TypedValue;
use serde_json::Value;

/// Coerce a raw textual value into a typed value.
///
/// Attempts a literal parse first. On failure, if the text contains `,`
/// the commas are stripped and the parse retried exactly once — this is
/// how thousands-separated numbers like `160,732` come back as the
/// integer `160732`. Anything still unparseable is kept as a string.
pub fn coerce(raw: &str) -> TypedValue {
    if let Some(v) = literal(raw) {
        return v;
    }
    if raw.contains(',') {
        if let Some(v) = literal(&raw.replace(',', "")) {
            return v;
        }
    }
    TypedValue::Str(raw.to_string())
}

/// Coerce a JSON value, preserving native JSON types.
///
/// Numbers map directly (integer preferred over float), booleans map
/// directly, and strings run through [`coerce`]. Nulls become the empty
/// string and composites keep their JSON text so that a surprising
/// upstream shape never aborts a poll.
pub fn coerce_value(value: &Value) -> TypedValue {
    match value {
        Value::Bool(b) => TypedValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => TypedValue::Int(i),
            None => TypedValue::Float(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => coerce(s),
        Value::Null => TypedValue::Str(String::new()),
        other => TypedValue::Str(other.to_string()),
    }
}

/// Single-shot literal parse: capitalized booleans, plain decimal
/// integers, floats, or quoted strings. `true`/`false` are not boolean
/// literals and stay strings.
fn literal(raw: &str) -> Option<TypedValue> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }

    match t {
        "True" => return Some(TypedValue::Bool(true)),
        "False" => return Some(TypedValue::Bool(false)),
        _ => {}
    }

    if !has_leading_zero(t) {
        if let Ok(i) = t.parse::<i64>() {
            return Some(TypedValue::Int(i));
        }
    }

    if looks_float(t) {
        if let Ok(f) = t.parse::<f64>() {
            return Some(TypedValue::Float(f));
        }
    }

    // Quoted string literals, e.g. "'MTS'"
    let bytes = t.as_bytes();
    if t.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[t.len() - 1] == bytes[0]
    {
        return Some(TypedValue::Str(t[1..t.len() - 1].to_string()));
    }

    None
}

/// A decimal integer literal does not start with `0` unless it is `0`
/// itself, so `042` is not an integer.
fn has_leading_zero(t: &str) -> bool {
    let digits = t.strip_prefix(['+', '-']).unwrap_or(t);
    digits.len() > 1 && digits.starts_with('0')
}

/// Restrict float parsing to digit-shaped text carrying a fractional or
/// exponent marker, so that words such as `inf` or `NaN` stay strings
/// and plain digit runs stay on the integer path.
fn looks_float(t: &str) -> bool {
    t.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && t.chars().any(|c| c.is_ascii_digit())
        && t.contains(['.', 'e', 'E'])
}
