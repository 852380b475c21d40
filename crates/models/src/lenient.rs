//! Decoders for persisted fields that older writers may have left out, set
//! to `null`, or stored as a non-string scalar. A document is always read in
//! full; an odd field never turns the whole read into an empty catalog.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// `null` stays `None`; numbers and booleans keep their JSON spelling.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar(Value::deserialize(deserializer)?))
}

/// Like [`opt_string`] with `null` read as `""`.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// `null` is an empty list, a lone string a one-element list.
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar).collect(),
        other => scalar(other).into_iter().collect(),
    })
}

/// Numbers as-is, text through [`parse_float`], anything else NaN.
pub fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_float(&s),
        _ => f64::NAN,
    })
}

/// Reads the longest leading decimal number of `text` the way browsers'
/// `parseFloat` does: `"12.5abc"` is 12.5, `""` and `"abc"` are NaN.
/// Non-finite results are NaN since they persist as `null` either way.
pub fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut has_digits = int_end > end;
    end = int_end;
    if end < b.len() && b[end] == b'.' {
        let frac_end = digits_from(end + 1);
        if has_digits || frac_end > end + 1 {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return f64::NAN;
    }
    if end < b.len() && matches!(b[end], b'e' | b'E') {
        let mut i = end + 1;
        if i < b.len() && matches!(b[i], b'+' | b'-') {
            i += 1;
        }
        let exp_end = digits_from(i);
        if exp_end > i {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}
