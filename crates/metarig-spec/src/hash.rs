//! Canonical hashing of generated rigs.
//!
//! A rig hash is `hex(BLAKE3(canonical_json(value)))`, where the canonical
//! form sorts object keys and writes no whitespace. Two generations from the
//! same metarig must produce the same hash.

use serde::Serialize;
use serde_json::Value;

use crate::error::SpecResult;

/// Computes the canonical BLAKE3 hash of any serialisable value.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
///
/// # Example
/// ```
/// use metarig_spec::hash::canonical_hash;
///
/// let a = canonical_hash(&serde_json::json!({"b": 1, "a": 2})).unwrap();
/// let b = canonical_hash(&serde_json::json!({"a": 2, "b": 1})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> SpecResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(blake3::hash(canonicalize_json(&value).as_bytes())
        .to_hex()
        .to_string())
}

/// Serialises a JSON value with sorted keys and no whitespace.
pub fn canonicalize_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => format_string(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonicalize_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let pairs: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", format_string(k), canonicalize_json(v)))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => {
            if f == 0.0 {
                // -0.0 and 0.0 hash alike
                "0".to_string()
            } else if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", f as i64)
            } else {
                format!("{}", f)
            }
        }
        _ => "null".to_string(),
    }
}

fn format_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\x20' => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_form_sorts_keys() {
        let value = json!({"tail": [0.0, 1.5], "head": [0, -0.0], "name": "a\"b"});
        assert_eq!(
            canonicalize_json(&value),
            r#"{"head":[0,0],"name":"a\"b","tail":[0,1.5]}"#
        );
    }

    #[test]
    fn test_hash_differs_on_content() {
        let a = canonical_hash(&json!({"bones": ["ORG-a"]})).unwrap();
        let b = canonical_hash(&json!({"bones": ["ORG-b"]})).unwrap();
        assert_ne!(a, b);
    }
}
