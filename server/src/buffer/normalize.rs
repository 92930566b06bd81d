//! Payload Normalization
//!
//! Pulls the sender id, message text and payload shape out of an inbound
//! event without ever failing. Unknown structures yield an absent key.

use serde_json::{Number, Value};

use super::types::Shape;

/// Field carrying the sender identifier.
const KEY_FIELD: &str = "waId";

/// Field carrying the message text.
const TEXT_FIELD: &str = "text";

/// Field holding the event body inside a wrapped payload element.
const BODY_FIELD: &str = "body";

/// Result of normalizing one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Sender identifier, `None` when missing or unusable.
    pub key: Option<String>,
    /// Trimmed message text, empty when missing.
    pub text: String,
    /// Structural format of the payload.
    pub shape: Shape,
}

impl Normalized {
    const fn empty() -> Self {
        Self {
            key: None,
            text: String::new(),
            shape: Shape::Flat,
        }
    }
}

/// Extract `{key, text, shape}` from an arbitrary payload.
pub fn normalize(payload: &Value) -> Normalized {
    match payload {
        Value::Array(items) => match items.first().and_then(|first| first.get(BODY_FIELD)) {
            Some(body @ Value::Object(_)) => Normalized {
                key: extract_key(body),
                text: extract_text(body),
                shape: Shape::Wrapped,
            },
            _ => Normalized::empty(),
        },
        Value::Object(_) => Normalized {
            key: extract_key(payload),
            text: extract_text(payload),
            shape: Shape::Flat,
        },
        _ => Normalized::empty(),
    }
}

/// Sender ids arrive as strings, occasionally as bare numbers.
/// Empty strings and zero count as absent.
fn extract_key(source: &Value) -> Option<String> {
    match source.get(KEY_FIELD)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => number_key(n),
        _ => None,
    }
}

/// Integral numbers render without a fraction, so `1e3` and `1000` share a key.
fn number_key(n: &Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return (i != 0).then(|| i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    let f = n.as_f64()?;
    if f == 0.0 || !f.is_finite() {
        None
    } else if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
        Some(format!("{}", f as i64))
    } else {
        Some(n.to_string())
    }
}

fn extract_text(source: &Value) -> String {
    source
        .get(TEXT_FIELD)
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_payload() {
        let payload = json!([{ "body": { "waId": "5511", "text": "  hello  " }, "id": 7 }]);
        let n = normalize(&payload);
        assert_eq!(n.key.as_deref(), Some("5511"));
        assert_eq!(n.text, "hello");
        assert_eq!(n.shape, Shape::Wrapped);
    }

    #[test]
    fn flat_payload() {
        let payload = json!({ "waId": "A", "text": "hi\n", "senderName": "Ana" });
        let n = normalize(&payload);
        assert_eq!(n.key.as_deref(), Some("A"));
        assert_eq!(n.text, "hi");
        assert_eq!(n.shape, Shape::Flat);
    }

    #[test]
    fn numeric_wa_id_is_accepted() {
        let n = normalize(&json!({ "waId": 5511999, "text": "x" }));
        assert_eq!(n.key.as_deref(), Some("5511999"));
    }

    #[test]
    fn zero_wa_id_is_absent() {
        assert_eq!(normalize(&json!({ "waId": 0, "text": "x" })).key, None);
        assert_eq!(normalize(&json!({ "waId": 0.0 })).key, None);
        assert_eq!(normalize(&json!([{ "body": { "waId": -0.0 } }])).key, None);
    }

    #[test]
    fn integral_float_wa_id_matches_integer_key() {
        let from_float: Value = serde_json::from_str(r#"{"waId":1e3}"#).unwrap();
        assert_eq!(normalize(&from_float).key.as_deref(), Some("1000"));
        assert_eq!(normalize(&json!({ "waId": 1000 })).key.as_deref(), Some("1000"));
        assert_eq!(normalize(&json!({ "waId": 12.5 })).key.as_deref(), Some("12.5"));
    }

    #[test]
    fn missing_or_unusable_fields_are_absent() {
        let n = normalize(&json!({ "text": "orphan" }));
        assert_eq!(n.key, None);
        assert_eq!(n.text, "orphan");

        let n = normalize(&json!({ "waId": "", "text": 42 }));
        assert_eq!(n.key, None);
        assert_eq!(n.text, "");

        let n = normalize(&json!({ "waId": null }));
        assert_eq!(n.key, None);

        let n = normalize(&json!([{ "body": { "text": "no id" } }]));
        assert_eq!(n.key, None);
        assert_eq!(n.shape, Shape::Wrapped);
    }

    #[test]
    fn unsupported_shapes_default_to_flat() {
        for payload in [
            Value::Null,
            json!("text"),
            json!(12),
            json!([]),
            json!([{ "waId": "A" }]),
            json!([{ "body": "not an object" }]),
        ] {
            assert_eq!(normalize(&payload), Normalized::empty(), "{payload}");
        }
    }
}
