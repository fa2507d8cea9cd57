//! Attribute encoding between item payloads and the storage backend's native
//! record representation.
//!
//! Records are maps of attribute names to typed attribute values. Numbers
//! travel as strings to avoid backend-specific float narrowing; decoding
//! restores integers where the textual form is integral, so values and
//! meaning survive a round trip even when integral floats cross the
//! int/float representation boundary.

use std::collections::BTreeMap;

use crate::types::Payload;

/// A record as the storage backend sees it.
pub type AttrMap = BTreeMap<String, AttrValue>;

/// A single attribute value in the backend's native encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// String.
    S(String),
    /// Number, kept in textual form.
    N(String),
    /// Boolean.
    Bool(bool),
    /// Explicit null.
    Null,
    /// List of attribute values.
    L(Vec<AttrValue>),
    /// Nested attribute map.
    M(AttrMap),
}

impl AttrValue {
    /// Returns the string content when this is an `S` value.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttrValue::S(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Encodes a dynamic payload value into an attribute value.
pub fn encode_value(value: &serde_json::Value) -> AttrValue {
    match value {
        serde_json::Value::Null => AttrValue::Null,
        serde_json::Value::Bool(b) => AttrValue::Bool(*b),
        serde_json::Value::Number(n) => AttrValue::N(n.to_string()),
        serde_json::Value::String(s) => AttrValue::S(s.clone()),
        serde_json::Value::Array(values) => AttrValue::L(values.iter().map(encode_value).collect()),
        serde_json::Value::Object(map) => AttrValue::M(
            map.iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect(),
        ),
    }
}

/// Decodes an attribute value back into a dynamic payload value.
///
/// Numeric attributes decode to an integer when the textual form parses as
/// one, otherwise to a float; a number that parses as neither is preserved
/// as its textual form rather than dropped.
pub fn decode_value(value: &AttrValue) -> serde_json::Value {
    match value {
        AttrValue::S(s) => serde_json::Value::String(s.clone()),
        AttrValue::N(n) => {
            if let Ok(int) = n.parse::<i64>() {
                serde_json::Value::Number(int.into())
            } else if let Some(number) = n
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                serde_json::Value::Number(number)
            } else {
                serde_json::Value::String(n.clone())
            }
        }
        AttrValue::Bool(b) => serde_json::Value::Bool(*b),
        AttrValue::Null => serde_json::Value::Null,
        AttrValue::L(values) => serde_json::Value::Array(values.iter().map(decode_value).collect()),
        AttrValue::M(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect(),
        ),
    }
}

/// Encodes a payload into a backend record.
pub fn encode_payload(payload: &Payload) -> AttrMap {
    payload
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decodes a backend record into a payload.
pub fn decode_payload(record: &AttrMap) -> Payload {
    record
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_from_json(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn scalar_values_survive_round_trip() {
        let payload = payload_from_json(serde_json::json!({
            "title": "launch day",
            "count": 42,
            "score": 0.5,
            "trusted": true,
        }));

        let decoded = decode_payload(&encode_payload(&payload));
        assert_eq!(decoded, payload);
    }

    #[test]
    fn integral_float_keeps_its_value() {
        let payload = payload_from_json(serde_json::json!({ "time_published": 1704067200.0 }));

        let decoded = decode_payload(&encode_payload(&payload));
        let value = decoded.get("time_published").unwrap();
        // The representation may cross the int/float boundary; the value must
        // not change.
        assert_eq!(value.as_f64().unwrap(), 1704067200.0);
    }

    #[test]
    fn nested_values_survive_round_trip() {
        let payload = payload_from_json(serde_json::json!({
            "source_keywords": ["politics", "economy"],
            "meta": { "depth": 2, "flags": [true, false] },
            "missing": null,
        }));

        let decoded = decode_payload(&encode_payload(&payload));
        assert_eq!(decoded, payload);
    }

    #[test]
    fn unparseable_number_falls_back_to_text() {
        let value = decode_value(&AttrValue::N("not-a-number".to_owned()));
        assert_eq!(value, serde_json::Value::String("not-a-number".to_owned()));
    }
}
