//! Key templates: primary keys are produced by substituting payload fields
//! into a format string.
//!
//! Given a payload `{"name": "car", "desc": "..."}` and the template
//! `"{name}-primary-key"`, the rendered key is `"car-primary-key"`.
//! Placeholders without a matching payload field are left untouched.

use crate::types::Payload;

/// Renders a key template against a payload.
pub fn render_key(template: &str, payload: &Payload) -> String {
    let mut key = template.to_owned();
    for (field, value) in payload {
        let placeholder = format!("{{{field}}}");
        if !key.contains(&placeholder) {
            continue;
        }
        key = key.replace(&placeholder, &value_text(value));
    }
    key
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        let mut payload = Payload::new();
        payload.insert("url".to_owned(), "https://example.com/a".into());
        payload.insert("time_published".to_owned(), 1704067200.into());
        payload
    }

    #[test]
    fn substitutes_string_and_numeric_fields() {
        assert_eq!(
            render_key("{url}", &payload()),
            "https://example.com/a"
        );
        assert_eq!(
            render_key("{url}#{time_published}", &payload()),
            "https://example.com/a#1704067200"
        );
    }

    #[test]
    fn leaves_unmatched_placeholders_untouched() {
        assert_eq!(render_key("{missing}-key", &payload()), "{missing}-key");
    }
}
