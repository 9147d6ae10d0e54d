//! Response normalization: success unwrap and error-envelope construction.
//!
//! Backends report errors in several shapes (`{error:{message}}`, `{msg}`,
//! `{message}`, or a bare value). The message is picked by trying an ordered
//! list of extractors; the first one that yields a non-empty string wins.

use serde_json::{Map, Value};
use weknora_core::ErrorEnvelope;

/// Pulls a human-readable message out of an error body.
pub type Extractor = fn(&Value) -> Option<String>;

/// Message priority for ordinary error responses.
pub const ERROR_MESSAGE_RULES: &[Extractor] =
    &[nested_error_message, msg_field, message_field, raw_body];

/// Message priority for a rejected login.
pub const LOGIN_MESSAGE_RULES: &[Extractor] = &[msg_field, message_field, raw_body];

fn non_empty(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// `{"error": {"message": "..."}}`
pub fn nested_error_message(body: &Value) -> Option<String> {
    body.get("error")?.get("message").and_then(non_empty)
}

/// `{"msg": "..."}`
pub fn msg_field(body: &Value) -> Option<String> {
    body.get("msg").and_then(non_empty)
}

/// `{"message": "..."}`
pub fn message_field(body: &Value) -> Option<String> {
    body.get("message").and_then(non_empty)
}

/// A non-object body used as the message itself.
pub fn raw_body(body: &Value) -> Option<String> {
    match body {
        Value::String(_) => non_empty(body),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// First message produced by `rules`, in order.
pub fn resolve_message(body: &Value, rules: &[Extractor]) -> Option<String> {
    rules.iter().find_map(|rule| rule(body))
}

/// Only 200 and 201 count as success; other 2xx codes are surfaced as errors.
pub fn is_success(status: u16) -> bool {
    status == 200 || status == 201
}

/// Decode a response body: JSON when possible, otherwise the text itself.
/// An empty body is `null`.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Envelope for a non-success status other than the guarded 401 case.
pub fn failure(status: u16, body: Value) -> ErrorEnvelope {
    let message = resolve_message(&body, ERROR_MESSAGE_RULES)
        .unwrap_or_else(|| format!("request failed with status {status}"));

    let fields = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    ErrorEnvelope::backend(status, message, fields)
}

/// Envelope for a request that never produced a response.
pub fn transport_failure(err: &reqwest::Error) -> ErrorEnvelope {
    if err.is_builder() {
        tracing::warn!(error = %err, "request could not be built");
        ErrorEnvelope::encode(format!("invalid request: {err}"))
    } else if err.is_timeout() {
        tracing::warn!(error = %err, "request timed out");
        ErrorEnvelope::timeout()
    } else {
        tracing::warn!(error = %err, "request failed without a response");
        ErrorEnvelope::connectivity()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weknora_core::ErrorKind;

    use super::*;

    #[test]
    fn nested_error_message_wins_over_msg() {
        let body = json!({ "error": { "message": "bad input" }, "msg": "ignored" });
        let envelope = failure(400, body);

        assert_eq!(envelope.status(), Some(400));
        assert_eq!(envelope.message(), "bad input");
        assert_eq!(envelope.kind(), ErrorKind::Backend);
        assert_eq!(envelope.field("msg"), Some(&json!("ignored")));
    }

    #[test]
    fn msg_wins_over_message() {
        let body = json!({ "msg": "from msg", "message": "from message" });
        assert_eq!(resolve_message(&body, ERROR_MESSAGE_RULES).as_deref(), Some("from msg"));
    }

    #[test]
    fn empty_fields_fall_through() {
        let body = json!({ "error": { "message": "" }, "msg": "", "message": "third" });
        assert_eq!(resolve_message(&body, ERROR_MESSAGE_RULES).as_deref(), Some("third"));
    }

    #[test]
    fn bare_string_body_is_the_message() {
        let envelope = failure(502, json!("Bad Gateway"));
        assert_eq!(envelope.message(), "Bad Gateway");
        assert!(envelope.fields().is_empty());
    }

    #[test]
    fn object_without_message_gets_fallback() {
        let envelope = failure(500, json!({ "code": 17 }));
        assert_eq!(envelope.message(), "request failed with status 500");
        assert_eq!(envelope.field("code"), Some(&json!(17)));
    }

    #[test]
    fn login_rules_ignore_nested_error() {
        let body = json!({ "error": { "message": "nested" } });
        assert_eq!(resolve_message(&body, LOGIN_MESSAGE_RULES), None);
    }

    #[test]
    fn parse_body_handles_json_text_and_empty() {
        assert_eq!(parse_body(br#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(parse_body(b"plain failure"), json!("plain failure"));
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(b"  \n"), Value::Null);
    }

    #[test]
    fn only_200_and_201_are_success() {
        assert!(is_success(200));
        assert!(is_success(201));
        assert!(!is_success(204));
        assert!(!is_success(302));
    }
}
