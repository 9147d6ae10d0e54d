//! Caller-facing error model.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type returned by every request operation.
pub type ApiResult<T> = Result<T, ErrorEnvelope>;

/// Message used whenever a request produced no response at all.
pub const NETWORK_ERROR_MESSAGE: &str = "network error, check your connection";

/// Message returned to callers when the session was invalidated by a 401.
pub const SESSION_EXPIRED_MESSAGE: &str = "please sign in again";

/// Default message for a rejected login when the backend supplied none.
pub const LOGIN_REJECTED_MESSAGE: &str = "incorrect username or password";

/// Classification of a failed request.
///
/// Not serialized: the wire shape of an envelope is `{status?, message, ...}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response was received (connection refused, DNS, TLS, ...).
    Connectivity,
    /// No response was received before the timeout ceiling.
    Timeout,
    /// A login attempt was answered with 401.
    LoginRejected,
    /// Any other 401; the local session has been cleared.
    SessionExpired,
    /// Any other non-success status.
    Backend,
    /// A success payload did not match the type the caller asked for.
    Decode,
    /// The request body could not be serialized; nothing was sent.
    Encode,
}

/// The single error shape every request operation rejects with.
///
/// `message` is never empty. `fields` carries the remaining top-level fields
/// of an object error body so callers can branch on domain-specific codes; it
/// never contains `status` or `message` keys.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct ErrorEnvelope {
    #[serde(skip)]
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    message: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ErrorEnvelope {
    fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            match status {
                Some(status) => format!("request failed with status {status}"),
                None => NETWORK_ERROR_MESSAGE.to_string(),
            }
        } else {
            message
        };

        Self {
            kind,
            status,
            message,
            fields: Map::new(),
        }
    }

    /// The fixed envelope for a request that received no response.
    pub fn connectivity() -> Self {
        Self::new(ErrorKind::Connectivity, None, NETWORK_ERROR_MESSAGE)
    }

    /// Same wire shape as [`ErrorEnvelope::connectivity`], classified as a timeout.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, None, NETWORK_ERROR_MESSAGE)
    }

    pub fn login_rejected(message: Option<String>) -> Self {
        Self::new(
            ErrorKind::LoginRejected,
            Some(401),
            message.unwrap_or_else(|| LOGIN_REJECTED_MESSAGE.to_string()),
        )
    }

    pub fn session_expired() -> Self {
        Self::new(ErrorKind::SessionExpired, Some(401), SESSION_EXPIRED_MESSAGE)
    }

    /// Envelope for a non-success status. `status` and `message` keys are
    /// dropped from `fields` so the resolved values stay authoritative.
    pub fn backend(status: u16, message: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("status");
        fields.remove("message");

        let mut envelope = Self::new(ErrorKind::Backend, Some(status), message);
        envelope.fields = fields;
        envelope
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, None, message)
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encode, None, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// True when no response was received (connectivity loss or timeout).
    pub fn is_network(&self) -> bool {
        matches!(self.kind, ErrorKind::Connectivity | ErrorKind::Timeout)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connectivity_serializes_to_message_only() {
        let value = serde_json::to_value(ErrorEnvelope::connectivity()).unwrap();
        assert_eq!(value, json!({ "message": NETWORK_ERROR_MESSAGE }));
    }

    #[test]
    fn backend_spreads_extra_fields_without_overriding_message() {
        let body = json!({ "code": 1001, "message": "raw", "status": "fail", "details": ["x"] });
        let fields = body.as_object().cloned().unwrap();

        let envelope = ErrorEnvelope::backend(422, "resolved", fields);

        assert_eq!(envelope.kind(), ErrorKind::Backend);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "status": 422, "message": "resolved", "code": 1001, "details": ["x"] })
        );
    }

    #[test]
    fn empty_message_falls_back_to_status_text() {
        let envelope = ErrorEnvelope::backend(500, "  ", Map::new());
        assert_eq!(envelope.message(), "request failed with status 500");
    }

    #[test]
    fn login_rejected_defaults_message() {
        let envelope = ErrorEnvelope::login_rejected(None);
        assert_eq!(envelope.status(), Some(401));
        assert_eq!(envelope.message(), LOGIN_REJECTED_MESSAGE);
        assert_eq!(envelope.to_string(), LOGIN_REJECTED_MESSAGE);
    }
}
