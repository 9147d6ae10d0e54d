//! Identifiers carried on outgoing requests.


use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Length of a generated correlation identifier.
pub const REQUEST_ID_LEN: usize = 12;

/// Identifier of a tenant (multi-tenant boundary).
///
/// Backends hand these out as strings or numbers; both normalize to the same
/// string form so `7` and `"7"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

/// Per-request correlation identifier (`X-Request-ID`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(TenantId);
impl_string_newtype!(RequestId);

impl TenantId {
    /// Build a tenant id from a non-empty string; `None` for empty input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() { None } else { Some(Self(value)) }
    }

    /// Normalize a JSON id (string or number) to its string form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.clone()),
            Value::Number(n) => Self::new(n.to_string()),
            _ => None,
        }
    }
}

impl RequestId {
    /// Generate a fresh random alphanumeric identifier.
    pub fn generate() -> Self {
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REQUEST_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_ids_are_short_alphanumeric_and_fresh() {
        let a = RequestId::generate();
        let b = RequestId::generate();

        assert_eq!(a.as_str().len(), REQUEST_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn numeric_and_string_tenant_ids_normalize_equally() {
        assert_eq!(TenantId::from_json(&json!(7)), TenantId::new("7"));
        assert_eq!(TenantId::from_json(&json!("7")), TenantId::new("7"));
        assert_eq!(TenantId::from_json(&json!(null)), None);
        assert_eq!(TenantId::new(""), None);
    }
}
