//! Auth/tenant context resolution for outgoing requests.

use std::sync::Arc;

use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;
use weknora_core::{RequestId, TenantId};
use weknora_session::{SessionStore, TenantOverride};

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Headers derived from the session for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedHeaders {
    /// Full header value, `Bearer <token>`.
    pub authorization: Option<String>,
    /// Present only when operating outside the default tenant.
    pub tenant_id: Option<TenantId>,
    pub request_id: RequestId,
}

impl DerivedHeaders {
    /// Attach the headers to `builder`, in order: auth, tenant, request id.
    pub fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(tenant_id) = &self.tenant_id {
            builder = builder.header(TENANT_HEADER, tenant_id.as_str());
        }
        builder.header(REQUEST_ID_HEADER, self.request_id.as_str())
    }
}

/// Reads the session store and derives request headers.
///
/// Nothing is cached: every call reads the store again, so a login or tenant
/// switch is visible to the very next request.
#[derive(Clone)]
pub struct ContextResolver {
    store: Arc<dyn SessionStore>,
}

impl ContextResolver {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self) -> DerivedHeaders {
        let record = self.store.record();

        let tenant_id = match record.tenant_override() {
            Ok(TenantOverride::Switched(tenant_id)) => Some(tenant_id),
            Ok(TenantOverride::Default) => None,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring tenant selection, default tenant record is unreadable");
                None
            }
        };

        DerivedHeaders {
            authorization: record.bearer_token().map(|token| format!("Bearer {token}")),
            tenant_id,
            request_id: RequestId::generate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use weknora_session::{MemorySessionStore, SessionKey};

    use super::*;

    fn resolver(entries: &[(SessionKey, &str)]) -> ContextResolver {
        let store = MemorySessionStore::with_entries(entries.iter().map(|(k, v)| (*k, *v)));
        ContextResolver::new(Arc::new(store))
    }

    #[test]
    fn token_becomes_bearer_header() {
        let headers = resolver(&[(SessionKey::Token, "abc")]).resolve();
        assert_eq!(headers.authorization.as_deref(), Some("Bearer abc"));
        assert_eq!(headers.tenant_id, None);
    }

    #[test]
    fn anonymous_session_has_only_request_id() {
        let headers = resolver(&[]).resolve();
        assert_eq!(headers.authorization, None);
        assert_eq!(headers.tenant_id, None);
        assert_eq!(headers.request_id.as_str().len(), 12);
    }

    #[test]
    fn tenant_header_only_for_a_different_tenant() {
        let default = r#"{"id":"T1","name":"Home"}"#;

        let switched = resolver(&[
            (SessionKey::Tenant, default),
            (SessionKey::SelectedTenantId, "T2"),
        ])
        .resolve();
        assert_eq!(switched.tenant_id, TenantId::new("T2"));

        let same = resolver(&[
            (SessionKey::Tenant, default),
            (SessionKey::SelectedTenantId, "T1"),
        ])
        .resolve();
        assert_eq!(same.tenant_id, None);

        let unselected = resolver(&[(SessionKey::Tenant, default)]).resolve();
        assert_eq!(unselected.tenant_id, None);
    }

    #[test]
    fn malformed_default_tenant_omits_header() {
        let headers = resolver(&[
            (SessionKey::Token, "abc"),
            (SessionKey::Tenant, "{oops"),
            (SessionKey::SelectedTenantId, "T2"),
        ])
        .resolve();

        assert_eq!(headers.tenant_id, None);
        assert_eq!(headers.authorization.as_deref(), Some("Bearer abc"));
    }

    #[test]
    fn every_resolution_gets_a_fresh_request_id() {
        let resolver = resolver(&[]);
        assert_ne!(resolver.resolve().request_id, resolver.resolve().request_id);
    }
}
