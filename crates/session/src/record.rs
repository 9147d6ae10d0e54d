//! Session snapshot and tenant-override rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use weknora_core::TenantId;

/// Point-in-time view of the persisted session.
///
/// Values are kept as stored (raw strings); interpretation happens on access
/// so a corrupt entry only affects the accessor that reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<String>,
    pub default_tenant: Option<String>,
    pub selected_tenant_id: Option<String>,
    pub selected_tenant_name: Option<String>,
}

/// The persisted default-tenant record could not be read.
#[derive(Debug, Error)]
#[error("malformed default tenant record: {0}")]
pub struct TenantParseError(#[from] serde_json::Error);

/// Which tenant a request should operate in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantOverride {
    /// Let the backend use the user's default tenant.
    Default,
    /// Operate in another tenant.
    Switched(TenantId),
}

/// Data persisted after a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: Option<Value>,
    pub tenant: Option<Value>,
}

impl SessionRecord {
    /// Bearer token, if a non-empty one is stored.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Id of the default tenant, normalized to string form.
    ///
    /// Valid JSON without an `id` (or that is not an object) yields `Ok(None)`.
    pub fn default_tenant_id(&self) -> Result<Option<TenantId>, TenantParseError> {
        let Some(raw) = self.default_tenant.as_deref().filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };

        let record: Value = serde_json::from_str(raw)?;
        Ok(record.get("id").and_then(TenantId::from_json))
    }

    pub fn selected_tenant(&self) -> Option<TenantId> {
        self.selected_tenant_id.clone().and_then(TenantId::new)
    }

    /// Resolve the tenant override.
    ///
    /// A selected tenant only counts as an override when it differs from the
    /// default tenant. The default record is only parsed when a selection
    /// exists, so a corrupt record is harmless without one.
    pub fn tenant_override(&self) -> Result<TenantOverride, TenantParseError> {
        let Some(selected) = self.selected_tenant() else {
            return Ok(TenantOverride::Default);
        };

        match self.default_tenant_id()? {
            Some(default_id) if default_id == selected => Ok(TenantOverride::Default),
            _ => Ok(TenantOverride::Switched(selected)),
        }
    }

    /// Cached user profile, if present and valid JSON.
    pub fn user_profile(&self) -> Option<Value> {
        self.user
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}
