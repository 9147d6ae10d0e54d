//! Session store abstraction.

use thiserror::Error;
use weknora_core::TenantId;

use crate::keys::SessionKey;
use crate::record::{NewSession, SessionRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable string-keyed session storage.
///
/// All operations are synchronous: the response path clears storage inline
/// before surfacing an error, so a caller never observes a half-cleared
/// session. Implementations must be safe to share across tasks.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: SessionKey) -> Result<(), StoreError>;

    /// Remove several keys. Keeps going after a failure and reports the
    /// first error, so one bad key cannot leave the others behind.
    fn remove_all(&self, keys: &[SessionKey]) -> Result<(), StoreError> {
        let mut first_err = None;
        for key in keys {
            if let Err(err) = self.remove(*key) {
                tracing::error!(key = %key, error = %err, "failed to remove session key");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Remove every session key (logout / session loss).
    fn clear(&self) -> Result<(), StoreError> {
        self.remove_all(&SessionKey::ALL)
    }

    /// Snapshot the current session.
    fn record(&self) -> SessionRecord {
        SessionRecord {
            token: self.get(SessionKey::Token),
            refresh_token: self.get(SessionKey::RefreshToken),
            user: self.get(SessionKey::User),
            default_tenant: self.get(SessionKey::Tenant),
            selected_tenant_id: self.get(SessionKey::SelectedTenantId),
            selected_tenant_name: self.get(SessionKey::SelectedTenantName),
        }
    }

    /// Persist a freshly authenticated session.
    ///
    /// Any tenant selection from a previous session is dropped.
    fn establish(&self, session: &NewSession) -> Result<(), StoreError> {
        self.set(SessionKey::Token, &session.token)?;

        match &session.refresh_token {
            Some(refresh) => self.set(SessionKey::RefreshToken, refresh)?,
            None => self.remove(SessionKey::RefreshToken)?,
        }
        match &session.user {
            Some(user) => self.set(SessionKey::User, &serde_json::to_string(user)?)?,
            None => self.remove(SessionKey::User)?,
        }
        match &session.tenant {
            Some(tenant) => self.set(SessionKey::Tenant, &serde_json::to_string(tenant)?)?,
            None => self.remove(SessionKey::Tenant)?,
        }

        self.clear_selected_tenant()
    }

    /// Operate within another tenant from now on.
    fn select_tenant(&self, tenant_id: &TenantId, name: Option<&str>) -> Result<(), StoreError> {
        self.set(SessionKey::SelectedTenantId, tenant_id.as_str())?;
        match name {
            Some(name) => self.set(SessionKey::SelectedTenantName, name),
            None => self.remove(SessionKey::SelectedTenantName),
        }
    }

    /// Fall back to the user's default tenant.
    fn clear_selected_tenant(&self) -> Result<(), StoreError> {
        self.remove_all(&[SessionKey::SelectedTenantId, SessionKey::SelectedTenantName])
    }
}
