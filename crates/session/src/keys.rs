//! Persisted session keys.

/// A key in the session store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Bearer token.
    Token,
    RefreshToken,
    /// JSON-encoded user profile.
    User,
    /// JSON-encoded default tenant record (object with an `id`).
    Tenant,
    SelectedTenantId,
    SelectedTenantName,
}

impl SessionKey {
    /// Every key, in the order they are cleared on session loss.
    pub const ALL: [SessionKey; 6] = [
        SessionKey::Token,
        SessionKey::RefreshToken,
        SessionKey::User,
        SessionKey::Tenant,
        SessionKey::SelectedTenantId,
        SessionKey::SelectedTenantName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Token => "weknora_token",
            SessionKey::RefreshToken => "weknora_refresh_token",
            SessionKey::User => "weknora_user",
            SessionKey::Tenant => "weknora_tenant",
            SessionKey::SelectedTenantId => "weknora_selected_tenant_id",
            SessionKey::SelectedTenantName => "weknora_selected_tenant_name",
        }
    }
}

impl core::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
