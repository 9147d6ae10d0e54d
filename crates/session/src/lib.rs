//! `weknora-session`: persistent session state for the client layer.
//!
//! The session is a small string-keyed record (token, user profile, default
//! tenant, selected tenant) that must survive restarts. Stores implement
//! [`SessionStore`]; the request pipeline only ever reads it, and only login,
//! logout and session invalidation write to it.

pub mod file;
pub mod keys;
pub mod memory;
pub mod record;
pub mod store;

pub use file::{FileSessionStore, default_session_path};
pub use keys::SessionKey;
pub use memory::MemorySessionStore;
pub use record::{NewSession, SessionRecord, TenantOverride, TenantParseError};
pub use store::{SessionStore, StoreError};
