//! JSON-file backed session store (survives restarts).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use parking_lot::Mutex;

use crate::keys::SessionKey;
use crate::store::{SessionStore, StoreError};

/// Environment variable overriding the session file location.
pub const SESSION_FILE_ENV: &str = "WEKNORA_SESSION_FILE";

/// Session store persisted as a flat JSON object on disk.
///
/// The whole file is rewritten on every mutation while the lock is held, so
/// the file always reflects the last completed write.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty session. A file that is not a JSON object of
    /// strings is reported as an error rather than silently discarded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened session store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Open the store at [`default_session_path`].
    pub fn open_default() -> anyhow::Result<Self> {
        let path = default_session_path()?;
        Self::open(&path).with_context(|| format!("failed to open session store at {:?}", path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.entries.lock().get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        entries.insert(key.as_str().to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: SessionKey) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        if entries.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

/// Resolve the session file path: `WEKNORA_SESSION_FILE`, else
/// `<data dir>/weknora/session.json`.
pub fn default_session_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut path = base;
    path.push("weknora");
    path.push("session.json");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(SessionKey::Token, "tok").unwrap();
        store.set(SessionKey::SelectedTenantId, "T2").unwrap();
        drop(store);

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.get(SessionKey::Token).as_deref(), Some("tok"));
        assert_eq!(reopened.record().selected_tenant_id.as_deref(), Some("T2"));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["weknora_token"], "tok");
    }

    #[test]
    fn clear_persists_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileSessionStore::open(&path).unwrap();
        store.set(SessionKey::Token, "tok").unwrap();
        store.set(SessionKey::User, r#"{"id":"u"}"#).unwrap();
        store.clear().unwrap();

        let reopened = FileSessionStore::open(&path).unwrap();
        assert_eq!(reopened.record(), crate::SessionRecord::default());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(matches!(
            FileSessionStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
