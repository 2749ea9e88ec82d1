use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

use super::format::{user_key, AccountRecord, UserBlob, ACCOUNTS_KEY, LAST_IDENTITY_KEY};
use super::migration::migrate_blob;
use super::store::KeyValueStore;
use crate::history::DEFAULT_HISTORY_CAP;

/// Accounts by normalized email
pub type AccountDirectory = BTreeMap<String, AccountRecord>;

/// Typed JSON access over a [`KeyValueStore`].
///
/// Nothing here fails: unreadable or malformed values read as absent and
/// failed writes are dropped, both with a warning. In-memory state stays
/// correct; only durability is lost.
#[derive(Debug)]
pub struct SessionStore<S> {
    inner: S,
    history_cap: usize,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, history_cap: DEFAULT_HISTORY_CAP }
    }

    pub fn with_history_cap(mut self, history_cap: usize) -> Self {
        self.history_cap = history_cap;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.inner.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "malformed stored JSON, treating as absent");
                None
            }
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize value, write dropped");
                return false;
            }
        };

        match self.inner.set(key, &json) {
            Ok(()) => {
                tracing::debug!(key, bytes = json.len(), "persisted");
                true
            }
            Err(e) => {
                tracing::warn!(key, error = %e, recoverable = e.is_recoverable(), "store write failed, dropped");
                false
            }
        }
    }

    /// Load and migrate a user's blob
    pub fn load_user(&self, user_id: &str) -> Option<UserBlob> {
        self.read_json::<UserBlob>(&user_key(user_id))
            .map(|blob| migrate_blob(blob, self.history_cap))
    }

    pub fn save_user(&mut self, user_id: &str, blob: &UserBlob) -> bool {
        self.write_json(&user_key(user_id), blob)
    }

    pub fn accounts(&self) -> AccountDirectory {
        self.read_json(ACCOUNTS_KEY).unwrap_or_default()
    }

    pub fn save_accounts(&mut self, accounts: &AccountDirectory) -> bool {
        self.write_json(ACCOUNTS_KEY, accounts)
    }

    pub fn last_identity(&self) -> Option<String> {
        self.read_json(LAST_IDENTITY_KEY)
    }

    pub fn set_last_identity(&mut self, email: &str) -> bool {
        self.write_json(LAST_IDENTITY_KEY, &email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::error::StoreError;
    use crate::save::store::MemoryStore;

    /// Store that refuses every operation, like a browser with storage disabled
    struct UnavailableStore;

    impl KeyValueStore for UnavailableStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disabled".into()))
        }
    }

    #[test]
    fn test_user_blob_roundtrip() {
        let mut store = SessionStore::new(MemoryStore::new());
        let blob = UserBlob { exp: 10, level: 2, ..UserBlob::default() };

        assert!(store.save_user("u1", &blob));
        assert_eq!(store.load_user("u1"), Some(blob));
        assert_eq!(store.load_user("u2"), None);
    }

    #[test]
    fn test_malformed_json_reads_as_absent() {
        let mut memory = MemoryStore::new();
        memory.set(&user_key("u1"), "{not json").unwrap();
        memory.set(ACCOUNTS_KEY, "[1, 2, 3]").unwrap();

        let store = SessionStore::new(memory);
        assert!(store.load_user("u1").is_none());
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn test_unavailable_store_never_fails_loudly() {
        let mut store = SessionStore::new(UnavailableStore);

        assert!(!store.save_user("u1", &UserBlob::default()));
        assert!(store.load_user("u1").is_none());
        assert!(!store.set_last_identity("a@b.c"));
        assert!(store.last_identity().is_none());
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn test_last_identity_roundtrip() {
        let mut store = SessionStore::new(MemoryStore::new());
        assert!(store.last_identity().is_none());
        store.set_last_identity("me@example.com");
        assert_eq!(store.last_identity().as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_load_applies_history_cap() {
        let mut store = SessionStore::new(MemoryStore::new()).with_history_cap(2);
        let mut blob = UserBlob::default();
        for i in 0..4 {
            blob.history.record(
                crate::history::HistoryEntry {
                    id: i.to_string(),
                    title: "t".into(),
                    reward: i,
                    at: chrono::Utc::now(),
                },
                10,
            );
        }
        store.save_user("u1", &blob);
        assert_eq!(store.load_user("u1").unwrap().history.len(), 2);
    }
}
