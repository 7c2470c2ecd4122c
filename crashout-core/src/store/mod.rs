//! Snapshot persistence.
//!
//! The journal keeps three independent snapshots, each a JSON document
//! rewritten in full whenever the in-memory value changes:
//!
//! | Key | Value |
//! |-----|-------|
//! | [`HISTORY_KEY`] | `Vec<Entry>`, most recent first |
//! | [`USER_KEY`] | `User` |
//! | [`FRIENDS_KEY`] | `Vec<Friend>` |

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

pub const HISTORY_KEY: &str = "crashout_history";
pub const USER_KEY: &str = "crashout_user";
pub const FRIENDS_KEY: &str = "crashout_friends";

/// Minimal key-value persistence.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a snapshot. A present but undecodable value is an error.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.load(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Storage(format!("corrupt snapshot `{key}`: {e}"))),
        None => Ok(None),
    }
}

/// Encode and write a snapshot.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.save(key, &raw)
}

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;

    #[test]
    fn test_json_round_trip() {
        let store = MemoryStore::new();
        let user = User {
            name: "Ada".to_string(),
            handle: "ada".to_string(),
        };
        save_json(&store, USER_KEY, &user).unwrap();
        let loaded: Option<User> = load_json(&store, USER_KEY).unwrap();
        assert_eq!(loaded, Some(user));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<User> = load_json(&store, USER_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_snapshot_is_error() {
        let store = MemoryStore::new();
        store.save(HISTORY_KEY, "{not json").unwrap();
        let result: Result<Option<Vec<crate::types::Entry>>> = load_json(&store, HISTORY_KEY);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        store.save(USER_KEY, "{}").unwrap();
        store.remove(USER_KEY).unwrap();
        assert!(store.load(USER_KEY).unwrap().is_none());
    }
}
