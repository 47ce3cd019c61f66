use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const SESSION_KEY: &str = "session/current-user";
pub const DAILY_LIMIT_KEY: &str = "sugar/daily-limit";
pub const ENTRIES_KEY: &str = "sugar/entries";
pub const CATALOG_KEY: &str = "sugar/food-catalog";
pub const MEAL_PLANS_KEY: &str = "sugar/meal-plans";

/// Durable key/value persistence. Each key is written independently; there is no
/// transaction spanning several keys.
pub trait Store: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool>;
}

pub(crate) fn load_json<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>> {
    match store.load(key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("Corrupt value stored under '{key}'"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub(crate) fn save_json<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize value for '{key}'"))?;
    store.save(key, &raw)
}

/// Volatile store, mostly for tests. Reads and writes can be
/// made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing failure injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        Ok(self.raw(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        Ok(self
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key)
            .is_some())
    }
}

impl<S: Store + Sync> Store for std::sync::Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_save_load_remove() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());

        store.save("k", "v1").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v1"));

        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v2"));

        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert!(store.load("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.save("k", "v").unwrap();

        store.set_fail_writes(true);
        assert!(store.save("k", "other").is_err());
        assert!(store.remove("k").is_err());
        assert_eq!(store.raw("k").as_deref(), Some("v"));

        store.set_fail_reads(true);
        assert!(store.load("k").is_err());
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        save_json(&store, "nums", &vec![1, 2, 3]).unwrap();
        let nums: Vec<i32> = load_json(&store, "nums").unwrap().unwrap();
        assert_eq!(nums, vec![1, 2, 3]);

        let missing: Option<Vec<i32>> = load_json(&store, "missing").unwrap();
        assert!(missing.is_none());

        store.save("bad", "{not json").unwrap();
        assert!(load_json::<Vec<i32>>(&store, "bad").is_err());
    }
}
