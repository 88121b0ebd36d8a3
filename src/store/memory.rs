use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ListPage, StateStore};

/// An in-memory `StateStore`, used by engine-level tests so the
/// reconciliation scenarios in spec.md §8 can be exercised without a real
/// SQLite file, the way the teacher's tests use
/// `rusqlite::Connection::open_in_memory()`.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str, cursor: Option<&str>) -> anyhow::Result<ListPage> {
        let data = self.data.lock().unwrap();
        let keys: Vec<String> = data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .filter(|k| cursor.is_none_or(|c| k.as_str() > c))
            .collect();
        Ok(ListPage {
            keys,
            next_cursor: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let store = MemoryStore::new();
        store.put("t:event:abc", "{}").unwrap();
        assert_eq!(store.get("t:event:abc").unwrap(), Some("{}".to_string()));
    }

    #[test]
    fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn list_scopes_by_prefix() {
        let store = MemoryStore::new();
        store.put("a:event:1", "x").unwrap();
        store.put("b:event:1", "x").unwrap();
        let page = store.list("a:", None).unwrap();
        assert_eq!(page.keys, vec!["a:event:1".to_string()]);
    }

    #[test]
    fn delete_removes_key() {
        let store = MemoryStore::new();
        store.put("k", "v").unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
