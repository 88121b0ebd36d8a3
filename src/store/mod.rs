//! The state store: a key-value interface with string keys and values,
//! scoped by tenant prefix. This module defines the port; `sqlite` is the
//! concrete adapter used in production, and `memory` backs unit/engine
//! tests.

pub mod memory;
pub mod sqlite;

/// A single page of a prefix listing: the matched keys and an opaque
/// cursor for the next page, or `None` when the listing is complete.
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_cursor: Option<String>,
}

/// The key-value store interface described in the design doc §6.
///
/// Reads and writes are synchronous from the reconciler's point of view;
/// adapters that talk to network-backed stores are expected to block the
/// calling task (as the teacher's `Mutex<rusqlite::Connection>` does) or
/// be wrapped with `spawn_blocking` by the caller.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
    fn list(&self, prefix: &str, cursor: Option<&str>) -> anyhow::Result<ListPage>;
}

/// Read helper matching §4.4/§7: a transient read failure is treated
/// identically to "no prior value", never propagated.
pub fn get_or_absent(store: &dyn StateStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("state store read failed for {key}, treating as absent: {e}");
            None
        }
    }
}

/// Write helper matching §4.4/§7: write failures are logged and dropped,
/// never propagated to the caller.
pub fn put_best_effort(store: &dyn StateStore, key: &str, value: &str) {
    if let Err(e) = store.put(key, value) {
        tracing::warn!("state store write failed for {key}, dropping: {e}");
    }
}

/// Delete helper with the same best-effort semantics as `put_best_effort`.
pub fn delete_best_effort(store: &dyn StateStore, key: &str) {
    if let Err(e) = store.delete(key) {
        tracing::warn!("state store delete failed for {key}, dropping: {e}");
    }
}

/// Delete every key under `prefix`, page by page, for tenant teardown.
pub fn delete_prefix(store: &dyn StateStore, prefix: &str) -> anyhow::Result<()> {
    let mut cursor = None;
    loop {
        let page = store.list(prefix, cursor.as_deref())?;
        for key in &page.keys {
            store.delete(key)?;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(())
}
