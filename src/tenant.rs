//! Tenant registration: a key-value mapping from tenant-id to source URL
//! and default timezone. Out of scope for the core *algorithm* (§1), but
//! the running service still needs somewhere to read it from — stored
//! under the `tenant:<tenant>` key in the same state store, per §6.

use serde::{Deserialize, Serialize};

use crate::store::{self, StateStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub source_url: String,
    pub created_at: i64,
    pub timezone: Option<String>,
}

fn tenant_key(tenant_id: &str) -> String {
    format!("tenant:{tenant_id}")
}

pub fn get(store: &dyn StateStore, tenant_id: &str) -> anyhow::Result<Option<TenantConfig>> {
    match store.get(&tenant_key(tenant_id))? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn put(store: &dyn StateStore, tenant_id: &str, cfg: &TenantConfig) -> anyhow::Result<()> {
    store.put(&tenant_key(tenant_id), &serde_json::to_string(cfg)?)
}

/// List every registered tenant, paging through the `tenant:` prefix.
pub fn list(store: &dyn StateStore) -> anyhow::Result<Vec<(String, TenantConfig)>> {
    let mut out = Vec::new();
    let mut cursor = None;
    loop {
        let page = store.list("tenant:", cursor.as_deref())?;
        for key in &page.keys {
            let Some(id) = key.strip_prefix("tenant:") else {
                continue;
            };
            if let Some(json) = store.get(key)?
                && let Ok(cfg) = serde_json::from_str(&json)
            {
                out.push((id.to_string(), cfg));
            }
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(out)
}

/// Delete the tenant-config key and every key under the tenant's prefix
/// (`<tenant_id>:`), per the teardown operation in §6.
pub fn teardown(store: &dyn StateStore, tenant_id: &str) -> anyhow::Result<()> {
    store.delete(&tenant_key(tenant_id))?;
    store::delete_prefix(store, &format!("{tenant_id}:"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn put_then_get_roundtrips() {
        let store = MemoryStore::new();
        let cfg = TenantConfig {
            source_url: "https://outlook.example.com/feed.ics".to_string(),
            created_at: 1000,
            timezone: Some("America/Chicago".to_string()),
        };
        put(&store, "acme", &cfg).unwrap();
        let loaded = get(&store, "acme").unwrap().unwrap();
        assert_eq!(loaded.source_url, cfg.source_url);
        assert_eq!(loaded.timezone, cfg.timezone);
    }

    #[test]
    fn get_missing_tenant_is_none() {
        let store = MemoryStore::new();
        assert!(get(&store, "missing").unwrap().is_none());
    }

    #[test]
    fn list_returns_all_registered_tenants() {
        let store = MemoryStore::new();
        put(
            &store,
            "acme",
            &TenantConfig {
                source_url: "https://acme.example.com".to_string(),
                created_at: 1000,
                timezone: None,
            },
        )
        .unwrap();
        put(
            &store,
            "globex",
            &TenantConfig {
                source_url: "https://globex.example.com".to_string(),
                created_at: 2000,
                timezone: Some("America/Chicago".to_string()),
            },
        )
        .unwrap();

        let mut tenants = list(&store).unwrap();
        tenants.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].0, "acme");
        assert_eq!(tenants[1].0, "globex");
    }

    #[test]
    fn teardown_removes_config_and_tenant_prefixed_keys() {
        let store = MemoryStore::new();
        let cfg = TenantConfig {
            source_url: "https://x.example.com".to_string(),
            created_at: 1000,
            timezone: None,
        };
        put(&store, "acme", &cfg).unwrap();
        store.put("acme:event:1", "{}").unwrap();
        store.put("acme:snapshot:keys", "{}").unwrap();
        store.put("other:event:1", "{}").unwrap();

        teardown(&store, "acme").unwrap();

        assert!(get(&store, "acme").unwrap().is_none());
        assert!(store.get("acme:event:1").unwrap().is_none());
        assert!(store.get("acme:snapshot:keys").unwrap().is_none());
        assert!(store.get("other:event:1").unwrap().is_some());
    }
}
