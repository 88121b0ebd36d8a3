use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use super::{ListPage, StateStore};

const LIST_PAGE_SIZE: i64 = 500;

/// SQLite-backed `StateStore`, grounded on the teacher's single
/// `Mutex<Connection>` pattern (`src/db.rs`, `AppState::db`). Keys and
/// values are opaque strings; callers are responsible for the
/// tenant-prefixed key scheme in the design doc §6.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::open(Connection::open_in_memory()?)
    }
}

impl StateStore for SqliteStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn list(&self, prefix: &str, cursor: Option<&str>) -> anyhow::Result<ListPage> {
        let conn = self.conn.lock().unwrap();
        let upper = format!("{prefix}\u{10FFFF}");
        let after = cursor.unwrap_or("");
        let mut stmt = conn.prepare(
            "SELECT key FROM kv_store
             WHERE key >= ?1 AND key < ?2 AND key > ?3
             ORDER BY key
             LIMIT ?4",
        )?;
        let keys: Vec<String> = stmt
            .query_map(params![prefix, upper, after, LIST_PAGE_SIZE], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if keys.len() as i64 == LIST_PAGE_SIZE {
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, next_cursor })
    }
}
