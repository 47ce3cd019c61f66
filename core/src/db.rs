use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::store::Store;

/// SQLite-backed [`Store`]. Every logical key maps to one row of `kv_store`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv_store (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }
}

impl Store for Database {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("Failed to write '{key}'"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to remove '{key}'"))?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CATALOG_KEY, DAILY_LIMIT_KEY};

    #[test]
    fn test_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load(DAILY_LIMIT_KEY).unwrap().is_none());

        db.save(DAILY_LIMIT_KEY, "30").unwrap();
        assert_eq!(db.load(DAILY_LIMIT_KEY).unwrap().as_deref(), Some("30"));
        let stamped: String = db
            .conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                params![DAILY_LIMIT_KEY],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!stamped.is_empty());
    }

    #[test]
    fn test_save_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.save(DAILY_LIMIT_KEY, "30").unwrap();
        db.save(DAILY_LIMIT_KEY, "40").unwrap();
        assert_eq!(db.load(DAILY_LIMIT_KEY).unwrap().as_deref(), Some("40"));
        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_remove() {
        let db = Database::open_in_memory().unwrap();
        db.save(CATALOG_KEY, "[]").unwrap();
        assert!(db.remove(CATALOG_KEY).unwrap());
        assert!(!db.remove(CATALOG_KEY).unwrap());
        assert!(db.load(CATALOG_KEY).unwrap().is_none());
    }

    #[test]
    fn test_reopen_file_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sugarwise.db");
        {
            let db = Database::open(&path).unwrap();
            db.save(DAILY_LIMIT_KEY, "18.5").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.load(DAILY_LIMIT_KEY).unwrap().as_deref(), Some("18.5"));
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sugarwise.db");
        Database::open(&path).unwrap();
        Database::open(&path).unwrap();
    }
}
