//! User record persistence using SQLite.
//!
//! Each record's client fields are stored as a JSON text column; the id and
//! timestamps live in their own columns.

use super::{strip_reserved, UserRecord};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Raw column values of one `users` row
type RawRow = (String, String, String, String);

/// Persists user records in SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE users (
///     id         TEXT PRIMARY KEY,   -- UUID
///     data       TEXT NOT NULL,      -- JSON object of client fields
///     created_at TEXT NOT NULL,      -- RFC 3339
///     updated_at TEXT NOT NULL       -- RFC 3339
/// );
/// ```
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Opens (or creates) the SQLite database and ensures the table exists.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open user DB at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory user DB")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id         TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create users table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("User store lock poisoned"))
    }

    /// Inserts a new record with a fresh id.
    pub fn create(&self, fields: Map<String, Value>) -> Result<UserRecord> {
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            fields: strip_reserved(fields),
        };
        let data = serde_json::to_string(&record.fields).context("Failed to encode user")?;

        self.conn()?
            .execute(
                "INSERT INTO users (id, data, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id.to_string(),
                    data,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .context("Failed to insert user")?;

        Ok(record)
    }

    /// Returns all records in creation order.
    pub fn list(&self) -> Result<Vec<UserRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, data, created_at, updated_at FROM users ORDER BY rowid ASC")
            .context("Failed to prepare user listing")?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<RawRow>>>()
            .context("Failed to list users")?;

        rows.into_iter().map(decode_row).collect()
    }

    /// Returns a single record, or `None` if the id is unknown.
    pub fn get(&self, id: &Uuid) -> Result<Option<UserRecord>> {
        let conn = self.conn()?;
        select_row(&conn, id)?.map(decode_row).transpose()
    }

    /// Merges `fields` into the stored record's top-level fields.
    ///
    /// Returns the updated record, or `None` if the id is unknown.
    pub fn update(&self, id: &Uuid, fields: Map<String, Value>) -> Result<Option<UserRecord>> {
        let conn = self.conn()?;

        let Some(mut record) = select_row(&conn, id)?.map(decode_row).transpose()? else {
            return Ok(None);
        };

        record.fields.extend(strip_reserved(fields));
        record.updated_at = Utc::now();
        let data = serde_json::to_string(&record.fields).context("Failed to encode user")?;

        conn.execute(
            "UPDATE users SET data = ?1, updated_at = ?2 WHERE id = ?3",
            params![data, record.updated_at.to_rfc3339(), id.to_string()],
        )
        .context("Failed to update user")?;

        Ok(Some(record))
    }

    /// Deletes a record. Returns false if the id was unknown.
    pub fn delete(&self, id: &Uuid) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])
            .context("Failed to delete user")?;
        Ok(removed > 0)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("Failed to count users")?;
        Ok(count as usize)
    }
}

fn select_row(conn: &Connection, id: &Uuid) -> Result<Option<RawRow>> {
    conn.query_row(
        "SELECT id, data, created_at, updated_at FROM users WHERE id = ?1",
        params![id.to_string()],
        read_row,
    )
    .optional()
    .context("Failed to read user")
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_row((id, data, created_at, updated_at): RawRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: Uuid::parse_str(&id).with_context(|| format!("Corrupt user id {}", id))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        fields: serde_json::from_str(&data)
            .with_context(|| format!("Corrupt data for user {}", id))?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Corrupt timestamp {}", raw))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_create_and_get() {
        let store = UserStore::open_in_memory().unwrap();

        let created = store
            .create(fields(json!({"name": "Alice", "email": "alice@example.com"})))
            .unwrap();
        assert_eq!(created.fields.get("name"), Some(&json!("Alice")));
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_create_ignores_reserved_keys() {
        let store = UserStore::open_in_memory().unwrap();
        let spoofed = Uuid::new_v4();

        let created = store
            .create(fields(json!({"_id": spoofed.to_string(), "name": "Bob"})))
            .unwrap();

        assert_ne!(created.id, spoofed);
        assert!(!created.fields.contains_key("_id"));
        assert!(store.get(&spoofed).unwrap().is_none());
    }

    #[test]
    fn test_get_missing() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_in_creation_order() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(store.list().unwrap().is_empty());

        for name in ["first", "second", "third"] {
            store.create(fields(json!({"name": name}))).unwrap();
        }

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.fields["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("first"), json!("second"), json!("third")]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = UserStore::open_in_memory().unwrap();
        let created = store
            .create(fields(json!({"name": "Alice", "age": 30})))
            .unwrap();

        let updated = store
            .update(&created.id, fields(json!({"age": 31, "city": "Lisbon"})))
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.fields["name"], json!("Alice"));
        assert_eq!(updated.fields["age"], json!(31));
        assert_eq!(updated.fields["city"], json!("Lisbon"));

        // Persisted, not just returned
        assert_eq!(store.get(&created.id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_missing() {
        let store = UserStore::open_in_memory().unwrap();
        let result = store
            .update(&Uuid::new_v4(), fields(json!({"name": "nobody"})))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete() {
        let store = UserStore::open_in_memory().unwrap();
        let created = store.create(fields(json!({"name": "Alice"}))).unwrap();

        assert!(store.delete(&created.id).unwrap());
        assert!(store.get(&created.id).unwrap().is_none());

        // Second delete finds nothing
        assert!(!store.delete(&created.id).unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.db");

        let id = {
            let store = UserStore::open(&path).unwrap();
            store.create(fields(json!({"name": "Durable"}))).unwrap().id
        };

        let store = UserStore::open(&path).unwrap();
        let record = store.get(&id).unwrap().unwrap();
        assert_eq!(record.fields["name"], json!("Durable"));
    }
}
