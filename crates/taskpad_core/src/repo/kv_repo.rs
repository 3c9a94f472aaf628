//! Key-value repository contracts and implementations.
//!
//! # Responsibility
//! - Provide an opaque string key-value store for snapshot persistence.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `put` overwrites the whole value for a key.
//! - `get` on a missing key returns `Ok(None)`, never an error.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for key-value reads and writes.
#[derive(Debug)]
pub enum RepoError {
    InvalidKey(String),
    Db(DbError),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid key-value key: `{key}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "key-value store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for opaque string values keyed by name.
pub trait KvRepository: Send + Sync {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    fn remove(&self, key: &str) -> RepoResult<()>;
}

/// SQLite-backed key-value repository over the `kv_entries` table.
pub struct SqliteKvRepository {
    conn: Mutex<Connection>,
}

impl SqliteKvRepository {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl KvRepository for SqliteKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let key = validate_key(key)?;
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        let key = validate_key(key)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        let key = validate_key(key)?;
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local key-value repository, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKvRepository {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> RepoResult<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl KvRepository for MemoryKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let key = validate_key(key)?;
        Ok(self.entries()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        let key = validate_key(key)?;
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        let key = validate_key(key)?;
        self.entries()?.remove(key);
        Ok(())
    }
}

fn validate_key(key: &str) -> RepoResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.len() != key.len() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{KvRepository, MemoryKvRepository, RepoError};

    #[test]
    fn memory_repo_overwrites_and_removes() {
        let repo = MemoryKvRepository::new();
        assert_eq!(repo.get("tasks").unwrap(), None);

        repo.put("tasks", "[1]").unwrap();
        repo.put("tasks", "[2]").unwrap();
        assert_eq!(repo.get("tasks").unwrap().as_deref(), Some("[2]"));

        repo.remove("tasks").unwrap();
        repo.remove("tasks").unwrap();
        assert_eq!(repo.get("tasks").unwrap(), None);
    }

    #[test]
    fn keys_with_surrounding_whitespace_are_rejected() {
        let repo = MemoryKvRepository::new();
        let err = repo.put(" tasks", "[]").unwrap_err();
        assert!(matches!(err, RepoError::InvalidKey(_)));
        assert!(matches!(repo.get("").unwrap_err(), RepoError::InvalidKey(_)));
    }
}
